//! Shared utility functions for GWL crates.

/// Date and time utility functions
pub mod dates {
    use chrono::{NaiveDate, NaiveDateTime};

    /// Timestamp format used by hand readings and CLI arguments: "YYYY-MM-DD HH:MM:SS"
    pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Date format used by CLI arguments and output file naming: "YYYY-MM-DD"
    pub const DATE_FORMAT: &str = "%Y-%m-%d";

    /// Format a NaiveDateTime as "YYYY-MM-DD HH:MM:SS"
    pub fn format_datetime(ts: &NaiveDateTime) -> String {
        ts.format(DATETIME_FORMAT).to_string()
    }

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(DATE_FORMAT).to_string()
    }

    /// Parse a timestamp string in "YYYY-MM-DD HH:MM:SS" format
    pub fn parse_datetime(s: &str) -> anyhow::Result<NaiveDateTime> {
        Ok(NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)?)
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s, DATE_FORMAT)?)
    }

    /// Parse either a full timestamp or a bare date.
    /// Bare dates resolve to midnight at the start of that day.
    pub fn parse_date_or_datetime(s: &str) -> anyhow::Result<NaiveDateTime> {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, DATETIME_FORMAT) {
            return Ok(ts);
        }
        let date = NaiveDate::parse_from_str(s, DATE_FORMAT)?;
        Ok(date.and_hms_opt(0, 0, 0).unwrap())
    }

}
