use chrono::{NaiveDateTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{DiverError, Result};
use crate::time_grid::TimeGrid;

/// Timestamp format used for CSV output: "YYYY-MM-DD HH:MM:SS"
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Pressure recorded by a diver, in meters of water column.
pub const DIVER_PRESSURE: &str = "diver_pressure (mH2O)";

/// Atmospheric pressure, in meters of water column.
pub const AIR_PRESSURE: &str = "air_pressure (mH2O)";

/// Height of the water column above a diver, in meters.
pub const WATER_COLUMN: &str = "water_column (m)";

/// Water level relative to the vertical datum, in meters.
pub const WATER_LEVEL: &str = "water_level (m datum)";

/// Water temperature recorded by a diver, in degrees Celsius.
pub const TEMPERATURE: &str = "temperature (degC)";

/// Electrical conductivity recorded by an EC diver, in mS/cm.
pub const CONDUCTIVITY: &str = "electrical_conductivity (mS/cm)";

/// Daily precipitation, in millimeters.
pub const PRECIPITATION: &str = "precipitation (mm)";

/// The width of a resampling bucket: hourly or daily.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Frequency {
    Hourly,
    Daily,
}

impl Frequency {
    /// Truncate a timestamp to the start of its bucket.
    fn floor(&self, ts: NaiveDateTime) -> NaiveDateTime {
        match self {
            Frequency::Hourly => ts.date().and_hms_opt(ts.hour(), 0, 0).unwrap(),
            Frequency::Daily => ts.date().and_hms_opt(0, 0, 0).unwrap(),
        }
    }

    fn step(&self) -> TimeDelta {
        match self {
            Frequency::Hourly => TimeDelta::try_hours(1).unwrap(),
            Frequency::Daily => TimeDelta::try_days(1).unwrap(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Column {
    name: String,
    values: Vec<f64>,
}

/// A timestamp-indexed table of named float columns.
///
/// Missing values are `f64::NAN`. The index is expected to be
/// non-decreasing in time; the container neither sorts nor deduplicates
/// it, that is the caller's job. Derivation methods (`select_daterange`,
/// `reindex_time`, `resample`) return a new `Timeseries` and never touch
/// the receiver; the only in-place mutation is writing a column.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeseries {
    index: Vec<NaiveDateTime>,
    columns: Vec<Column>,
}

impl Timeseries {
    /// Create an empty table over the given timestamp index.
    pub fn new(index: Vec<NaiveDateTime>) -> Timeseries {
        Timeseries {
            index,
            columns: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// The values of a named column, or None if no such column exists.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Write a column. An unknown name adds a new column; a known name
    /// replaces its values.
    pub fn set_column(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if values.len() != self.index.len() {
            return Err(DiverError::LengthMismatch {
                name: name.to_string(),
                expected: self.index.len(),
                got: values.len(),
            });
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(col) => col.values = values,
            None => self.columns.push(Column {
                name: name.to_string(),
                values,
            }),
        }
        Ok(())
    }

    /// Position of the timestamp nearest to `ts`, or None for an empty
    /// series. Ties resolve to the earlier timestamp.
    pub fn nearest_index(&self, ts: NaiveDateTime) -> Option<usize> {
        if self.index.is_empty() {
            return None;
        }
        let pos = self.index.partition_point(|t| *t < ts);
        if pos == 0 {
            return Some(0);
        }
        if pos == self.index.len() {
            return Some(self.index.len() - 1);
        }
        if ts - self.index[pos - 1] <= self.index[pos] - ts {
            Some(pos - 1)
        } else {
            Some(pos)
        }
    }

    /// Selects rows within a timestamp range, both bounds inclusive.
    pub fn select_daterange(&self, start: NaiveDateTime, end: NaiveDateTime) -> Timeseries {
        let lo = self.index.partition_point(|t| *t < start);
        let hi = self.index.partition_point(|t| *t <= end);
        Timeseries {
            index: self.index[lo..hi].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: c.values[lo..hi].to_vec(),
                })
                .collect(),
        }
    }

    /// Reindexes the rows onto the regular grid `start, start+step, ...`
    /// up to and including `end` when it falls on the grid.
    ///
    /// Each grid point takes the row of the nearest source timestamp,
    /// provided that timestamp lies within one `step` of the grid point;
    /// grid points with no source row in reach are filled with NaN.
    /// Sensor clocks drift off the whole hour by seconds, this puts two
    /// loggers onto one shared index.
    pub fn reindex_time(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        step: TimeDelta,
    ) -> Timeseries {
        let grid: Vec<NaiveDateTime> = TimeGrid(start, end, step).collect();
        let picks: Vec<Option<usize>> = grid
            .iter()
            .map(|g| match self.nearest_index(*g) {
                Some(i) if (self.index[i] - *g).abs() <= step => Some(i),
                _ => None,
            })
            .collect();
        Timeseries {
            index: grid,
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: picks
                        .iter()
                        .map(|p| p.map_or(f64::NAN, |i| c.values[i]))
                        .collect(),
                })
                .collect(),
        }
    }

    /// Resamples into contiguous calendar buckets, each column replaced
    /// by the mean of its non-NaN member values.
    ///
    /// The output spans every bucket from the first to the last source
    /// timestamp; buckets with no source rows come out as NaN, not
    /// omitted.
    pub fn resample(&self, freq: Frequency) -> Timeseries {
        if self.index.is_empty() {
            return self.clone();
        }
        let step = freq.step();
        let bucket_secs = step.num_seconds();
        let first = freq.floor(self.index[0]);
        let last = freq.floor(*self.index.last().unwrap());
        let n_buckets = ((last - first).num_seconds() / bucket_secs) as usize + 1;
        let index: Vec<NaiveDateTime> = (0..n_buckets).map(|i| first + step * i as i32).collect();

        let columns = self
            .columns
            .iter()
            .map(|c| {
                let mut sums = vec![0.0f64; n_buckets];
                let mut counts = vec![0usize; n_buckets];
                for (ts, v) in self.index.iter().zip(&c.values) {
                    if v.is_nan() {
                        continue;
                    }
                    let bucket = ((freq.floor(*ts) - first).num_seconds() / bucket_secs) as usize;
                    sums[bucket] += v;
                    counts[bucket] += 1;
                }
                Column {
                    name: c.name.clone(),
                    values: sums
                        .iter()
                        .zip(&counts)
                        .map(|(s, n)| if *n == 0 { f64::NAN } else { s / *n as f64 })
                        .collect(),
                }
            })
            .collect();
        Timeseries { index, columns }
    }

    /// Nulls out values more than `threshold` sample standard deviations
    /// from their column mean, per column, over the whole table. A
    /// threshold of 3.0 is the usual choice.
    ///
    /// This is a dataset-wide filter, not a rolling window, so it is
    /// unsuitable for trending series. It is never applied automatically.
    pub fn remove_outliers(&mut self, threshold: f64) {
        for col in &mut self.columns {
            let finite: Vec<f64> = col.values.iter().copied().filter(|v| !v.is_nan()).collect();
            if finite.len() < 2 {
                continue;
            }
            let mean = finite.iter().sum::<f64>() / finite.len() as f64;
            let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                / (finite.len() - 1) as f64;
            let std_dev = variance.sqrt();
            let lower = mean - threshold * std_dev;
            let upper = mean + threshold * std_dev;
            for v in &mut col.values {
                if !v.is_nan() && (*v < lower || *v > upper) {
                    *v = f64::NAN;
                }
            }
        }
    }

    /// Render the table as CSV: a `date` column followed by the value
    /// columns, NaN written as an empty field.
    pub fn to_csv_string(&self) -> String {
        let mut lines = Vec::with_capacity(self.index.len() + 1);
        let mut header = vec!["date".to_string()];
        header.extend(self.columns.iter().map(|c| c.name.clone()));
        lines.push(header.join(","));
        for (i, ts) in self.index.iter().enumerate() {
            let mut fields = vec![ts.format(DATETIME_FORMAT).to_string()];
            for col in &self.columns {
                let v = col.values[i];
                fields.push(if v.is_nan() {
                    String::new()
                } else {
                    format!("{}", v)
                });
            }
            lines.push(fields.join(","));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn minute(m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, m, 0)
            .unwrap()
    }

    fn minute_series() -> Timeseries {
        let mut ts = Timeseries::new((0..5).map(minute).collect());
        ts.set_column(DIVER_PRESSURE, vec![1000.0, 1010.0, 1020.0, 1030.0, 1040.0])
            .unwrap();
        ts
    }

    #[test]
    fn test_column_read_write() {
        let mut ts = minute_series();
        assert_eq!(ts.column_names(), vec![DIVER_PRESSURE]);
        assert!(ts.column("nope").is_none());
        ts.set_column(TEMPERATURE, vec![10.0, 11.0, 12.0, 13.0, 14.0])
            .unwrap();
        assert_eq!(ts.column(TEMPERATURE).unwrap()[4], 14.0);
        // replacing keeps the column count
        ts.set_column(TEMPERATURE, vec![1.0; 5]).unwrap();
        assert_eq!(ts.column_names().len(), 2);
        assert!(ts.set_column(TEMPERATURE, vec![1.0; 3]).is_err());
    }

    #[test]
    fn test_nearest_index() {
        let ts = minute_series();
        let query = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 2, 29)
            .unwrap();
        assert_eq!(ts.nearest_index(query), Some(2));
        // before the first and after the last timestamp clamp
        assert_eq!(
            ts.nearest_index(minute(0) - TimeDelta::try_hours(5).unwrap()),
            Some(0)
        );
        assert_eq!(
            ts.nearest_index(minute(4) + TimeDelta::try_hours(5).unwrap()),
            Some(4)
        );
        assert_eq!(Timeseries::new(vec![]).nearest_index(minute(0)), None);
    }

    #[test]
    fn test_select_daterange_inclusive() {
        let ts = minute_series();
        let sel = ts.select_daterange(minute(1), minute(3));
        assert_eq!(sel.len(), 3);
        assert_eq!(sel.index()[0], minute(1));
        assert_eq!(sel.column(DIVER_PRESSURE).unwrap(), &[1010.0, 1020.0, 1030.0]);
    }

    #[test]
    fn test_select_daterange_idempotent() {
        let ts = minute_series();
        let once = ts.select_daterange(minute(1), minute(3));
        let twice = once.select_daterange(minute(1), minute(3));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_select_daterange_empty() {
        let ts = minute_series();
        let sel = ts.select_daterange(minute(10), minute(20));
        assert!(sel.is_empty());
        assert_eq!(sel.column_names(), vec![DIVER_PRESSURE]);
    }

    #[test]
    fn test_reindex_time_nearest_within_tolerance() {
        // source stamps drift 5 seconds off the whole minute
        let drifted: Vec<NaiveDateTime> = (0..5)
            .map(|m| minute(m) + TimeDelta::try_seconds(5).unwrap())
            .collect();
        let mut ts = Timeseries::new(drifted);
        ts.set_column(DIVER_PRESSURE, vec![1000.0, 1010.0, 1020.0, 1030.0, 1040.0])
            .unwrap();
        let step = TimeDelta::try_minutes(1).unwrap();
        let reindexed = ts.reindex_time(minute(0), minute(4), step);
        assert_eq!(reindexed.len(), 5);
        assert_eq!(reindexed.index()[2], minute(2));
        assert_eq!(reindexed.column(DIVER_PRESSURE).unwrap()[2], 1020.0);
    }

    #[test]
    fn test_reindex_time_out_of_reach_is_nan() {
        let ts = minute_series();
        let step = TimeDelta::try_minutes(1).unwrap();
        // grid extends an hour past the data
        let reindexed = ts.reindex_time(minute(0), minute(0) + TimeDelta::try_hours(1).unwrap(), step);
        let values = reindexed.column(DIVER_PRESSURE).unwrap();
        assert_eq!(values[0], 1000.0);
        assert!(values[30].is_nan());
    }

    #[test]
    fn test_reindex_time_idempotent() {
        let ts = minute_series();
        let step = TimeDelta::try_minutes(1).unwrap();
        let once = ts.reindex_time(minute(0), minute(4), step);
        let twice = once.reindex_time(minute(0), minute(4), step);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_resample_daily_spans_all_days() {
        let stamps = vec![
            NaiveDate::from_ymd_opt(2023, 1, 1)
                .unwrap()
                .and_hms_opt(6, 0, 0)
                .unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 1)
                .unwrap()
                .and_hms_opt(18, 0, 0)
                .unwrap(),
            // Jan 2 has no rows
            NaiveDate::from_ymd_opt(2023, 1, 3)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        ];
        let mut ts = Timeseries::new(stamps);
        ts.set_column(DIVER_PRESSURE, vec![10.0, 20.0, 40.0]).unwrap();
        let daily = ts.resample(Frequency::Daily);
        assert_eq!(daily.len(), 3);
        let values = daily.column(DIVER_PRESSURE).unwrap();
        assert_eq!(values[0], 15.0);
        assert!(values[1].is_nan());
        assert_eq!(values[2], 40.0);
    }

    #[test]
    fn test_resample_skips_nan_members() {
        let mut ts = minute_series();
        ts.set_column(DIVER_PRESSURE, vec![10.0, f64::NAN, 20.0, f64::NAN, 30.0])
            .unwrap();
        let hourly = ts.resample(Frequency::Hourly);
        assert_eq!(hourly.len(), 1);
        assert_eq!(hourly.column(DIVER_PRESSURE).unwrap()[0], 20.0);
    }

    #[test]
    fn test_resample_empty() {
        let ts = Timeseries::new(vec![]);
        assert!(ts.resample(Frequency::Daily).is_empty());
    }

    #[test]
    fn test_remove_outliers() {
        let mut ts = Timeseries::new((0..5).map(minute).collect());
        ts.set_column(DIVER_PRESSURE, vec![10.0, 10.1, 9.9, 10.0, 1000.0])
            .unwrap();
        ts.remove_outliers(1.5);
        let values = ts.column(DIVER_PRESSURE).unwrap();
        assert!(values[4].is_nan());
        assert_eq!(values[0], 10.0);
        assert_eq!(
            values.iter().filter(|v| v.is_nan()).count(),
            1,
            "only the strict outlier is nulled"
        );
    }

    #[test]
    fn test_to_csv_string() {
        let mut ts = Timeseries::new(vec![minute(0), minute(1)]);
        ts.set_column(WATER_LEVEL, vec![1.5, f64::NAN]).unwrap();
        let csv = ts.to_csv_string();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,water_level (m datum)");
        assert_eq!(lines[1], "2023-01-01 00:00:00,1.5");
        assert_eq!(lines[2], "2023-01-01 00:01:00,");
    }
}
