/// Error types for the diver library
use thiserror::Error;

/// Main error type for diver data operations
#[derive(Error, Debug)]
pub enum DiverError {
    /// Unknown compensation method
    #[error("method {given:?} is not valid, use: \"handreading\", or \"cable\"")]
    InvalidMethod { given: String },

    /// Cable compensation requested for a well without cable geometry
    #[error("well {well:?} has no cable length, cable compensation needs one")]
    MissingCableLength { well: String },

    /// Handreading compensation requested without a hand reading
    #[error("handreading compensation requested without a hand reading")]
    MissingHandReading,

    /// Barometric and diver series indices differ
    #[error("barometric and diver series are not on the same timestamp index")]
    IndexMismatch,

    /// Nearest-timestamp lookup on an empty series
    #[error("cannot look up a timestamp in an empty series")]
    EmptySeries,

    /// Named column missing from a timeseries
    #[error("column not found: {name}")]
    ColumnNotFound { name: String },

    /// Column values do not line up with the timestamp index
    #[error("column {name:?} has {got} values, index has {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    /// Top of well above surface level at construction
    #[error("invalid geometry for well {well:?}: top of well lies above surface level")]
    WellGeometry { well: String },

    /// Geology layer inputs are not the same length
    #[error("geology layers misaligned: {tops} tops, {bottoms} bottoms, {labels} lithology labels")]
    GeologyShape {
        tops: usize,
        bottoms: usize,
        labels: usize,
    },

    /// Date parsing failed
    #[error("failed to parse date: {0}")]
    DateParse(#[from] chrono::ParseError),

    /// Failed to parse CSV data
    #[error("failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// Failed to parse a numeric field
    #[error("failed to parse number: {0:?}")]
    NumberParse(String),

    /// A required CSV field is absent
    #[error("missing CSV field: {name}")]
    MissingField { name: String },

    /// File read failed
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[cfg(feature = "api")]
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Failed to parse an HTTP response body
    #[cfg(feature = "api")]
    #[error("failed to parse HTTP response: {0}")]
    ResponseParse(String),
}

/// Type alias for Results using DiverError
pub type Result<T> = std::result::Result<T, DiverError>;
