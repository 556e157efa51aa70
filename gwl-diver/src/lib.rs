pub mod error;
pub mod geology;
pub mod readers;
pub mod time_grid;
pub mod timeseries;
pub mod well;

#[cfg(feature = "api")]
pub mod baro_api;
