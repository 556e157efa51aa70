//! Remote air-pressure fetch against the Open-Meteo archive API.
//!
//! Used when no Baro-Diver was deployed at the site; the hourly surface
//! pressure of the nearest reanalysis cell stands in for the local
//! barometric record.

use chrono::{NaiveDate, NaiveDateTime};
use log::{info, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::{DiverError, Result};
use crate::timeseries::{Timeseries, AIR_PRESSURE};

/// Conversion from millibar (hPa) to meters of water column.
pub const MBAR_TO_MH2O: f64 = 0.0101972;

const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

/// Timestamp format in the hourly block: "YYYY-MM-DDTHH:MM"
const HOURLY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

const MAX_TRIES: u32 = 3;

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    surface_pressure: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    hourly: HourlyBlock,
}

/// Decode an archive API response body into an `"air_pressure (mH2O)"`
/// series. Null pressure values become NaN.
fn response_to_timeseries(body: &str) -> Result<Timeseries> {
    let response: ArchiveResponse =
        serde_json::from_str(body).map_err(|e| DiverError::ResponseParse(e.to_string()))?;
    let hourly = response.hourly;
    if hourly.time.len() != hourly.surface_pressure.len() {
        return Err(DiverError::ResponseParse(format!(
            "{} timestamps but {} pressure values",
            hourly.time.len(),
            hourly.surface_pressure.len()
        )));
    }
    let index = hourly
        .time
        .iter()
        .map(|t| NaiveDateTime::parse_from_str(t, HOURLY_TIME_FORMAT))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let values = hourly
        .surface_pressure
        .iter()
        .map(|p| p.map_or(f64::NAN, |hpa| hpa * MBAR_TO_MH2O))
        .collect();
    let mut series = Timeseries::new(index);
    series.set_column(AIR_PRESSURE, values)?;
    Ok(series)
}

async fn try_fetch(client: &Client, url: &str) -> Result<Timeseries> {
    let response = client.get(url).send().await?;
    if response.status() != StatusCode::OK {
        return Err(DiverError::ResponseParse(format!(
            "bad response status: {}",
            response.status()
        )));
    }
    let body = response.text().await?;
    response_to_timeseries(&body)
}

/// Fetch hourly surface pressure for a coordinate and date range,
/// with retry and exponential backoff.
pub async fn fetch_air_pressure(
    client: &Client,
    latitude: f64,
    longitude: f64,
    start_date: &NaiveDate,
    end_date: &NaiveDate,
) -> Result<Timeseries> {
    let url = format!(
        "{}?latitude={}&longitude={}&start_date={}&end_date={}&hourly=surface_pressure",
        ARCHIVE_URL,
        latitude,
        longitude,
        start_date.format("%Y-%m-%d"),
        end_date.format("%Y-%m-%d"),
    );

    let mut sleep_millis: u64 = 1000;
    let mut attempt = 0;
    loop {
        attempt += 1;
        match try_fetch(client, &url).await {
            Ok(series) => {
                info!(
                    "Fetched {} air pressure rows in {} attempt(s)",
                    series.len(),
                    attempt
                );
                return Ok(series);
            }
            Err(e) if attempt >= MAX_TRIES => {
                warn!("All {} attempts failed for air pressure fetch", MAX_TRIES);
                return Err(e);
            }
            Err(e) => {
                warn!(
                    "Attempt {}/{}: air pressure fetch failed: {}",
                    attempt, MAX_TRIES, e
                );
            }
        }
        info!("Sleeping for {} milliseconds before retry", sleep_millis);
        tokio::time::sleep(std::time::Duration::from_millis(sleep_millis)).await;
        sleep_millis *= 2;
    }
}
