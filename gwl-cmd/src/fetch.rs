//! Remote barometric data fetch.

use log::info;

use gwl_diver::baro_api;
use gwl_utils::dates;

/// Fetch hourly air pressure for a coordinate and write it as CSV.
pub async fn run_fetch_baro(
    latitude: f64,
    longitude: f64,
    start_date: &str,
    end_date: &str,
    output: &str,
) -> anyhow::Result<()> {
    let start = dates::parse_date(start_date)?;
    let end = dates::parse_date(end_date)?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(60))
        .build()?;

    info!(
        "Fetching air pressure for ({}, {}) from {} to {}",
        latitude, longitude, start, end
    );
    let series = baro_api::fetch_air_pressure(&client, latitude, longitude, &start, &end).await?;

    std::fs::write(output, series.to_csv_string())?;
    info!("{} air pressure rows written to {}", series.len(), output);
    Ok(())
}
