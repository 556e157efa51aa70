//! Batch compensation of diver logs into water level CSVs.

use std::path::Path;

use chrono::TimeDelta;
use log::{info, warn};

use gwl_data::compensation::{baro_compensate, Method};
use gwl_diver::readers;
use gwl_utils::dates;

/// Compensate every well in the metadata table.
///
/// The barometric series and each diver series are reindexed onto the
/// same hourly grid over `[start_date, end_date]` before compensation.
/// Wells whose diver export is missing or whose compensation fails are
/// logged and skipped; the run continues with the remaining wells.
pub fn run_compensate(
    metadata_csv: &str,
    baro_csv: &str,
    data_dir: &str,
    output_dir: &str,
    method: &str,
    start_date: &str,
    end_date: &str,
) -> anyhow::Result<()> {
    let method = method.parse::<Method>()?;
    let start = dates::parse_date_or_datetime(start_date)?;
    let end = dates::parse_date_or_datetime(end_date)?;
    let step = TimeDelta::try_hours(1).unwrap();

    let baro = readers::read_baro_diver(baro_csv)?.reindex_time(start, end, step);
    info!("Barometric series reindexed to {} hourly rows", baro.len());

    let wells = readers::read_well_metadata(metadata_csv)?;
    if wells.is_empty() {
        anyhow::bail!("no wells found in {}", metadata_csv);
    }
    std::fs::create_dir_all(output_dir)?;

    let mut compensated = 0usize;
    let mut skipped = 0usize;
    for record in &wells {
        let diver_path = Path::new(data_dir).join(format!("{}.csv", record.location_id));
        if !diver_path.exists() {
            warn!(
                "{}: no diver export at {}, skipping",
                record.location_id,
                diver_path.display()
            );
            skipped += 1;
            continue;
        }

        let diver = match readers::read_td_diver(&diver_path) {
            Ok(series) => series.reindex_time(start, end, step),
            Err(e) => {
                warn!("{}: failed to read diver export: {}", record.location_id, e);
                skipped += 1;
                continue;
            }
        };

        let water_level = match baro_compensate(
            &baro,
            &diver,
            record.hand_reading.as_ref(),
            &record.well,
            method,
        ) {
            Ok(series) => series,
            Err(e) => {
                warn!("{}: compensation failed: {}", record.location_id, e);
                skipped += 1;
                continue;
            }
        };

        let output_path =
            Path::new(output_dir).join(format!("{}_water_level.csv", record.location_id));
        std::fs::write(&output_path, water_level.to_csv_string())?;
        info!(
            "{}: {} rows written to {}",
            record.location_id,
            water_level.len(),
            output_path.display()
        );
        compensated += 1;
    }

    info!(
        "Compensation complete: {}/{} wells, {} skipped",
        compensated,
        wells.len(),
        skipped
    );
    Ok(())
}
