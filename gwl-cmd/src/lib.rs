//! Command implementations for the GWL CLI.
//!
//! Provides subcommands for compensating diver pressure logs into water
//! levels and for fetching remote barometric data.

use clap::Subcommand;

pub mod compensate;
pub mod fetch;

#[derive(Subcommand)]
pub enum Command {
    /// Compensate diver pressure logs into water level CSVs
    Compensate {
        /// Path to the well metadata CSV
        #[arg(short = 'm', long)]
        metadata_csv: String,

        /// Path to the barometric diver export
        #[arg(short = 'b', long)]
        baro_csv: String,

        /// Directory containing per-well diver exports, named <location_id>.csv
        #[arg(short = 'd', long)]
        data_dir: String,

        /// Directory to write per-well water level CSVs into
        #[arg(short = 'o', long)]
        output_dir: String,

        /// Compensation method: "cable" or "handreading"
        #[arg(long, default_value = "cable")]
        method: String,

        /// First day of the compensation window (YYYY-MM-DD)
        #[arg(long)]
        start_date: String,

        /// Last day of the compensation window (YYYY-MM-DD)
        #[arg(long)]
        end_date: String,
    },

    /// Fetch hourly air pressure for a coordinate and write it as CSV
    FetchBaro {
        /// Latitude in decimal degrees
        #[arg(long)]
        latitude: f64,

        /// Longitude in decimal degrees
        #[arg(long)]
        longitude: f64,

        /// First day to fetch (YYYY-MM-DD)
        #[arg(long)]
        start_date: String,

        /// Last day to fetch (YYYY-MM-DD)
        #[arg(long)]
        end_date: String,

        /// Output CSV path
        #[arg(short = 'o', long)]
        output: String,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Compensate {
            metadata_csv,
            baro_csv,
            data_dir,
            output_dir,
            method,
            start_date,
            end_date,
        } => compensate::run_compensate(
            &metadata_csv,
            &baro_csv,
            &data_dir,
            &output_dir,
            &method,
            &start_date,
            &end_date,
        ),
        Command::FetchBaro {
            latitude,
            longitude,
            start_date,
            end_date,
            output,
        } => fetch::run_fetch_baro(latitude, longitude, &start_date, &end_date, &output).await,
    }
}
