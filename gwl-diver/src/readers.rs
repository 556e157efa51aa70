//! Fixed-schema readers for diver exports and project metadata.
//!
//! Each instrument export has its own header block, delimiter, decimal
//! convention and column layout; the readers normalize all of them into
//! [`Timeseries`] tables with mH2O pressure columns.

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};

use crate::error::{DiverError, Result};
use crate::geology::Geology;
use crate::timeseries::{
    Timeseries, AIR_PRESSURE, CONDUCTIVITY, DIVER_PRESSURE, PRECIPITATION, TEMPERATURE,
};
use crate::well::{HandReading, ObservationWell};

/// Header lines before the data block in a TD-Diver or Baro-Diver export.
pub const TD_DIVER_SKIP_ROWS: usize = 52;

/// Header lines before the data block in an EC diver (CTD) export.
pub const EC_DIVER_SKIP_ROWS: usize = 64;

/// Date format used inside Van Essen exports: "YYYY/MM/DD HH:MM:SS"
pub const DIVER_DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Date format used by Diver-Link portal exports: "DD/MM/YYYY HH:MM:SS"
pub const DIVER_LINK_DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Date format used by precipitation exports: "DD-MM-YYYY"
pub const PRECIPITATION_DATE_FORMAT: &str = "%d-%m-%Y";

/// Diver exports are written as ISO-8859-1; every byte maps to exactly
/// one char.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Parse a decimal-comma numeric cell. A cell of only padding spaces is
/// a missing value.
fn parse_decimal(cell: &str) -> Result<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(f64::NAN);
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| DiverError::NumberParse(cell.to_string()))
}

fn field<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str> {
    record.get(idx).ok_or_else(|| DiverError::MissingField {
        name: name.to_string(),
    })
}

/// Shared parser for Van Essen exports: a fixed-size header block, then
/// `;`-separated rows of date, pressure (cmH2O) and temperature, with an
/// `END OF DATA` trailer line that is always dropped.
fn parse_van_essen(
    content: &str,
    skip_rows: usize,
    pressure_column: &str,
    with_conductivity: bool,
) -> Result<Timeseries> {
    let mut data_lines: Vec<&str> = content.lines().skip(skip_rows).collect();
    // the trailer is not a data row
    data_lines.pop();

    let mut index = Vec::with_capacity(data_lines.len());
    let mut pressure = Vec::with_capacity(data_lines.len());
    let mut temperature = Vec::with_capacity(data_lines.len());
    let mut conductivity = Vec::with_capacity(data_lines.len());

    let data_block = data_lines.join("\n");
    let mut rdr = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(data_block.as_bytes());
    for row in rdr.records() {
        let record = row?;
        let date = NaiveDateTime::parse_from_str(field(&record, 0, "date")?.trim(), DIVER_DATE_FORMAT)?;
        index.push(date);
        // cmH2O to mH2O
        pressure.push(parse_decimal(field(&record, 1, "pressure")?)? / 100.0);
        temperature.push(parse_decimal(field(&record, 2, "temperature")?)?);
        if with_conductivity {
            conductivity.push(parse_decimal(field(&record, 3, "conductivity")?)?);
        }
    }

    let mut series = Timeseries::new(index);
    series.set_column(pressure_column, pressure)?;
    series.set_column(TEMPERATURE, temperature)?;
    if with_conductivity {
        series.set_column(CONDUCTIVITY, conductivity)?;
    }
    Ok(series)
}

/// Parse a TD-Diver export into a `"diver_pressure (mH2O)"` series.
pub fn parse_td_diver(content: &str) -> Result<Timeseries> {
    parse_van_essen(content, TD_DIVER_SKIP_ROWS, DIVER_PRESSURE, false)
}

/// Read a TD-Diver export file (ISO-8859-1).
pub fn read_td_diver<P: AsRef<Path>>(path: P) -> Result<Timeseries> {
    let bytes = fs::read(path)?;
    parse_td_diver(&decode_latin1(&bytes))
}

/// Parse a CTD (EC) diver export, which carries an extra electrical
/// conductivity column behind a longer header block.
pub fn parse_ec_diver(content: &str) -> Result<Timeseries> {
    parse_van_essen(content, EC_DIVER_SKIP_ROWS, DIVER_PRESSURE, true)
}

/// Read a CTD (EC) diver export file (ISO-8859-1).
pub fn read_ec_diver<P: AsRef<Path>>(path: P) -> Result<Timeseries> {
    let bytes = fs::read(path)?;
    parse_ec_diver(&decode_latin1(&bytes))
}

/// Parse a Baro-Diver export into an `"air_pressure (mH2O)"` series.
pub fn parse_baro_diver(content: &str) -> Result<Timeseries> {
    parse_van_essen(content, TD_DIVER_SKIP_ROWS, AIR_PRESSURE, false)
}

/// Read a Baro-Diver export file (ISO-8859-1).
pub fn read_baro_diver<P: AsRef<Path>>(path: P) -> Result<Timeseries> {
    let bytes = fs::read(path)?;
    parse_baro_diver(&decode_latin1(&bytes))
}

/// Parse a Diver-Link portal export: comma-separated with a header row,
/// date first, temperature and pressure (cmH2O) in the third and fourth
/// columns.
pub fn parse_diver_link(content: &str) -> Result<Timeseries> {
    let mut index = Vec::new();
    let mut temperature = Vec::new();
    let mut pressure = Vec::new();

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());
    for row in rdr.records() {
        let record = row?;
        let date = NaiveDateTime::parse_from_str(
            field(&record, 0, "date")?.trim(),
            DIVER_LINK_DATE_FORMAT,
        )?;
        index.push(date);
        temperature.push(parse_decimal(field(&record, 2, "temperature")?)?);
        pressure.push(parse_decimal(field(&record, 3, "pressure")?)? / 100.0);
    }

    let mut series = Timeseries::new(index);
    series.set_column(TEMPERATURE, temperature)?;
    series.set_column(DIVER_PRESSURE, pressure)?;
    Ok(series)
}

/// Read a Diver-Link portal export file.
pub fn read_diver_link<P: AsRef<Path>>(path: P) -> Result<Timeseries> {
    parse_diver_link(&fs::read_to_string(path)?)
}

/// Parse a daily precipitation export: `;`-separated, decimal comma,
/// one date and one value per row.
pub fn parse_precipitation(content: &str) -> Result<Timeseries> {
    let mut index = Vec::new();
    let mut values = Vec::new();

    let mut rdr = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());
    for row in rdr.records() {
        let record = row?;
        let date =
            NaiveDate::parse_from_str(field(&record, 0, "date")?.trim(), PRECIPITATION_DATE_FORMAT)?;
        index.push(date.and_hms_opt(0, 0, 0).unwrap());
        values.push(parse_decimal(field(&record, 1, "precipitation")?)?);
    }

    let mut series = Timeseries::new(index);
    series.set_column(PRECIPITATION, values)?;
    Ok(series)
}

/// Read a precipitation export file.
pub fn read_precipitation<P: AsRef<Path>>(path: P) -> Result<Timeseries> {
    parse_precipitation(&fs::read_to_string(path)?)
}

/// One row of the project well-metadata table: the well itself plus the
/// identifiers and calibration data the batch driver needs.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct WellRecord {
    /// Location identifier; diver files are named `<location_id>.csv`
    pub location_id: String,
    pub well: ObservationWell,
    /// Manual calibration reading, when one was taken
    pub hand_reading: Option<HandReading>,
}

/// Parse the well-metadata CSV.
///
/// Expected columns: location_id, name, diver_code, surface_level_m,
/// top_of_well_to_sl_cm, well_depth_cm, cable_length_cm,
/// handreading_datetime, handreading_m. The last three may be empty.
pub fn parse_well_metadata(csv_object: &str) -> Result<Vec<WellRecord>> {
    let mut records = Vec::new();
    let mut rdr = ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_object.as_bytes());
    for row in rdr.records() {
        let record = row?;
        let location_id = field(&record, 0, "location_id")?.trim().to_string();
        let name = field(&record, 1, "name")?.trim().to_string();
        let diver_code = field(&record, 2, "diver_code")?.trim().to_string();
        let surface_level = parse_decimal(field(&record, 3, "surface_level_m")?)?;
        let top_well_to_sl = parse_decimal(field(&record, 4, "top_of_well_to_sl_cm")?)? / 100.0;
        let well_depth = parse_decimal(field(&record, 5, "well_depth_cm")?)? / 100.0;
        let cable_length = match record.get(6).map(str::trim) {
            Some("") | None => None,
            Some(cell) => Some(parse_decimal(cell)? / 100.0),
        };
        let hand_reading = match (record.get(7).map(str::trim), record.get(8).map(str::trim)) {
            (Some(datetime), Some(reading)) if !datetime.is_empty() && !reading.is_empty() => {
                Some(HandReading::new(datetime, parse_decimal(reading)?)?)
            }
            _ => None,
        };
        let well = ObservationWell::new(
            &name,
            &diver_code,
            surface_level,
            top_well_to_sl,
            well_depth,
            cable_length,
        )?;
        records.push(WellRecord {
            location_id,
            well,
            hand_reading,
        });
    }
    Ok(records)
}

/// Read the well-metadata CSV file.
pub fn read_well_metadata<P: AsRef<Path>>(path: P) -> Result<Vec<WellRecord>> {
    parse_well_metadata(&fs::read_to_string(path)?)
}

/// Parse a per-well geology CSV into a [`Geology`].
///
/// Expected columns: top_cm_sl, bottom_cm_sl, lithology — depths in cm
/// below surface level, shallowest layer first. Spaces in lithology
/// labels become underscores.
pub fn parse_geology(csv_object: &str, surface_level: f64) -> Result<Geology> {
    let mut tops = Vec::new();
    let mut bottoms = Vec::new();
    let mut lithology = Vec::new();

    let mut rdr = ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_object.as_bytes());
    for row in rdr.records() {
        let record = row?;
        tops.push(parse_decimal(field(&record, 0, "top_cm_sl")?)? / 100.0);
        bottoms.push(parse_decimal(field(&record, 1, "bottom_cm_sl")?)? / 100.0);
        lithology.push(field(&record, 2, "lithology")?.trim().replace(' ', "_"));
    }
    Geology::new(surface_level, &tops, &bottoms, &lithology)
}

/// Read a per-well geology CSV file.
pub fn read_geology<P: AsRef<Path>>(path: P, surface_level: f64) -> Result<Geology> {
    parse_geology(&fs::read_to_string(path)?, surface_level)
}
