//! Barometric compensation of diver pressure logs.
//!
//! A diver records the absolute pressure of the water column plus the
//! atmosphere above it. Subtracting a barometric series and anchoring
//! the result to the well geometry (or to a manual hand reading) gives
//! the water level against the vertical datum.
//!
//! The two input series must already share an identical timestamp index
//! (see [`Timeseries::reindex_time`]); mismatched indices fail fast
//! rather than silently misaligning rows.

use std::str::FromStr;

use chrono::NaiveDateTime;

use gwl_diver::error::{DiverError, Result};
use gwl_diver::timeseries::{Timeseries, AIR_PRESSURE, DIVER_PRESSURE, WATER_COLUMN, WATER_LEVEL};
use gwl_diver::well::{HandReading, ObservationWell};

/// Standard gravitational acceleration (m/s2)
const GRAVITATIONAL_ACCELERATION: f64 = 9.80665;

/// Pressure exerted by one meter of fresh water (Pa)
const PASCAL_PER_MH2O: f64 = 9806.65;

/// Density of fresh water (kg/m3)
pub const FRESH_WATER_DENSITY: f64 = 1000.0;

/// How the diver's position is anchored to the datum.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Method {
    /// Use the surveyed cable geometry of the observation well.
    Cable,
    /// Calibrate against a manual depth-to-water reading.
    HandReading,
}

impl FromStr for Method {
    type Err = DiverError;

    fn from_str(s: &str) -> Result<Method> {
        match s {
            "cable" => Ok(Method::Cable),
            "handreading" => Ok(Method::HandReading),
            _ => Err(DiverError::InvalidMethod {
                given: s.to_string(),
            }),
        }
    }
}

/// Height of the water column above the diver, from the row-wise
/// difference between diver and air pressure.
///
/// At fresh-water density the conversion factor is exactly 1, so the
/// water column equals the pressure difference in mH2O; other densities
/// rescale it proportionally. NaN in either input stays NaN.
fn water_column_from(
    baro: &Timeseries,
    diver: &Timeseries,
    water_density: f64,
) -> Result<Timeseries> {
    if baro.index() != diver.index() {
        return Err(DiverError::IndexMismatch);
    }
    let air = baro.column(AIR_PRESSURE).ok_or(DiverError::ColumnNotFound {
        name: AIR_PRESSURE.to_string(),
    })?;
    let diver_pressure = diver
        .column(DIVER_PRESSURE)
        .ok_or(DiverError::ColumnNotFound {
            name: DIVER_PRESSURE.to_string(),
        })?;

    let values = diver_pressure
        .iter()
        .zip(air)
        .map(|(d, a)| {
            let water_pressure = d - a;
            PASCAL_PER_MH2O * water_pressure / (water_density * GRAVITATIONAL_ACCELERATION)
        })
        .collect();

    let mut water_column = Timeseries::new(baro.index().to_vec());
    water_column.set_column(WATER_COLUMN, values)?;
    Ok(water_column)
}

/// The water column value at the timestamp nearest to `datetime`.
/// No tolerance: any non-empty series yields a value.
fn water_column_at_datetime(water_column: &Timeseries, datetime: NaiveDateTime) -> Result<f64> {
    let idx = water_column
        .nearest_index(datetime)
        .ok_or(DiverError::EmptySeries)?;
    let values = water_column
        .column(WATER_COLUMN)
        .ok_or(DiverError::ColumnNotFound {
            name: WATER_COLUMN.to_string(),
        })?;
    Ok(values[idx])
}

/// Elevation of the diver membrane against the datum, derived from a
/// hand reading: the cable length is the water column at the reading
/// time plus the measured depth to water.
fn diver_position_to_datum(
    water_column_above_diver: f64,
    handreading: f64,
    top_well: f64,
) -> f64 {
    let cable_length = water_column_above_diver + handreading;
    top_well - cable_length
}

/// Compensate diver pressure data against barometric pressure and
/// return the water level relative to the datum, assuming fresh water.
///
/// `baro` and `diver` must share an identical timestamp index. The
/// output is a single-column series named `"water_level (m datum)"`
/// on that same index; missing input rows stay missing.
pub fn baro_compensate(
    baro: &Timeseries,
    diver: &Timeseries,
    handreading: Option<&HandReading>,
    observation_well: &ObservationWell,
    method: Method,
) -> Result<Timeseries> {
    baro_compensate_with_density(
        baro,
        diver,
        handreading,
        observation_well,
        method,
        FRESH_WATER_DENSITY,
    )
}

/// As [`baro_compensate`], with an explicit water density in kg/m3
/// (brackish or saline wells).
pub fn baro_compensate_with_density(
    baro: &Timeseries,
    diver: &Timeseries,
    handreading: Option<&HandReading>,
    observation_well: &ObservationWell,
    method: Method,
    water_density: f64,
) -> Result<Timeseries> {
    let water_column = water_column_from(baro, diver, water_density)?;

    let diver_to_datum = match method {
        Method::HandReading => {
            let reading = handreading.ok_or(DiverError::MissingHandReading)?;
            let column_at_reading = water_column_at_datetime(&water_column, reading.datetime)?;
            diver_position_to_datum(column_at_reading, reading.reading, observation_well.top_well)
        }
        Method::Cable => {
            observation_well
                .diver_to_datum
                .ok_or(DiverError::MissingCableLength {
                    well: observation_well.name.clone(),
                })?
        }
    };

    let column_values = water_column
        .column(WATER_COLUMN)
        .ok_or(DiverError::ColumnNotFound {
            name: WATER_COLUMN.to_string(),
        })?;
    let water_level = column_values.iter().map(|wc| diver_to_datum + wc).collect();

    let mut result = Timeseries::new(water_column.index().to_vec());
    result.set_column(WATER_LEVEL, water_level)?;
    Ok(result)
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

    fn simple_diverdata() -> Timeseries {
        let mut series = Timeseries::new((0..5).map(minute).collect());
        series
            .set_column(DIVER_PRESSURE, vec![1000.0, 1010.0, 1020.0, 1030.0, 1040.0])
            .unwrap();
        series
            .set_column(
                gwl_diver::timeseries::TEMPERATURE,
                vec![10.0, 11.0, 12.0, 13.0, 14.0],
            )
            .unwrap();
        series
    }

    fn simple_barodata() -> Timeseries {
        let mut series = Timeseries::new((0..5).map(minute).collect());
        series
            .set_column(AIR_PRESSURE, vec![1000.0, 1000.0, 1000.0, 1000.0, 1010.0])
            .unwrap();
        series
    }

    fn well_with_cable() -> ObservationWell {
        ObservationWell::new("Peilbuis 1", "AA001", 2.5, 0.5, 12.0, Some(4.0)).unwrap()
    }

    fn well_without_cable() -> ObservationWell {
        ObservationWell::new("Peilbuis 2", "AA002", 2.5, 0.5, 12.0, None).unwrap()
    }

    #[test]
    fn test_water_column_from() {
        let water_column =
            water_column_from(&simple_barodata(), &simple_diverdata(), FRESH_WATER_DENSITY)
                .unwrap();
        assert_eq!(water_column.len(), 5);
        assert_eq!(water_column.column_names(), vec![WATER_COLUMN]);
        assert_eq!(
            water_column.column(WATER_COLUMN).unwrap(),
            &[0.0, 10.0, 20.0, 30.0, 30.0]
        );
    }

    #[test]
    fn test_water_column_density_rescales() {
        let water_column = water_column_from(&simple_barodata(), &simple_diverdata(), 1025.0)
            .unwrap();
        let values = water_column.column(WATER_COLUMN).unwrap();
        assert!((values[1] - 10.0 * 1000.0 / 1025.0).abs() < 1e-9);
    }

    #[test]
    fn test_water_column_index_mismatch() {
        let baro = simple_barodata();
        let diver = simple_diverdata().select_daterange(minute(1), minute(4));
        assert!(matches!(
            water_column_from(&baro, &diver, FRESH_WATER_DENSITY),
            Err(DiverError::IndexMismatch)
        ));
    }

    #[test]
    fn test_water_column_at_datetime() {
        let water_column =
            water_column_from(&simple_barodata(), &simple_diverdata(), FRESH_WATER_DENSITY)
                .unwrap();
        let query = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 2, 29)
            .unwrap();
        assert_eq!(water_column_at_datetime(&water_column, query).unwrap(), 20.0);
    }

    #[test]
    fn test_water_column_at_datetime_empty() {
        let empty = Timeseries::new(vec![]);
        assert!(matches!(
            water_column_at_datetime(&empty, minute(0)),
            Err(DiverError::EmptySeries)
        ));
    }

    #[test]
    fn test_diver_position_to_datum() {
        assert_eq!(diver_position_to_datum(0.5, 0.25, 0.0), -0.75);
    }

    #[test]
    fn test_baro_compensate_cable() {
        let well = well_with_cable();
        let result =
            baro_compensate(&simple_barodata(), &simple_diverdata(), None, &well, Method::Cable)
                .unwrap();
        assert_eq!(result.column_names(), vec![WATER_LEVEL]);
        assert_eq!(result.len(), 5);
        // diver_to_datum = 2.0 - 4.0 = -2.0
        assert_eq!(
            result.column(WATER_LEVEL).unwrap(),
            &[-2.0, 8.0, 18.0, 28.0, 28.0]
        );
    }

    #[test]
    fn test_baro_compensate_handreading() {
        let well = well_without_cable();
        let reading = HandReading::from_parts(minute(2), 0.25);
        let result = baro_compensate(
            &simple_barodata(),
            &simple_diverdata(),
            Some(&reading),
            &well,
            Method::HandReading,
        )
        .unwrap();
        assert_eq!(result.column_names(), vec![WATER_LEVEL]);
        // water column at reading = 20.0, cable = 20.25,
        // diver_to_datum = 2.0 - 20.25 = -18.25
        let values = result.column(WATER_LEVEL).unwrap();
        assert_eq!(values[0], -18.25);
        assert_eq!(values[2], 1.75);
    }

    #[test]
    fn test_baro_compensate_cable_without_cable_length() {
        let well = well_without_cable();
        let result = baro_compensate(
            &simple_barodata(),
            &simple_diverdata(),
            None,
            &well,
            Method::Cable,
        );
        assert!(matches!(
            result,
            Err(DiverError::MissingCableLength { .. })
        ));
    }

    #[test]
    fn test_baro_compensate_handreading_without_reading() {
        let well = well_without_cable();
        let result = baro_compensate(
            &simple_barodata(),
            &simple_diverdata(),
            None,
            &well,
            Method::HandReading,
        );
        assert!(matches!(result, Err(DiverError::MissingHandReading)));
    }

    #[test]
    fn test_baro_compensate_nan_propagates() {
        let mut diver = simple_diverdata();
        diver
            .set_column(DIVER_PRESSURE, vec![1000.0, f64::NAN, 1020.0, 1030.0, 1040.0])
            .unwrap();
        let result = baro_compensate(
            &simple_barodata(),
            &diver,
            None,
            &well_with_cable(),
            Method::Cable,
        )
        .unwrap();
        let values = result.column(WATER_LEVEL).unwrap();
        assert!(values[1].is_nan());
        assert_eq!(values[2], 18.0);
        assert_eq!(result.len(), 5, "missing rows are kept, not dropped");
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("cable".parse::<Method>().unwrap(), Method::Cable);
        assert_eq!(
            "handreading".parse::<Method>().unwrap(),
            Method::HandReading
        );
        let err = "bogus".parse::<Method>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("handreading"));
        assert!(message.contains("cable"));
    }
}
