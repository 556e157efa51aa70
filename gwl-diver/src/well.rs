use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{DiverError, Result};
use crate::timeseries::DATETIME_FORMAT;

/// An observation well and its surveyed geometry.
///
/// All geometry is in meters relative to the vertical datum. The struct
/// is a value object: build it once, then read it.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ObservationWell {
    /// Name of the observation well
    pub name: String,
    /// Code identifying the diver placed in the well
    pub diver_code: String,
    /// Elevation of the ground surface (m datum)
    pub surface_level: f64,
    /// Elevation of the top of the well casing (m datum)
    pub top_well: f64,
    /// Total depth of the well (m)
    pub well_depth: f64,
    /// Elevation of the diver membrane (m datum), known only when the
    /// well was surveyed with a cable length
    pub diver_to_datum: Option<f64>,
}

impl ObservationWell {
    /// Build a well from survey measurements.
    ///
    /// `top_well_to_sl` is the depth of the casing top below the ground
    /// surface; a negative value would put the casing above the surface
    /// and is rejected. When `cable_length` is given, the diver membrane
    /// elevation is derived as `top_well - cable_length`.
    pub fn new(
        name: &str,
        diver_code: &str,
        surface_level: f64,
        top_well_to_sl: f64,
        well_depth: f64,
        cable_length: Option<f64>,
    ) -> Result<ObservationWell> {
        if top_well_to_sl < 0.0 {
            return Err(DiverError::WellGeometry {
                well: name.to_string(),
            });
        }
        let top_well = surface_level - top_well_to_sl;
        let diver_to_datum = cable_length.map(|cable| top_well - cable);
        Ok(ObservationWell {
            name: name.to_string(),
            diver_code: diver_code.to_string(),
            surface_level,
            top_well,
            well_depth,
            diver_to_datum,
        })
    }
}

/// A manual depth-to-water measurement taken at a specific time,
/// used to calibrate the diver-derived water level.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct HandReading {
    /// When the reading was taken
    pub datetime: NaiveDateTime,
    /// Depth to water below the top of the well (m)
    pub reading: f64,
}

impl HandReading {
    /// Parse a hand reading from a "YYYY-MM-DD HH:MM:SS" timestamp.
    pub fn new(datetime: &str, reading: f64) -> Result<HandReading> {
        let datetime = NaiveDateTime::parse_from_str(datetime, DATETIME_FORMAT)?;
        Ok(HandReading { datetime, reading })
    }

    pub fn from_parts(datetime: NaiveDateTime, reading: f64) -> HandReading {
        HandReading { datetime, reading }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_derived_geometry() {
        let well =
            ObservationWell::new("Peilbuis 4", "AB123", 2.5, 0.5, 12.0, Some(4.0)).unwrap();
        assert_eq!(well.top_well, 2.0);
        assert_eq!(well.diver_to_datum, Some(-2.0));
        assert_eq!(well.well_depth, 12.0);
    }

    #[test]
    fn test_well_without_cable_length() {
        let well = ObservationWell::new("Peilbuis 4", "AB123", 2.5, 0.5, 12.0, None).unwrap();
        assert_eq!(well.diver_to_datum, None);
    }

    #[test]
    fn test_well_rejects_casing_above_surface() {
        let result = ObservationWell::new("Peilbuis 4", "AB123", 2.5, -0.3, 12.0, None);
        assert!(matches!(result, Err(DiverError::WellGeometry { .. })));
    }

    #[test]
    fn test_hand_reading_parse() {
        let reading = HandReading::new("2024-03-15 09:30:00", 1.25).unwrap();
        assert_eq!(reading.reading, 1.25);
        assert_eq!(
            reading.datetime,
            chrono::NaiveDate::from_ymd_opt(2024, 3, 15)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap()
        );
        assert!(HandReading::new("15/03/2024 09:30", 1.25).is_err());
    }
}
