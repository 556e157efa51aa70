use serde::{Deserialize, Serialize};

use crate::error::{DiverError, Result};

/// One stratigraphic layer of a borehole log.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct StratigraphicLayer {
    /// Lithology label, e.g. "sandy_clay"
    pub lithology: String,
    /// Elevation of the layer top (m datum)
    pub top: f64,
    /// Elevation of the layer bottom (m datum)
    pub bottom: f64,
    /// Layer thickness (m)
    pub thickness: f64,
}

/// The stratigraphy of one well, shallowest layer first.
///
/// Layers keep their input order; callers supply tops and bottoms
/// pre-sorted from the borehole log.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Geology {
    pub layers: Vec<StratigraphicLayer>,
}

impl Geology {
    /// Build a stratigraphy from depths below surface.
    ///
    /// `tops` and `bottoms` are depths below the ground surface (m);
    /// they are converted to absolute elevations against the datum.
    pub fn new(
        surface_level: f64,
        tops: &[f64],
        bottoms: &[f64],
        lithology: &[String],
    ) -> Result<Geology> {
        if tops.len() != bottoms.len() || tops.len() != lithology.len() {
            return Err(DiverError::GeologyShape {
                tops: tops.len(),
                bottoms: bottoms.len(),
                labels: lithology.len(),
            });
        }
        let layers = tops
            .iter()
            .zip(bottoms)
            .zip(lithology)
            .map(|((top, bottom), label)| StratigraphicLayer {
                lithology: label.clone(),
                top: surface_level - top,
                bottom: surface_level - bottom,
                thickness: bottom - top,
            })
            .collect();
        Ok(Geology { layers })
    }
}
