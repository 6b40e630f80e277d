//! The geometry engine seam.
//!
//! Buffering, intersection tests and great-circle distance are not computed
//! here. In the browser they come from Turf.js (see [`crate::bridge`]); tests
//! supply fixed-answer engines. Every length crossing this seam is in
//! kilometers.

use crate::error::AnalysisError;
use crate::geo::{Geometry, LatLng};

/// Geometry primitives required by the analysis tools.
pub trait GeometryEngine {
    /// Whether the engine is loaded. Checked before every analysis.
    fn available(&self) -> bool {
        true
    }

    /// Polygon covering every point within `radius_km` of `center`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Geometry`] if the engine rejects the input.
    fn buffer(&self, center: LatLng, radius_km: f64) -> Result<Geometry, AnalysisError>;

    /// Whether two geometries share at least one point.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Geometry`] if the engine rejects either input.
    fn intersects(&self, a: &Geometry, b: &Geometry) -> Result<bool, AnalysisError>;

    /// Great-circle distance between two points, in kilometers.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Geometry`] if the engine rejects the input.
    fn distance_km(&self, a: LatLng, b: LatLng) -> Result<f64, AnalysisError>;
}
