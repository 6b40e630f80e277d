//! Geographic coordinates and the GeoJSON data model.
//!
//! GeoJSON values come from the `geojson` crate, so every geometry type,
//! feature ids, bounding boxes and foreign members survive a load. Positions
//! follow GeoJSON order (`[lng, lat]`); [`LatLng`] is the map-facing order
//! used for clicks and markers. Feature collections are loaded from the
//! site's `Data/*.geojson` files and are read-only once loaded.

#[cfg(test)]
#[path = "geo_test.rs"]
mod geo_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Position, Value as GeometryValue};

use crate::consts::{LABEL_PROPERTIES, UNNAMED_FEATURE};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Read a GeoJSON position. Altitude is ignored; fewer than two
    /// coordinates is not a position.
    #[must_use]
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lng, lat, ..] => Some(Self::new(*lat, *lng)),
            _ => None,
        }
    }

    /// GeoJSON position (`[lng, lat]`).
    #[must_use]
    pub fn position(self) -> Position {
        vec![self.lng, self.lat]
    }

    /// This coordinate as a GeoJSON point geometry.
    #[must_use]
    pub fn to_geometry(self) -> Geometry {
        Geometry::new(GeometryValue::Point(self.position()))
    }
}

/// A clicked coordinate with an optional display label.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisPoint {
    pub position: LatLng,
    pub label: Option<String>,
}

impl AnalysisPoint {
    #[must_use]
    pub fn new(position: LatLng) -> Self {
        Self { position, label: None }
    }

    #[must_use]
    pub fn labeled(position: LatLng, label: &str) -> Self {
        Self { position, label: Some(label.to_owned()) }
    }
}

// =============================================================
// Builders
// =============================================================

/// A line string through the given coordinates.
#[must_use]
pub fn line(points: &[LatLng]) -> Geometry {
    Geometry::new(GeometryValue::LineString(points.iter().map(|p| p.position()).collect()))
}

/// A feature with no id, bbox or foreign members.
#[must_use]
pub fn feature(geometry: Geometry, properties: Option<JsonObject>) -> Feature {
    Feature { bbox: None, geometry: Some(geometry), id: None, properties, foreign_members: None }
}

#[must_use]
pub fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection { bbox: None, features, foreign_members: None }
}

/// Parse a data file. A bare feature or geometry is wrapped into a
/// one-feature collection.
///
/// # Errors
///
/// Returns the `geojson` parse error for malformed JSON or GeoJSON.
pub fn parse_collection(raw: &str) -> Result<FeatureCollection, geojson::Error> {
    Ok(match raw.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(f) => collection(vec![f]),
        GeoJson::Geometry(g) => collection(vec![feature(g, None)]),
    })
}

// =============================================================
// Labels
// =============================================================

/// Best-available display label: the first non-empty label property,
/// falling back to "Unnamed Feature".
#[must_use]
pub fn feature_label(feature: &Feature) -> String {
    LABEL_PROPERTIES
        .iter()
        .filter_map(|key| feature.property(key).and_then(display_value))
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| UNNAMED_FEATURE.to_owned())
}

/// Render a property value as display text. Null, arrays and objects have
/// no display form.
#[must_use]
pub fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

// =============================================================
// HTML
// =============================================================

/// Escape text for insertion into popup and result-panel HTML.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
