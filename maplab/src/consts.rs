//! Shared constants for the map lab.

use crate::geo::LatLng;

// ── Map ─────────────────────────────────────────────────────────

/// Initial map center: Dhangadhi.
pub const HOME: LatLng = LatLng { lat: 28.7050, lng: 80.6090 };

/// Initial zoom level.
pub const HOME_ZOOM: u8 = 15;

/// Popup shown on the hometown marker.
pub const HOME_LABEL: &str = "🏡 My Hometown: Dhangadhi";

/// Maximum zoom supported by every base layer.
pub const MAX_ZOOM: u8 = 19;

// ── Analysis ────────────────────────────────────────────────────

/// Default overlay buffer radius in meters.
pub const DEFAULT_BUFFER_RADIUS_M: u32 = 500;

/// Multiplier applied to the great-circle distance to fake a road distance.
pub const ROUTE_DETOUR_FACTOR: f64 = 1.5;

/// Label used when a feature has none of the label properties.
pub const UNNAMED_FEATURE: &str = "Unnamed Feature";

/// Property names consulted, in order, for a feature's display label.
pub const LABEL_PROPERTIES: [&str; 3] = ["name", "Name", "road_name"];

// ── Popups ──────────────────────────────────────────────────────

pub const ANALYSIS_POINT_POPUP: &str = "Analysis Point";
pub const START_POINT_POPUP: &str = "Start Point";
pub const END_POINT_POPUP: &str = "End Point";

// ── Result panel placeholders ───────────────────────────────────

pub const RESULT_PLACEHOLDER: &str = "<p>Results will appear here after analysis.</p>";
pub const DISTANCE_PLACEHOLDER: &str = "0 km";
pub const MARKER_PLACEHOLDER: &str = "<p>Click on the map to set a marker</p>";

// ── Styles ──────────────────────────────────────────────────────

/// Buffer polygon stroke and fill.
pub const BUFFER_COLOR: &str = "#3498db";

/// Intersection highlight stroke and fill.
pub const HIGHLIGHT_COLOR: &str = "#2ecc71";

/// Simulated route line.
pub const ROUTE_COLOR: &str = "#e74c3c";
