//! Realtime types: stations, weather readings, markers and errors.

use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced while fetching station or weather data.
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    /// The HTTP request to the upstream API failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The upstream API returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The upstream response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The upstream API answered with an application-level error.
    #[error("API reported error: {0}")]
    ApiStatus(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// A lookup did not finish within its deadline.
    #[error("lookup timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl RealtimeError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ApiRequest(_) => "E_API_REQUEST",
            Self::ApiResponse { .. } => "E_API_RESPONSE",
            Self::ApiParse(_) => "E_API_PARSE",
            Self::ApiStatus(_) => "E_API_STATUS",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Timeout { .. } => "E_TIMEOUT",
        }
    }
}

// =============================================================================
// STATION / WEATHER
// =============================================================================

/// One air-quality monitoring station inside the configured bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub uid: i64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// `None` when the station publishes no current reading (`"-"`).
    pub aqi: Option<u32>,
}

/// Current weather at a station, metric units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub temp_c: f64,
    pub humidity: f64,
    pub pressure_hpa: f64,
    pub condition: String,
    pub icon: String,
    pub wind_speed_ms: f64,
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// A station joined with its weather, ready for the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationMarker {
    pub uid: i64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub aqi: Option<u32>,
    pub aqi_level: String,
    pub aqi_class: String,
    pub icon_url: String,
    pub popup_html: String,
}

/// Latest result of a poll, served to the realtime map as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Snapshot {
    /// No poll has completed yet.
    Pending,
    /// Stations rendered; `failed` counts stations dropped by a weather error.
    Stations { markers: Vec<StationMarker>, failed: usize, fetched_at: i64 },
    /// The station query succeeded but returned nothing.
    NoStations { message: String, fetched_at: i64 },
    /// The station query itself failed.
    Failed { message: String, fetched_at: i64 },
}

impl Snapshot {
    #[must_use]
    pub fn markers(&self) -> &[StationMarker] {
        match self {
            Self::Stations { markers, .. } => markers,
            _ => &[],
        }
    }
}
