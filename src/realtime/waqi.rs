//! WAQI `map/bounds` client.
//!
//! Thin HTTP wrapper; `parse_stations` is pure for testability.

use serde::Deserialize;
use serde_json::Value;

use super::types::{RealtimeError, Station};
use super::{StationSource, fetch_text};

const API_URL: &str = "https://api.waqi.info/map/bounds/";

// =============================================================================
// CLIENT
// =============================================================================

pub struct WaqiClient {
    http: reqwest::Client,
    token: String,
    bounds: String,
}

impl WaqiClient {
    #[must_use]
    pub fn new(http: reqwest::Client, token: String, bounds: String) -> Self {
        Self { http, token, bounds }
    }
}

#[async_trait::async_trait]
impl StationSource for WaqiClient {
    async fn stations(&self) -> Result<Vec<Station>, RealtimeError> {
        let request = self
            .http
            .get(API_URL)
            .query(&[("latlng", self.bounds.as_str()), ("token", self.token.as_str())]);
        let text = fetch_text(request).await?;
        parse_stations(&text)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct BoundsResponse {
    status: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct WireStation {
    uid: i64,
    lat: f64,
    lon: f64,
    #[serde(default)]
    aqi: Value,
    #[serde(default)]
    station: Option<WireStationInfo>,
}

#[derive(Deserialize)]
struct WireStationInfo {
    #[serde(default)]
    name: Option<String>,
}

// =============================================================================
// PARSING
// =============================================================================

pub(crate) fn parse_stations(json: &str) -> Result<Vec<Station>, RealtimeError> {
    let resp: BoundsResponse = serde_json::from_str(json).map_err(|e| RealtimeError::ApiParse(e.to_string()))?;

    if resp.status != "ok" {
        let message = match resp.data {
            Value::String(s) => s,
            other => format!("status '{}' ({other})", resp.status),
        };
        return Err(RealtimeError::ApiStatus(message));
    }

    if resp.data.is_null() {
        return Ok(Vec::new());
    }

    let wire: Vec<WireStation> =
        serde_json::from_value(resp.data).map_err(|e| RealtimeError::ApiParse(e.to_string()))?;

    Ok(wire
        .into_iter()
        .map(|w| {
            let name = w
                .station
                .and_then(|s| s.name)
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("Station {}", w.uid));
            Station { uid: w.uid, name, lat: w.lat, lon: w.lon, aqi: parse_aqi(&w.aqi) }
        })
        .collect())
}

/// WAQI reports AQI as a number or a numeric string; `"-"` means no reading.
pub(crate) fn parse_aqi(raw: &Value) -> Option<u32> {
    match raw {
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .or_else(|| n.as_f64().filter(|v| v.is_finite() && *v >= 0.0).map(round_aqi)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0).map(round_aqi))
        }
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_aqi(v: f64) -> u32 {
    v.round().min(f64::from(u32::MAX)) as u32
}

#[cfg(test)]
#[path = "waqi_test.rs"]
mod tests;
