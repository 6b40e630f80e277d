//! Realtime poller: AQI stations joined with current weather.
//!
//! DESIGN
//! ======
//! A poll fetches every station inside the configured bounds, then looks up
//! weather for all stations concurrently. Each lookup carries its own
//! deadline and fails on its own: a broken lookup drops that station from
//! the snapshot and bumps `failed`, never the whole batch.
//!
//! A background task re-polls on a fixed interval and swaps the result into
//! `AppState`. The refresh endpoint runs the same poll on demand. Both go
//! through `AppState::refresh`, which serializes polls and skips any that
//! start within the minimum refresh interval of the previous one.

pub mod aqi;
pub mod marker;
pub mod types;
pub mod waqi;
pub mod weather;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::config::RealtimeConfig;
use crate::state::AppState;
pub use types::{RealtimeError, Snapshot, Station, Weather};

pub const NO_STATIONS_MESSAGE: &str = "No AQI Stations Found for Nepal";
pub const DATA_LOAD_ERROR: &str = "Data Load Error";

// =============================================================================
// SOURCES
// =============================================================================

/// Where station listings come from. Enables scripted sources in tests.
#[async_trait::async_trait]
pub trait StationSource: Send + Sync {
    /// List stations inside the configured bounds.
    ///
    /// # Errors
    ///
    /// Returns a [`RealtimeError`] if the request fails or the body is malformed.
    async fn stations(&self) -> Result<Vec<Station>, RealtimeError>;
}

/// Where per-station weather comes from.
#[async_trait::async_trait]
pub trait WeatherSource: Send + Sync {
    /// Current weather at the station's coordinates.
    ///
    /// # Errors
    ///
    /// Returns a [`RealtimeError`] if the request fails or the body is malformed.
    async fn weather(&self, station: &Station) -> Result<Weather, RealtimeError>;
}

/// Send a prepared request and return the body of a 200 response.
pub(crate) async fn fetch_text(request: reqwest::RequestBuilder) -> Result<String, RealtimeError> {
    let response = request.send().await.map_err(|e| RealtimeError::ApiRequest(e.to_string()))?;

    let status = response.status().as_u16();
    let text = response.text().await.map_err(|e| RealtimeError::ApiRequest(e.to_string()))?;

    if status != 200 {
        return Err(RealtimeError::ApiResponse { status, body: text });
    }
    Ok(text)
}

// =============================================================================
// POLLER
// =============================================================================

pub struct Poller {
    stations: Arc<dyn StationSource>,
    weather: Arc<dyn WeatherSource>,
    lookup_timeout: Duration,
}

impl Poller {
    #[must_use]
    pub fn new(stations: Arc<dyn StationSource>, weather: Arc<dyn WeatherSource>, lookup_timeout: Duration) -> Self {
        Self { stations, weather, lookup_timeout }
    }

    /// Build a poller backed by the live WAQI and OpenWeatherMap APIs.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::HttpClientBuild`] if the HTTP client cannot be constructed.
    pub fn from_config(config: &RealtimeConfig) -> Result<Self, RealtimeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| RealtimeError::HttpClientBuild(e.to_string()))?;

        let stations = waqi::WaqiClient::new(http.clone(), config.waqi_token.clone(), config.bounds.clone());
        let weather = weather::OpenWeatherClient::new(http, config.openweather_key.clone());
        Ok(Self::new(
            Arc::new(stations),
            Arc::new(weather),
            Duration::from_secs(config.timeouts.request_secs),
        ))
    }

    /// Run one full poll. Never fails: failures become `Snapshot::Failed`.
    pub async fn poll(&self) -> Snapshot {
        let fetched_at = now_unix();

        let stations = match self.stations.stations().await {
            Ok(stations) => stations,
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "AQI station fetch failed");
                return Snapshot::Failed { message: format!("{DATA_LOAD_ERROR}: {e}"), fetched_at };
            }
        };

        if stations.is_empty() {
            info!("AQI query returned no stations");
            return Snapshot::NoStations { message: NO_STATIONS_MESSAGE.to_string(), fetched_at };
        }

        let lookups = stations.iter().map(|station| self.lookup(station));
        let results = join_all(lookups).await;

        let mut markers = Vec::with_capacity(results.len());
        let mut failed = 0usize;
        for (station, result) in stations.iter().zip(results) {
            match result {
                Ok(weather) => markers.push(marker::build_marker(station, &weather)),
                Err(e) => {
                    failed += 1;
                    warn!(station = %station.name, uid = station.uid, error = %e, "weather lookup failed");
                }
            }
        }

        info!(markers = markers.len(), failed, "realtime snapshot refreshed");
        Snapshot::Stations { markers, failed, fetched_at }
    }

    async fn lookup(&self, station: &Station) -> Result<Weather, RealtimeError> {
        match tokio::time::timeout(self.lookup_timeout, self.weather.weather(station)).await {
            Ok(result) => result,
            Err(_) => Err(RealtimeError::Timeout { secs: self.lookup_timeout.as_secs() }),
        }
    }
}

fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

// =============================================================================
// REFRESH TASK
// =============================================================================

/// Spawn the background refresh task. Returns `None` when the poller is disabled.
pub fn spawn_refresh_task(state: AppState, every: Duration) -> Option<JoinHandle<()>> {
    if state.poller.is_none() {
        return None;
    }
    info!(refresh_secs = every.as_secs(), "realtime refresh configured");
    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            state.refresh().await;
        }
    }))
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
