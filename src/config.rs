//! Site configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_WEBSITE_DIR: &str = "./website";
pub const DEFAULT_WAQI_BOUNDS: &str = "27.347144,80.058815,30.446945,88.201530";
pub const DEFAULT_REALTIME_REFRESH_SECS: u64 = 600;
pub const DEFAULT_REALTIME_MIN_REFRESH_SECS: u64 = 60;
pub const DEFAULT_REALTIME_REQUEST_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_REALTIME_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Errors raised while reading site configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `PORT` is set but is not a valid port number.
    #[error("invalid PORT: {0}")]
    InvalidPort(String),

    /// `WAQI_BOUNDS` is not four comma-separated coordinates.
    #[error("invalid WAQI_BOUNDS '{0}' (expected lat1,lng1,lat2,lng2)")]
    InvalidBounds(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealtimeTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

/// Credentials and tuning for the AQI/weather poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeConfig {
    pub waqi_token: String,
    pub openweather_key: String,
    pub bounds: String,
    pub refresh_secs: u64,
    /// Polls closer together than this are answered from the stored snapshot.
    pub min_refresh_secs: u64,
    pub timeouts: RealtimeTimeouts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub port: u16,
    pub website_dir: PathBuf,
    /// `None` when either API credential is absent; the poller stays off.
    pub realtime: Option<RealtimeConfig>,
}

impl SiteConfig {
    /// Build typed site config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `WEBSITE_DIR`: default `./website`
    /// - `WAQI_TOKEN` + `OPENWEATHER_API_KEY`: both required to enable the poller
    /// - `WAQI_BOUNDS`: default Nepal bounding box
    /// - `REALTIME_REFRESH_SECS`: default 600
    /// - `REALTIME_MIN_REFRESH_SECS`: default 60
    /// - `REALTIME_REQUEST_TIMEOUT_SECS`: default 20
    /// - `REALTIME_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// Intervals and timeouts are clamped to at least one second.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when `PORT` or `WAQI_BOUNDS` is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = parse_port(std::env::var("PORT").ok().as_deref())?;
        let website_dir = std::env::var("WEBSITE_DIR").map_or_else(|_| PathBuf::from(DEFAULT_WEBSITE_DIR), PathBuf::from);

        let bounds = parse_bounds(std::env::var("WAQI_BOUNDS").ok().as_deref())?;
        let realtime = match (non_empty_var("WAQI_TOKEN"), non_empty_var("OPENWEATHER_API_KEY")) {
            (Some(waqi_token), Some(openweather_key)) => Some(RealtimeConfig {
                waqi_token,
                openweather_key,
                bounds,
                refresh_secs: env_parse_u64("REALTIME_REFRESH_SECS", DEFAULT_REALTIME_REFRESH_SECS).max(1),
                min_refresh_secs: env_parse_u64("REALTIME_MIN_REFRESH_SECS", DEFAULT_REALTIME_MIN_REFRESH_SECS).max(1),
                timeouts: RealtimeTimeouts {
                    request_secs: env_parse_u64("REALTIME_REQUEST_TIMEOUT_SECS", DEFAULT_REALTIME_REQUEST_TIMEOUT_SECS)
                        .max(1),
                    connect_secs: env_parse_u64("REALTIME_CONNECT_TIMEOUT_SECS", DEFAULT_REALTIME_CONNECT_TIMEOUT_SECS)
                        .max(1),
                },
            }),
            _ => None,
        };

        Ok(Self { port, website_dir, realtime })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_port(raw: Option<&str>) -> Result<u16, ConfigError> {
    match raw {
        None => Ok(DEFAULT_PORT),
        Some(v) => v.trim().parse::<u16>().map_err(|_| ConfigError::InvalidPort(v.to_string())),
    }
}

fn parse_bounds(raw: Option<&str>) -> Result<String, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_WAQI_BOUNDS.to_string());
    };
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let valid = parts.len() == 4 && parts.iter().all(|p| p.parse::<f64>().is_ok_and(f64::is_finite));
    if valid {
        Ok(parts.join(","))
    } else {
        Err(ConfigError::InvalidBounds(raw.to_string()))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
