//! OpenWeatherMap current-weather client.

use serde::Deserialize;

use super::types::{RealtimeError, Station, Weather};
use super::{WeatherSource, fetch_text};

const API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

pub struct OpenWeatherClient {
    http: reqwest::Client,
    api_key: String,
}

impl OpenWeatherClient {
    #[must_use]
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self { http, api_key }
    }
}

#[async_trait::async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn weather(&self, station: &Station) -> Result<Weather, RealtimeError> {
        let request = self.http.get(API_URL).query(&[
            ("lat", station.lat.to_string()),
            ("lon", station.lon.to_string()),
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
        ]);
        let text = fetch_text(request).await?;
        parse_weather(&text)
    }
}

#[derive(Deserialize)]
struct WeatherResponse {
    main: Main,
    weather: Vec<Condition>,
    wind: Wind,
}

#[derive(Deserialize)]
struct Main {
    temp: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Deserialize)]
struct Condition {
    description: String,
    icon: String,
}

#[derive(Deserialize)]
struct Wind {
    speed: f64,
}

pub(crate) fn parse_weather(json: &str) -> Result<Weather, RealtimeError> {
    let resp: WeatherResponse = serde_json::from_str(json).map_err(|e| RealtimeError::ApiParse(e.to_string()))?;
    let condition = resp
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| RealtimeError::ApiParse("weather list is empty".into()))?;

    Ok(Weather {
        temp_c: resp.main.temp,
        humidity: resp.main.humidity,
        pressure_hpa: resp.main.pressure,
        condition: condition.description,
        icon: condition.icon,
        wind_speed_ms: resp.wind.speed,
    })
}

#[cfg(test)]
#[path = "weather_test.rs"]
mod tests;
