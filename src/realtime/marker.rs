//! Station + weather → map marker with popup markup.

use super::aqi::AqiCategory;
use super::types::{Station, StationMarker, Weather};

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

#[must_use]
pub fn weather_icon_url(icon: &str) -> String {
    format!("{ICON_BASE_URL}/{icon}.png")
}

#[must_use]
pub fn build_marker(station: &Station, weather: &Weather) -> StationMarker {
    let category = AqiCategory::from_aqi(station.aqi);
    let icon_url = weather_icon_url(&escape_html(&weather.icon));
    let aqi_text = station.aqi.map_or_else(|| "-".to_string(), |v| v.to_string());
    let condition = escape_html(&weather.condition);

    let popup_html = format!(
        concat!(
            r#"<div class="aqi-popup">"#,
            r#"<div class="aqi-header">"#,
            "<b>{name}</b><br>",
            "<b>Air Quality:</b> ",
            r#"<span class="{class}">{aqi} ({level})</span>"#,
            "</div>",
            r#"<div class="weather-info">"#,
            r#"<img src="{icon}" alt="{condition}">"#,
            "<div>",
            "<b>Condition:</b> {condition}<br>",
            "<b>Temp:</b> {temp} °C<br>",
            "<b>Humidity:</b> {humidity}%<br>",
            "<b>Pressure:</b> {pressure} hPa<br>",
            "<b>Wind:</b> {wind} m/s",
            "</div></div></div>",
        ),
        name = escape_html(&station.name),
        class = category.css_class(),
        aqi = aqi_text,
        level = category.level(),
        icon = icon_url,
        condition = condition,
        temp = weather.temp_c,
        humidity = weather.humidity,
        pressure = weather.pressure_hpa,
        wind = weather.wind_speed_ms,
    );

    StationMarker {
        uid: station.uid,
        name: station.name.clone(),
        lat: station.lat,
        lon: station.lon,
        aqi: station.aqi,
        aqi_level: category.level().to_string(),
        aqi_class: category.css_class().to_string(),
        icon_url,
        popup_html,
    }
}

/// Upstream names land inside popup markup.
fn escape_html(raw: &str) -> String {
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

#[cfg(test)]
#[path = "marker_test.rs"]
mod tests;
