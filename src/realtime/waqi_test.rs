use super::*;
use serde_json::json;

#[test]
fn parse_stations_reads_bounds_payload() {
    let body = json!({
        "status": "ok",
        "data": [
            {"lat": 27.7172, "lon": 85.324, "uid": 8677, "aqi": "57", "station": {"name": "Kathmandu", "time": "2026-10-18T09:00:00+05:45"}},
            {"lat": 28.7, "lon": 80.6, "uid": 42, "aqi": 161}
        ]
    })
    .to_string();

    let stations = parse_stations(&body).unwrap();
    assert_eq!(stations.len(), 2);
    assert_eq!(stations[0].name, "Kathmandu");
    assert_eq!(stations[0].aqi, Some(57));
    assert_eq!(stations[1].name, "Station 42");
    assert_eq!(stations[1].aqi, Some(161));
}

#[test]
fn parse_stations_dash_means_no_reading() {
    let body = r#"{"status":"ok","data":[{"lat":1.0,"lon":2.0,"uid":7,"aqi":"-","station":{"name":""}}]}"#;
    let stations = parse_stations(body).unwrap();
    assert_eq!(stations[0].aqi, None);
    assert_eq!(stations[0].name, "Station 7");
}

#[test]
fn parse_stations_empty_data() {
    assert!(parse_stations(r#"{"status":"ok","data":[]}"#).unwrap().is_empty());
    assert!(parse_stations(r#"{"status":"ok"}"#).unwrap().is_empty());
}

#[test]
fn parse_stations_error_status() {
    let err = parse_stations(r#"{"status":"error","data":"Invalid key"}"#).unwrap_err();
    assert_eq!(err.error_code(), "E_API_STATUS");
    assert!(err.to_string().contains("Invalid key"));
}

#[test]
fn parse_stations_malformed_json() {
    let err = parse_stations("<html>").unwrap_err();
    assert!(matches!(err, RealtimeError::ApiParse(_)));
}

#[test]
fn parse_aqi_variants() {
    assert_eq!(parse_aqi(&json!(12)), Some(12));
    assert_eq!(parse_aqi(&json!(12.6)), Some(13));
    assert_eq!(parse_aqi(&json!(" 88 ")), Some(88));
    assert_eq!(parse_aqi(&json!("-")), None);
    assert_eq!(parse_aqi(&json!(-4)), None);
    assert_eq!(parse_aqi(&Value::Null), None);
}
