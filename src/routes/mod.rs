//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The portfolio site (map lab pages, GeoJSON data, the wasm bundle) is
//! served as static files at `/`. The realtime AQI endpoints and `/healthz`
//! live alongside it under one Axum router.

pub mod realtime;

use std::path::Path;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// API routes used by the realtime map page.
fn api_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/realtime", get(realtime::latest))
        .route("/api/realtime/refresh", post(realtime::refresh))
        .route("/healthz", get(healthz))
        .layer(cors)
        .with_state(state)
}

/// API routes + the portfolio website as the static fallback.
pub fn app(state: AppState, website_dir: &Path) -> Router {
    let website_service = ServeDir::new(website_dir).append_index_html_on_directories(true);

    api_routes(state)
        .fallback_service(website_service)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
