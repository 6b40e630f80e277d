//! Realtime AQI routes.

use std::time::Duration;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use tracing::{info, warn};

use crate::realtime::Snapshot;
use crate::state::{AppState, RefreshOutcome};

/// `GET /api/realtime`: latest stored snapshot.
pub async fn latest(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.latest().await)
}

/// `POST /api/realtime/refresh`: poll now and return the fresh snapshot.
///
/// Inside the minimum refresh interval the stored snapshot is returned with
/// `429 Too Many Requests` and a `Retry-After` header.
pub async fn refresh(State(state): State<AppState>) -> Response {
    match state.refresh().await {
        Some(RefreshOutcome::Polled(snapshot)) => Json(snapshot).into_response(),
        Some(RefreshOutcome::Throttled { snapshot, retry_after }) => {
            let secs = retry_after_secs(retry_after);
            info!(retry_after_secs = secs, "manual realtime refresh throttled");
            (StatusCode::TOO_MANY_REQUESTS, [(header::RETRY_AFTER, secs.to_string())], Json(snapshot)).into_response()
        }
        None => {
            warn!("refresh requested but realtime poller is not configured");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

/// Whole seconds until the next poll is allowed, rounded up.
fn retry_after_secs(remaining: Duration) -> u64 {
    let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
    secs.max(1)
}

#[cfg(test)]
#[path = "realtime_test.rs"]
mod tests;
