mod config;
mod realtime;
mod routes;
mod state;

use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "no .env file loaded");
    }

    let config = config::SiteConfig::from_env().expect("invalid configuration");

    // Realtime poller is non-fatal: the map page shows the pending state.
    let (poller, refresh_every, min_refresh) = match &config.realtime {
        Some(rt) => match realtime::Poller::from_config(rt) {
            Ok(poller) => {
                tracing::info!(bounds = %rt.bounds, min_refresh_secs = rt.min_refresh_secs, "realtime poller initialized");
                (
                    Some(Arc::new(poller)),
                    Duration::from_secs(rt.refresh_secs),
                    Duration::from_secs(rt.min_refresh_secs),
                )
            }
            Err(e) => {
                tracing::warn!(error = %e, "realtime poller failed to build, AQI map disabled");
                (None, Duration::ZERO, Duration::ZERO)
            }
        },
        None => {
            tracing::warn!("WAQI_TOKEN or OPENWEATHER_API_KEY missing, AQI map disabled");
            (None, Duration::ZERO, Duration::ZERO)
        }
    };

    let state = state::AppState::new(poller, min_refresh);
    let _refresh = realtime::spawn_refresh_task(state.clone(), refresh_every);

    let app = routes::app(state, &config.website_dir);
    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, website_dir = %config.website_dir.display(), "maplab-site listening");
    axum::serve(listener, app).await.expect("server failed");
}
