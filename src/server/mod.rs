pub mod handlers;
pub mod types;

use crate::{
    Result,
    config::Config,
    relay::{ChatRelay, InMemoryRateLimitStore, RateLimiter},
    upstream::HuggingFaceClient,
};
use axum::{Router, extract::DefaultBodyLimit, routing::post};
use chrono::Utc;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

pub use handlers::AppState;

/// Builds the chat routes. `/api/chat` mirrors the serverless path.
pub fn router(state: AppState) -> Router {
    let chat = post(handlers::chat).fallback(handlers::method_not_allowed);
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);

    Router::new()
        .route("/", chat.clone())
        .route("/api/chat", chat)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    if config.upstream.token().is_none() {
        warn!("HF_TOKEN is not set; chat requests will fail until it is configured");
    }

    // Initialize rate limiting
    let store = InMemoryRateLimitStore::new();
    let limiter = RateLimiter::from_config(Arc::new(store.clone()), &config.limits);
    spawn_purge_task(store, config.limits.rate_limit_window_ms);

    // Initialize upstream client
    let client = HuggingFaceClient::new(&config.upstream);
    info!("Relaying chat requests to {}", client.endpoint());

    let app_state = AppState {
        relay: Arc::new(ChatRelay::new(&config, limiter, Arc::new(client))),
        max_body_bytes: config.server.max_body_bytes,
    };

    let app = router(app_state);

    // Start server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Periodically drops rate-limit records whose window has closed.
fn spawn_purge_task(store: InMemoryRateLimitStore, window_ms: i64) {
    let period = Duration::from_millis(window_ms.max(1_000) as u64);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match store.purge_expired(Utc::now().timestamp_millis(), window_ms) {
                Ok(0) => {}
                Ok(removed) => debug!("Purged {} expired rate limit records", removed),
                Err(e) => warn!("Failed to purge rate limit records: {}", e),
            }
        }
    });
}
