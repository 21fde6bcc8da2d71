use super::mocks::MockInferenceClient;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response},
};
use chat_relay::{
    config::{Config, UpstreamConfig},
    relay::{ChatRelay, InMemoryRateLimitStore, RateLimiter},
    server::{self, AppState},
};
use serde_json::Value;
use std::sync::Arc;

pub const TEST_TOKEN: &str = "hf_test_token";

/// Create a test configuration with a token and default limits
pub fn create_test_config() -> Config {
    Config {
        upstream: UpstreamConfig {
            api_token: Some(TEST_TOKEN.to_string()),
            ..UpstreamConfig::default()
        },
        ..Config::default()
    }
}

/// Build the relay around a mock client
pub fn create_relay(config: &Config, client: MockInferenceClient) -> ChatRelay {
    let limiter = RateLimiter::from_config(
        Arc::new(InMemoryRateLimitStore::new()),
        &config.limits,
    );
    ChatRelay::new(config, limiter, Arc::new(client))
}

/// Build the full router around a mock client
pub fn create_test_app(config: &Config, client: MockInferenceClient) -> Router {
    server::router(AppState {
        relay: Arc::new(create_relay(config, client)),
        max_body_bytes: config.server.max_body_bytes,
    })
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_json_from(uri: &str, body: &Value, forwarded_for: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", forwarded_for)
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Read a response body as JSON
pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
