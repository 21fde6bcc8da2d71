use super::types::*;
use crate::{Error, Result, config::UpstreamConfig};
use async_trait::async_trait;
use serde_json::Value;
use std::{future::Future, time::Duration};
use tracing::{debug, error};

#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Sends one generation request and returns the decoded JSON payload,
    /// whatever its shape.
    async fn generate(&self, token: &str, request: &GenerationRequest) -> Result<Value>;
}

/// Races `call` against `timeout`. When the deadline wins the in-flight future
/// is dropped, which cancels the request, and `Error::UpstreamTimeout` is
/// returned. The timer is released on every path.
pub async fn with_deadline<T, F>(timeout: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(Error::UpstreamTimeout {
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

pub struct HuggingFaceClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HuggingFaceClient {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &UpstreamConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, token: &str, request: &GenerationRequest) -> Result<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!("Upstream responded with status {}", status);

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        serde_json::from_slice(&body).map_err(|e| {
            error!("Upstream returned non-JSON response (status {}): {}", status, e);
            Error::upstream_malformed(e.to_string())
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::UpstreamTimeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            Error::Network(e)
        }
    }
}

#[async_trait]
impl InferenceClient for HuggingFaceClient {
    async fn generate(&self, token: &str, request: &GenerationRequest) -> Result<Value> {
        debug!(
            "Sending generation request to {} ({} input chars)",
            self.endpoint,
            request.inputs.chars().count()
        );

        with_deadline(self.timeout, self.send(token, request)).await
    }
}
