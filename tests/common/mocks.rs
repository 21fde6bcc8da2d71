use async_trait::async_trait;
use chat_relay::{
    Error, Result,
    upstream::{GenerationRequest, InferenceClient},
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the mock answers with on each call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Payload(Value),
    Malformed,
    Timeout,
    Network(String),
}

/// Mock inference client for testing
#[derive(Debug, Clone)]
pub struct MockInferenceClient {
    pub reply: Arc<Mutex<MockReply>>,
    pub requests: Arc<Mutex<Vec<(String, GenerationRequest)>>>,
    pub delay: Option<Duration>,
}

impl MockInferenceClient {
    pub fn new(payload: Value) -> Self {
        Self::with_reply(MockReply::Payload(payload))
    }

    pub fn with_reply(reply: MockReply) -> Self {
        Self {
            reply: Arc::new(Mutex::new(reply)),
            requests: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_requests(&self) -> Vec<(String, GenerationRequest)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl InferenceClient for MockInferenceClient {
    async fn generate(&self, token: &str, request: &GenerationRequest) -> Result<Value> {
        self.requests
            .lock()
            .unwrap()
            .push((token.to_string(), request.clone()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self.reply.lock().unwrap().clone();
        match reply {
            MockReply::Payload(value) => Ok(value),
            MockReply::Malformed => Err(Error::upstream_malformed("expected value at line 1")),
            MockReply::Timeout => Err(Error::UpstreamTimeout { timeout_ms: 24_000 }),
            MockReply::Network(msg) => Err(Error::internal(msg)),
        }
    }
}
