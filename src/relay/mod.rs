mod identity;
mod normalize;
mod rate_limit;
mod safety;
mod sanitize;
mod types;

pub use identity::{ANONYMOUS, FORWARDED_FOR, caller_identity};
pub use normalize::{NO_RESPONSE, Normalized, TRUNCATION_MARKER, UpstreamPayload, normalize};
pub use rate_limit::{InMemoryRateLimitStore, RateLimitRecord, RateLimitStore, RateLimiter};
pub use safety::{INPUT_REFUSAL, OUTPUT_REFUSAL, SafetyCategory, Verdict, classify};
pub use sanitize::{extract_message, sanitize};
pub use types::{ChatReply, ChatRequest};

use crate::{
    Error, Result,
    config::{Config, LimitsConfig, TOKEN_ENV, UpstreamConfig},
    upstream::{GenerationParameters, GenerationRequest, InferenceClient},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs one chat message through limiting, sanitizing, filtering, the model
/// call and reply normalization.
pub struct ChatRelay {
    upstream: UpstreamConfig,
    limits: LimitsConfig,
    limiter: RateLimiter,
    client: Arc<dyn InferenceClient>,
}

impl ChatRelay {
    pub fn new(config: &Config, limiter: RateLimiter, client: Arc<dyn InferenceClient>) -> Self {
        Self {
            upstream: config.upstream.clone(),
            limits: config.limits.clone(),
            limiter,
            client,
        }
    }

    /// Handles one request from `identity`. Safety refusals are replies, not
    /// errors.
    pub async fn handle(&self, identity: &str, request: &ChatRequest) -> Result<ChatReply> {
        let token = self.upstream.token().ok_or_else(|| Error::MissingCredential {
            name: TOKEN_ENV.to_string(),
        })?;

        self.limiter.check(identity).await?;

        let message = sanitize(&extract_message(request), self.limits.max_input_chars)?;

        if let Verdict::Refused { category, pattern } = classify(&message) {
            warn!(
                "Refusing input from {} (category: {}, pattern: {})",
                identity, category, pattern
            );
            return Ok(ChatReply::new(INPUT_REFUSAL));
        }

        let generation = GenerationRequest::new(message, self.generation_parameters());
        let data = self.client.generate(token, &generation).await?;

        let reply = match normalize(&data, self.limits.max_reply_chars) {
            Normalized::Notice(notice) => {
                warn!("Upstream returned no usable text: {}", data);
                notice
            }
            Normalized::Text(text) => {
                if let Verdict::Refused { category, pattern } = classify(&text) {
                    warn!(
                        "Refusing model reply for {} (category: {}, pattern: {})",
                        identity, category, pattern
                    );
                    OUTPUT_REFUSAL.to_string()
                } else {
                    debug!("Model reply of {} chars", text.chars().count());
                    text
                }
            }
        };

        info!("Relayed chat message for {}", identity);
        Ok(ChatReply::new(reply))
    }

    fn generation_parameters(&self) -> GenerationParameters {
        GenerationParameters {
            max_new_tokens: self.upstream.max_new_tokens,
            temperature: self.upstream.temperature,
            return_full_text: self.upstream.return_full_text,
        }
    }
}
