use axum::http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{name} not configured in environment")]
    MissingCredential { name: String },

    #[error("Method not allowed: {method}")]
    MethodNotAllowed { method: String },

    #[error("Empty message")]
    EmptyMessage,

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Failed to read request body: {0}")]
    InvalidBody(String),

    #[error("Rate limit exceeded for {identity}: {count} requests in window (max {max})")]
    RateLimited {
        identity: String,
        count: u32,
        max: u32,
    },

    #[error("Rate limit store error: {0}")]
    RateLimitStore(String),

    #[error("Upstream request timed out after {timeout_ms}ms")]
    UpstreamTimeout { timeout_ms: u64 },

    #[error("Upstream returned malformed payload: {0}")]
    UpstreamMalformed(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn rate_limit_store(msg: impl Into<String>) -> Self {
        Self::RateLimitStore(msg.into())
    }

    pub fn upstream_malformed(msg: impl Into<String>) -> Self {
        Self::UpstreamMalformed(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status reported to the caller for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::EmptyMessage | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::UpstreamMalformed(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to return to the caller. Unclassified failures collapse to a
    /// generic message so no internal detail leaks out.
    pub fn public_message(&self) -> String {
        match self {
            Self::MissingCredential { .. } => self.to_string(),
            Self::MethodNotAllowed { .. } => "Method not allowed".to_string(),
            Self::EmptyMessage => "Empty message".to_string(),
            Self::PayloadTooLarge { .. } => "Request body too large".to_string(),
            Self::InvalidBody(_) => "Invalid request body".to_string(),
            Self::RateLimited { .. } => "Rate limit exceeded. Try again shortly.".to_string(),
            Self::UpstreamTimeout { .. } => "Model request timed out".to_string(),
            Self::UpstreamMalformed(_) => "Model returned non-JSON response".to_string(),
            _ => "Server error".to_string(),
        }
    }
}
