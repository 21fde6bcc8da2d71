use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Incoming chat body, kept as raw JSON. Fields are read individually so a
/// malformed sibling never hides a usable message.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    body: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

impl ChatRequest {
    /// Parses a raw body leniently: anything that is not JSON is treated as
    /// an empty request.
    pub fn from_body(body: &[u8]) -> Self {
        Self::from_value(serde_json::from_slice(body).unwrap_or_default())
    }

    pub fn from_value(body: Value) -> Self {
        Self { body }
    }

    pub fn text(message: impl Into<String>) -> Self {
        Self::from_value(json!({ "message": message.into() }))
    }

    /// The `message` field when it is a string.
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    /// `content` of the last `messages` entry, when `messages` is an array.
    /// Earlier entries are never inspected.
    pub fn last_turn_content(&self) -> Option<&Value> {
        self.body
            .get("messages")
            .and_then(Value::as_array)
            .and_then(|turns| turns.last())
            .and_then(|turn| turn.get("content"))
    }
}

impl ChatReply {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}
