use super::types::ChatRequest;
use crate::{Error, Result};
use serde_json::Value;

/// Pulls the user text out of a request: a string `message` first, otherwise
/// the `content` of the last entry in `messages`, otherwise nothing.
pub fn extract_message(request: &ChatRequest) -> String {
    if let Some(message) = request.message() {
        return message.to_string();
    }

    request
        .last_turn_content()
        .map(value_to_text)
        .unwrap_or_default()
}

/// Trims the message and keeps only its trailing `max_chars` characters.
pub fn sanitize(raw: &str, max_chars: usize) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyMessage);
    }
    Ok(keep_tail(trimmed, max_chars).to_string())
}

fn keep_tail(text: &str, max_chars: usize) -> &str {
    let total = text.chars().count();
    if total <= max_chars {
        return text;
    }
    match text.char_indices().nth(total - max_chars) {
        Some((offset, _)) => &text[offset..],
        None => "",
    }
}

/// Text form of a JSON value; `null` is empty and strings are unquoted.
pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
