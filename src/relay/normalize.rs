use super::sanitize::value_to_text;
use serde_json::Value;

pub const NO_RESPONSE: &str = "No response from model.";
pub const TRUNCATION_MARKER: &str = "...";

/// The shapes a text-generation endpoint may answer with, resolved in
/// priority order.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamPayload {
    /// `[{"generated_text": "..."}, ...]`
    GeneratedList(String),
    /// `{"generated_text": "..."}`
    Generated(String),
    /// `{"output": "..."}`, an older shape.
    Output(String),
    /// `{"error": ...}` with a truthy error value.
    ModelError(Value),
    Unrecognized,
}

impl UpstreamPayload {
    pub fn resolve(data: &Value) -> Self {
        if let Some(text) = data
            .as_array()
            .and_then(|items| items.first())
            .and_then(|first| first.get("generated_text"))
            .and_then(Value::as_str)
        {
            return Self::GeneratedList(text.to_string());
        }

        let Some(object) = data.as_object() else {
            return Self::Unrecognized;
        };

        if let Some(text) = object.get("generated_text").and_then(Value::as_str) {
            return Self::Generated(text.to_string());
        }

        if let Some(text) = object.get("output").and_then(Value::as_str) {
            return Self::Output(text.to_string());
        }

        match object.get("error") {
            Some(error) if is_truthy(error) => Self::ModelError(error.clone()),
            _ => Self::Unrecognized,
        }
    }

    /// Generated text, when the payload carried any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::GeneratedList(text) | Self::Generated(text) | Self::Output(text) => Some(text),
            Self::ModelError(_) | Self::Unrecognized => None,
        }
    }
}

/// Outcome of normalizing an upstream payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// Model text, trimmed and length-capped. Still subject to the output
    /// safety check.
    Text(String),
    /// A final reply that bypasses further processing.
    Notice(String),
}

pub fn normalize(data: &Value, max_reply_chars: usize) -> Normalized {
    match UpstreamPayload::resolve(data) {
        UpstreamPayload::ModelError(error) => {
            Normalized::Notice(format!("Model error: {}", value_to_text(&error)))
        }
        UpstreamPayload::Unrecognized => Normalized::Notice(NO_RESPONSE.to_string()),
        payload => {
            let text = payload.text().unwrap_or_default();
            Normalized::Text(cap_reply(text.trim(), max_reply_chars))
        }
    }
}

fn cap_reply(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((offset, _)) => format!("{}{}", &text[..offset], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const MAX: usize = 8000;

    #[test]
    fn test_generated_list() {
        let data = json!([{"generated_text": "hello"}]);
        assert_eq!(normalize(&data, MAX), Normalized::Text("hello".to_string()));
    }

    #[test]
    fn test_generated_object() {
        let data = json!({"generated_text": "  hi there \n"});
        assert_eq!(normalize(&data, MAX), Normalized::Text("hi there".to_string()));
    }

    #[test]
    fn test_legacy_output() {
        let data = json!({"output": "legacy"});
        assert_eq!(
            UpstreamPayload::resolve(&data),
            UpstreamPayload::Output("legacy".to_string())
        );
    }

    #[test]
    fn test_generated_text_beats_output_and_error() {
        let data = json!({"output": "second", "error": "third", "generated_text": "first"});
        assert_eq!(
            UpstreamPayload::resolve(&data),
            UpstreamPayload::Generated("first".to_string())
        );
    }

    #[test]
    fn test_model_error() {
        let data = json!({"error": "model busy"});
        assert_eq!(
            normalize(&data, MAX),
            Normalized::Notice("Model error: model busy".to_string())
        );
    }

    #[test]
    fn test_structured_model_error_uses_json_text() {
        let data = json!({"error": {"code": 503}});
        assert_eq!(
            normalize(&data, MAX),
            Normalized::Notice(r#"Model error: {"code":503}"#.to_string())
        );
    }

    #[test]
    fn test_falsy_error_is_unrecognized() {
        for data in [json!({"error": ""}), json!({"error": null}), json!({"error": 0})] {
            assert_eq!(UpstreamPayload::resolve(&data), UpstreamPayload::Unrecognized);
        }
    }

    #[test]
    fn test_unrecognized_shapes() {
        for data in [
            json!({}),
            json!([]),
            json!([{"text": "x"}]),
            json!([{"generated_text": 5}]),
            json!("plain string"),
            json!(null),
        ] {
            assert_eq!(
                normalize(&data, MAX),
                Normalized::Notice(NO_RESPONSE.to_string()),
                "payload {data}"
            );
        }
    }

    #[test]
    fn test_long_reply_is_capped_with_marker() {
        let data = json!([{"generated_text": "x".repeat(9000)}]);
        let Normalized::Text(reply) = normalize(&data, MAX) else {
            panic!("expected text");
        };
        assert_eq!(reply.chars().count(), MAX + TRUNCATION_MARKER.len());
        assert!(reply.ends_with("x..."));
    }

    #[test]
    fn test_reply_at_limit_is_untouched() {
        let text = "y".repeat(MAX);
        let data = json!({"generated_text": text.clone()});
        assert_eq!(normalize(&data, MAX), Normalized::Text(text));
    }
}
