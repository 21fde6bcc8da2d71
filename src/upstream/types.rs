use serde::{Deserialize, Serialize};

/// Body sent to the text-generation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub inputs: String,
    pub parameters: GenerationParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub max_new_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_full_text: Option<bool>,
}

impl GenerationRequest {
    pub fn new(inputs: impl Into<String>, parameters: GenerationParameters) -> Self {
        Self {
            inputs: inputs.into(),
            parameters,
        }
    }
}
