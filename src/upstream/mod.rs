mod client;
mod types;

pub use client::{HuggingFaceClient, InferenceClient, with_deadline};
pub use types::{GenerationParameters, GenerationRequest};
