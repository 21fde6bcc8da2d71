use serde::{Deserialize, Serialize};

pub use crate::relay::{ChatReply, ChatRequest};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&crate::Error> for ErrorResponse {
    fn from(error: &crate::Error) -> Self {
        Self {
            error: error.public_message(),
        }
    }
}
