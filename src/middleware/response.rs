use axum::Json;
use serde::{Deserialize, Serialize};

/// `{"message": "..."}` acknowledgement body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `{"token": "..."}` body returned by login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

// Convenience type alias
pub type ApiResult<T> = Result<Json<T>, crate::error::ApiError>;
