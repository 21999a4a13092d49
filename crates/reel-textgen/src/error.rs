//! Text generation error types.

use thiserror::Error;

pub type TextGenResult<T> = Result<T, TextGenError>;

#[derive(Debug, Error)]
pub enum TextGenError {
    #[error("Failed to configure text generator: {0}")]
    ConfigError(String),

    #[error("Language model request failed: {0}")]
    RequestFailed(String),

    #[error("Malformed language model response: {0}")]
    MalformedResponse(String),

    #[error("Variation contract violated: {0}")]
    ContractViolation(String),
}

impl TextGenError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn contract(msg: impl Into<String>) -> Self {
        Self::ContractViolation(msg.into())
    }
}
