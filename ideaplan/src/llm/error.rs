//! LLM error types

use thiserror::Error;

/// Errors that can occur during a model call
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// Non-success status from the local server; only the code is reported
    #[error("{0}")]
    Status(u16),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
