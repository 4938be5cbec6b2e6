//! Errors raised by the LLM port.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("GEMINI_API_KEY not configured")]
    MissingApiKey,

    #[error("request to Gemini failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Gemini returned {status}: {body}")]
    ApiStatus { status: u16, body: String },

    #[error("Gemini response had no candidate content")]
    EmptyResponse,

    #[error("failed to parse Gemini JSON output: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("all Gemini models failed; last error: {0}")]
    AllModelsFailed(String),
}

pub type LlmResult<T> = Result<T, LlmError>;

impl LlmError {
    /// Rate limiting and 5xx responses are worth a retry by the caller;
    /// bad input or a missing key never will be.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Request(_) => true,
            LlmError::ApiStatus { status, .. } => *status == 429 || *status >= 500,
            LlmError::MissingApiKey | LlmError::EmptyResponse | LlmError::InvalidJson(_) | LlmError::AllModelsFailed(_) => false,
        }
    }
}
