//! Environment-derived configuration for the Gemini-backed LLM client.

use crate::error::{LlmError, LlmResult};

/// Models are tried in order; the first to return a parseable response wins.
/// Preview models are kept at front and back rather than bracketing the GA
/// tier, since they're the most and least likely to regress between runs.
const DEFAULT_MODELS: &[&str] = &[
    "gemini-3-flash-preview",
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "gemini-2.5-pro",
    "gemini-3-pro-preview",
];

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub models: Vec<String>,
    pub request_timeout_secs: u64,
}

impl LlmConfig {
    pub fn from_env() -> LlmResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| LlmError::MissingApiKey)?;

        let models = std::env::var("GEMINI_MODELS")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|| DEFAULT_MODELS.iter().map(|s| s.to_string()).collect());

        let request_timeout_secs = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        Ok(Self { api_key, models, request_timeout_secs })
    }
}
