//! Generic, JSON-constrained Gemini client.
//!
//! Every call in the pipeline (flashcards, quiz questions, notes, reports)
//! shares the same request/response envelope and the same multi-model
//! fallback walk; only the prompt and the target type differ. This module
//! owns that mechanism. Domain-specific prompt construction and
//! deterministic fallback content live in `vlearn-core`, per the port's
//! "LLM as best-effort oracle" boundary.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::LlmConfig;
use crate::error::{LlmError, LlmResult};

pub struct LlmClient {
    config: LlmConfig,
    http: Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> LlmResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { config, http })
    }

    pub fn from_env() -> LlmResult<Self> {
        Self::new(LlmConfig::from_env()?)
    }

    /// Send `prompt` to each configured model in turn, JSON-mode constrained,
    /// until one returns a response that deserializes into `T`. Returns the
    /// last error if every model fails.
    pub async fn generate_json<T: DeserializeOwned>(&self, prompt: &str, temperature: f32) -> LlmResult<T> {
        let mut last_error = None;

        for model in &self.config.models {
            info!(model = %model, "calling Gemini");
            match self.call_model(model, prompt, temperature).await {
                Ok(value) => {
                    info!(model = %model, "Gemini call succeeded");
                    return Ok(value);
                }
                Err(e) => {
                    warn!(model = %model, error = %e, "Gemini call failed");
                    last_error = Some(e);
                }
            }
        }

        Err(LlmError::AllModelsFailed(
            last_error.map(|e| e.to_string()).unwrap_or_else(|| "no models configured".to_string()),
        ))
    }

    async fn call_model<T: DeserializeOwned>(&self, model: &str, prompt: &str, temperature: f32) -> LlmResult<T> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent?key={}",
            self.config.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content { parts: vec![Part { text: prompt.to_string() }] }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                temperature,
            },
        };

        let response = self.http.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiStatus { status, body });
        }

        let parsed: GeminiResponse = response.json().await?;
        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or(LlmError::EmptyResponse)?;

        Ok(serde_json::from_str(strip_code_fence(text))?)
    }
}

/// Gemini's JSON mode is usually fence-free, but prompts that also carry
/// few-shot examples occasionally echo a ```json ... ``` block back.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text.strip_prefix("```json").or_else(|| text.strip_prefix("```")).unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_code_fence() {
        let raw = "```json\n{\"a\":1}\n```";
        assert_eq!(strip_code_fence(raw), "{\"a\":1}");
    }

    #[test]
    fn passes_through_unfenced_text() {
        let raw = "{\"a\":1}";
        assert_eq!(strip_code_fence(raw), "{\"a\":1}");
    }
}
