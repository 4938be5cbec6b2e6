//! LLM Port: a multi-model-fallback Gemini client that synthesizes
//! JSON-constrained completions for the video-learning pipeline.
//!
//! Prompt construction and the deterministic non-LLM fallbacks used when
//! every model fails are a `vlearn-core` concern; this crate only knows how
//! to take a prompt and get JSON back.

pub mod client;
pub mod config;
pub mod error;

pub use client::LlmClient;
pub use config::LlmConfig;
pub use error::{LlmError, LlmResult};
