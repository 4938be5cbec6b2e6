//! Video Intake + Transcript Acquirer (§4.1, §4.2).
//!
//! ## Modules
//! - `canonical_id` - derive a stable video id from a source URL
//! - `metadata` - fetch and validate video metadata ahead of transcription
//! - `captions` - primary tier: platform captions via `yt-dlp`
//! - `speech_to_text` - fallback tier: audio extraction + Whisper-compatible API
//! - `rechunk` - shared 120s walking-accumulator windowing policy
//! - `acquire` - ties the tiers together into one `transcribe` call
//! - `config` - `IntakeConfig::from_env()`

pub mod acquire;
pub mod canonical_id;
pub mod captions;
pub mod config;
pub mod error;
pub mod metadata;
pub mod rechunk;
pub mod speech_to_text;

pub use acquire::transcribe;
pub use canonical_id::canonical_id;
pub use config::IntakeConfig;
pub use error::{TranscribeError, TranscribeResult};
pub use metadata::{fetch_metadata, validate, VideoMetadata};
pub use rechunk::{rechunk, CaptionEntry};
