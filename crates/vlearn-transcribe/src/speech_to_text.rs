//! Speech-to-text fallback tier: download audio, submit to a Whisper-compatible
//! transcription API, return raw entries for the shared rechunk policy.
//!
//! Grounded in `original_source/backend/services/whisper_service.py`'s
//! `_transcribe_with_whisper`: download audio with `yt-dlp`, call the
//! `whisper-1` model with `response_format=verbose_json` and
//! `timestamp_granularities=["segment"]`, read back per-segment timestamps.

use std::path::{Path, PathBuf};

use reqwest::multipart;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{TranscribeError, TranscribeResult};
use crate::rechunk::CaptionEntry;

#[derive(Debug, Clone)]
pub struct SpeechToTextConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
}

impl SpeechToTextConfig {
    pub fn from_env() -> TranscribeResult<Self> {
        let api_key = std::env::var("WHISPER_API_KEY")
            .map_err(|_| TranscribeError::SpeechToTextFailed("WHISPER_API_KEY not configured".to_string()))?;
        let api_url = std::env::var("WHISPER_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1/audio/transcriptions".to_string());
        let model = std::env::var("WHISPER_MODEL").unwrap_or_else(|_| "whisper-1".to_string());
        Ok(Self { api_key, api_url, model })
    }
}

pub struct SpeechToTextClient {
    config: SpeechToTextConfig,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct WhisperResponse {
    text: String,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

impl SpeechToTextClient {
    pub fn new(config: SpeechToTextConfig) -> Self {
        Self { config, http: reqwest::Client::new() }
    }

    /// Download audio for `video_url` (optionally windowed) into a scoped
    /// temp directory, submit it for transcription, and return raw entries.
    /// The temp directory and every file written into it are removed before
    /// this function returns, on every path including error returns.
    pub async fn transcribe(&self, video_url: &str, window: Option<(f64, f64)>) -> TranscribeResult<Vec<CaptionEntry>> {
        let workdir = tempfile::tempdir()?;
        let audio_path = download_audio(video_url, window, workdir.path()).await?;
        self.transcribe_audio_file(&audio_path).await
    }

    async fn transcribe_audio_file(&self, audio_path: &Path) -> TranscribeResult<Vec<CaptionEntry>> {
        info!(path = ?audio_path, "submitting audio to speech-to-text API");

        let bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path.file_name().and_then(|n| n.to_str()).unwrap_or("audio.mp3").to_string();

        let form = multipart::Form::new()
            .text("model", self.config.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment")
            .part("file", multipart::Part::bytes(bytes).file_name(file_name));

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscribeError::SpeechToTextFailed(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TranscribeError::SpeechToTextFailed(format!("API returned {status}: {body}")));
        }

        let parsed: WhisperResponse = response
            .json()
            .await
            .map_err(|e| TranscribeError::SpeechToTextFailed(format!("failed to parse response: {e}")))?;

        if parsed.segments.is_empty() {
            warn!("speech-to-text response had no segments, synthesizing a single entry");
            return Ok(vec![CaptionEntry { start: 0.0, duration: 0.0, text: parsed.text }]);
        }

        Ok(parsed
            .segments
            .into_iter()
            .map(|s| CaptionEntry { start: s.start, duration: (s.end - s.start).max(0.0), text: s.text })
            .collect())
    }
}

async fn download_audio(video_url: &str, window: Option<(f64, f64)>, workdir: &Path) -> TranscribeResult<PathBuf> {
    info!(url = %video_url, "downloading audio for speech-to-text");

    let output_template = workdir.join("audio.%(ext)s");
    let mut args = vec![
        "-f".to_string(),
        "bestaudio/best".to_string(),
        "-x".to_string(),
        "--audio-format".to_string(),
        "mp3".to_string(),
        "--audio-quality".to_string(),
        "192K".to_string(),
        "--output".to_string(),
        output_template.to_string_lossy().to_string(),
    ];
    if let Some((start, end)) = window {
        args.push("--download-sections".to_string());
        args.push(format!("*{start}-{end}"));
    }
    args.push(video_url.to_string());

    let output = tokio::process::Command::new("yt-dlp")
        .args(&args)
        .output()
        .await
        .map_err(|e| TranscribeError::SpeechToTextFailed(format!("failed to spawn yt-dlp: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TranscribeError::SpeechToTextFailed(format!("audio download failed: {stderr}")));
    }

    let mp3_path = workdir.join("audio.mp3");
    if !mp3_path.exists() {
        return Err(TranscribeError::SpeechToTextFailed("yt-dlp did not produce an audio file".to_string()));
    }
    Ok(mp3_path)
}
