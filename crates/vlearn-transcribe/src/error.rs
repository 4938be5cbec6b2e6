//! Errors raised by video intake and transcript acquisition.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("could not determine a canonical id for {0}")]
    UnrecognizedUrl(String),

    #[error("could not determine video duration")]
    UnknownDuration,

    #[error("video duration {actual}s exceeds the maximum of {max}s")]
    DurationExceeded { actual: f64, max: f64 },

    #[error("video language {0} is not supported; only English is supported")]
    UnsupportedLanguage(String),

    #[error("failed to fetch video metadata: {0}")]
    MetadataFetchFailed(String),

    #[error("captions are disabled for this video")]
    CaptionsDisabled,

    #[error("no transcript is available for this video")]
    NoTranscriptFound,

    #[error("speech-to-text transcription failed: {0}")]
    SpeechToTextFailed(String),

    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TranscribeResult<T> = Result<T, TranscribeError>;

impl TranscribeError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, TranscribeError::MetadataFetchFailed(_) | TranscribeError::SpeechToTextFailed(_) | TranscribeError::Io(_))
    }
}
