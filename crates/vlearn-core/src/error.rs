//! Error taxonomy for the pipeline core (§7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported video type: {0}")]
    UnsupportedVideoType(String),

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("video duration {actual}s exceeds the maximum of {max}s")]
    DurationExceeded { actual: f64, max: f64 },

    #[error("could not fetch video metadata: {0}")]
    MetadataUnavailable(String),

    #[error("insufficient credits: need {required}, have {available}")]
    InsufficientCredits { required: u32, available: u32 },

    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("LLM synthesis failed: {0}")]
    LlmSynthesisFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("dependency failure: {0}")]
    DependencyFailure(String),

    /// `deduct`/`add` called with a non-positive amount. The source allows
    /// this to pass through silently for `deduct`; this implementation
    /// treats it as a programming error (§9).
    #[error("credit amount must be greater than zero, got {0}")]
    InvalidAmount(i64),

    #[error("user {0} not found")]
    UserNotFound(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::DependencyFailure(_))
    }
}

impl From<vlearn_store::FirestoreError> for CoreError {
    fn from(err: vlearn_store::FirestoreError) -> Self {
        match err {
            vlearn_store::FirestoreError::NotFound(msg) => CoreError::NotFound(msg),
            other => CoreError::DependencyFailure(other.to_string()),
        }
    }
}

impl From<vlearn_transcribe::TranscribeError> for CoreError {
    fn from(err: vlearn_transcribe::TranscribeError) -> Self {
        use vlearn_transcribe::TranscribeError as T;
        match err {
            T::UnrecognizedUrl(u) => CoreError::InvalidUrl(u),
            T::UnknownDuration => CoreError::MetadataUnavailable("duration unknown".to_string()),
            T::DurationExceeded { actual, max } => CoreError::DurationExceeded { actual, max },
            T::UnsupportedLanguage(lang) => CoreError::UnsupportedLanguage(lang),
            T::MetadataFetchFailed(msg) => CoreError::MetadataUnavailable(msg),
            T::CaptionsDisabled | T::NoTranscriptFound | T::SpeechToTextFailed(_) | T::TranscriptionFailed(_) => {
                CoreError::TranscriptionFailed(err.to_string())
            }
            T::Io(e) => CoreError::TranscriptionFailed(e.to_string()),
        }
    }
}

impl From<vlearn_llm::LlmError> for CoreError {
    fn from(err: vlearn_llm::LlmError) -> Self {
        CoreError::LlmSynthesisFailed(err.to_string())
    }
}

impl From<vlearn_queue::QueueError> for CoreError {
    fn from(err: vlearn_queue::QueueError) -> Self {
        CoreError::DependencyFailure(err.to_string())
    }
}
