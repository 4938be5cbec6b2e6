//! Video entity and its processing lifecycle.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::VideoId;
use crate::transcript::Transcript;

/// Processing status of a video, part of the wire contract (`GET
/// /api/video/{id}/status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    #[default]
    Processing,
    Transcribing,
    TranscribingBatch,
    GeneratingFlashcards,
    GeneratingFlashcardsBatch,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Transcribing => "transcribing",
            Self::TranscribingBatch => "transcribing_batch",
            Self::GeneratingFlashcards => "generating_flashcards",
            Self::GeneratingFlashcardsBatch => "generating_flashcards_batch",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn is_batch_phase(&self) -> bool {
        matches!(self, Self::TranscribingBatch | Self::GeneratingFlashcardsBatch)
    }
}

/// A submitted video and its derived learning artifacts.
///
/// Identity is the canonical source id. The transcript is set once at
/// completion (or incrementally while a batch is in flight) and the record
/// is never mutated after it reaches a terminal status except by explicit
/// delete.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Video {
    pub id: VideoId,
    pub title: String,
    /// Duration in seconds.
    pub duration: f64,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Transcript>,
    pub processing_status: ProcessingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// 1-based index of the batch currently being processed; 0 when not
    /// in a batch phase.
    #[serde(default)]
    pub batch_current: u32,
    /// Total number of batches for this video; 0 when not in a batch phase.
    #[serde(default)]
    pub batch_total: u32,
    pub created_at: DateTime<Utc>,
}

impl Video {
    pub fn new(id: VideoId, title: impl Into<String>, duration: f64, source_url: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            duration,
            source_url: source_url.into(),
            transcript: None,
            processing_status: ProcessingStatus::Processing,
            error_message: None,
            batch_current: 0,
            batch_total: 0,
            created_at: Utc::now(),
        }
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.processing_status = ProcessingStatus::Failed;
        self.error_message = Some(error.into());
    }

    pub fn mark_completed(&mut self, transcript: Transcript) {
        self.transcript = Some(transcript);
        self.processing_status = ProcessingStatus::Completed;
        self.batch_current = 0;
        self.batch_total = 0;
    }

    pub fn has_transcript(&self) -> bool {
        self.transcript.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_video_starts_processing() {
        let v = Video::new(VideoId::from("abc123"), "Title", 300.0, "https://youtu.be/abc123");
        assert_eq!(v.processing_status, ProcessingStatus::Processing);
        assert!(!v.has_transcript());
    }

    #[test]
    fn terminal_statuses() {
        assert!(ProcessingStatus::Completed.is_terminal());
        assert!(ProcessingStatus::Failed.is_terminal());
        assert!(!ProcessingStatus::TranscribingBatch.is_terminal());
    }
}
