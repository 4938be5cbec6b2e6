//! Job types for the queue.
//!
//! The pipeline enqueues exactly one kind of background work: carry a
//! submitted video through batched transcription and flashcard generation
//! (§4.3). Quiz and notes generation are synchronous request/response calls
//! and never touch this queue. The `video_id` is the job's natural key —
//! at most one `ProcessVideoJob` may be in flight per video (§5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vlearn_models::{ProjectId, UserId, VideoId};

/// Job to carry a submitted video through batched transcription and
/// flashcard generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessVideoJob {
    pub video_id: VideoId,
    pub video_url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    pub created_at: DateTime<Utc>,
}

impl ProcessVideoJob {
    pub fn new(video_id: VideoId, video_url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            video_id,
            video_url: video_url.into(),
            title: title.into(),
            user_id: None,
            project_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_user(mut self, user_id: Option<UserId>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_project(mut self, project_id: Option<ProjectId>) -> Self {
        self.project_id = project_id;
        self
    }

    /// Deduplication key: one in-flight process job per video, ever.
    pub fn idempotency_key(&self) -> String {
        format!("process:{}", self.video_id)
    }
}

/// Tagged job wrapper for queue storage. Only one job kind exists today;
/// new background job types slot in as additional variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueJob {
    ProcessVideo(ProcessVideoJob),
}

impl QueueJob {
    pub fn video_id(&self) -> &VideoId {
        match self {
            QueueJob::ProcessVideo(j) => &j.video_id,
        }
    }

    pub fn idempotency_key(&self) -> String {
        match self {
            QueueJob::ProcessVideo(j) => j.idempotency_key(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_video_job_serde_roundtrip() {
        let job = ProcessVideoJob::new(VideoId::from("abc12345678"), "https://youtu.be/abc12345678", "Title");
        let wrapper = QueueJob::ProcessVideo(job.clone());
        let json = serde_json::to_string(&wrapper).expect("serialize");
        let decoded: QueueJob = serde_json::from_str(&json).expect("deserialize");

        match decoded {
            QueueJob::ProcessVideo(j) => {
                assert_eq!(j.video_id, job.video_id);
                assert_eq!(j.video_url, job.video_url);
            }
        }
    }

    #[test]
    fn idempotency_key_is_keyed_by_video_id() {
        let video_id = VideoId::from("abc12345678");
        let a = ProcessVideoJob::new(video_id.clone(), "https://youtu.be/abc12345678", "T1");
        let b = ProcessVideoJob::new(video_id, "https://youtu.be/abc12345678", "T2");
        assert_eq!(a.idempotency_key(), b.idempotency_key());
    }
}
