//! Redis Streams job queue for the video-learning pipeline.
//!
//! This crate provides:
//! - Job enqueueing via Redis Streams
//! - Worker consumption with retry/DLQ
//! - Progress events via Redis Pub/Sub, with history and heartbeat tracking

pub mod error;
pub mod job;
pub mod progress;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::{ProcessVideoJob, QueueJob};
pub use progress::{
    ProgressChannel, ProgressEvent, ProgressMessage, VideoStatusCache, HEARTBEAT_TTL_SECS, PROGRESS_HISTORY_TTL_SECS,
    STALE_GRACE_PERIOD_SECS, STALE_THRESHOLD_SECS, VIDEO_STATUS_TTL_SECS,
};
pub use queue::{JobQueue, QueueConfig};
