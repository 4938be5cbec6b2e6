//! Progress events via Redis Pub/Sub with persistence and heartbeat support.
//!
//! This module provides:
//! - Real-time progress events via Redis Pub/Sub
//! - Persistent progress history via Redis Sorted Sets
//! - Worker heartbeat tracking for stale job detection
//! - Video status caching for fast polling

use chrono::Utc;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use vlearn_models::{ProcessingStatus, VideoId};

use crate::error::QueueResult;

// ============================================================================
// Redis Key Prefixes and TTLs
// ============================================================================

/// Prefix for worker heartbeat keys: `vlearn:heartbeat:{video_id}`
const HEARTBEAT_KEY_PREFIX: &str = "vlearn:heartbeat:";

/// Prefix for progress history sorted sets: `vlearn:progress:history:{video_id}`
const PROGRESS_HISTORY_PREFIX: &str = "vlearn:progress:history:";

/// Prefix for video status cache: `vlearn:video:status:{video_id}`
const VIDEO_STATUS_PREFIX: &str = "vlearn:video:status:";

/// Active jobs sorted set key.
const ACTIVE_JOBS_KEY: &str = "vlearn:jobs:active";

/// Heartbeat TTL - job considered dead after this duration without heartbeat (seconds).
pub const HEARTBEAT_TTL_SECS: u64 = 60;

/// Progress history TTL - keep progress events for recovery (seconds).
pub const PROGRESS_HISTORY_TTL_SECS: u64 = 3600;

/// Video status cache TTL (seconds).
pub const VIDEO_STATUS_TTL_SECS: u64 = 86400;

/// Grace period before marking a job without heartbeat as stale (seconds).
pub const STALE_GRACE_PERIOD_SECS: i64 = 120;

/// Stale threshold - no heartbeat for this long means stale (seconds).
pub const STALE_THRESHOLD_SECS: i64 = 60;

// ============================================================================
// Data Structures
// ============================================================================

/// A single progress message describing one step of the batch pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressMessage {
    /// Status transitioned (e.g. `transcribing` -> `transcribing_batch`).
    Status { status: ProcessingStatus },
    /// A batch within the current phase started or finished.
    Batch { current: u32, total: u32 },
    /// Free-form informational log line.
    Log { message: String },
    /// Terminal success.
    Done,
    /// Terminal failure.
    Error { message: String },
}

/// Progress event published to Redis for a given video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub video_id: VideoId,
    pub message: ProgressMessage,
    #[serde(default = "default_timestamp")]
    pub timestamp_ms: i64,
    #[serde(default)]
    pub seq: u64,
}

fn default_timestamp() -> i64 {
    Utc::now().timestamp_millis()
}

impl ProgressEvent {
    pub fn new(video_id: VideoId, message: ProgressMessage) -> Self {
        Self { video_id, message, timestamp_ms: Utc::now().timestamp_millis(), seq: 0 }
    }

    pub fn with_seq(mut self, seq: u64) -> Self {
        self.seq = seq;
        self
    }
}

/// Cached, pollable snapshot of a video's processing progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoStatusCache {
    pub video_id: VideoId,
    pub status: ProcessingStatus,
    pub batch_current: u32,
    pub batch_total: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub updated_at: chrono::DateTime<Utc>,
    #[serde(default)]
    pub event_seq: u64,
}

impl VideoStatusCache {
    pub fn new(video_id: VideoId) -> Self {
        Self {
            video_id,
            status: ProcessingStatus::Processing,
            batch_current: 0,
            batch_total: 0,
            error_message: None,
            updated_at: Utc::now(),
            event_seq: 0,
        }
    }

    pub fn set_status(&mut self, status: ProcessingStatus) {
        self.status = status;
        self.updated_at = Utc::now();
        self.event_seq += 1;
    }

    pub fn set_batch(&mut self, current: u32, total: u32) {
        self.batch_current = current;
        self.batch_total = total;
        self.updated_at = Utc::now();
        self.event_seq += 1;
    }

    pub fn complete(&mut self) {
        self.status = ProcessingStatus::Completed;
        self.batch_current = 0;
        self.batch_total = 0;
        self.updated_at = Utc::now();
        self.event_seq += 1;
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = ProcessingStatus::Failed;
        self.error_message = Some(error.into());
        self.updated_at = Utc::now();
        self.event_seq += 1;
    }
}

/// Channel for publishing/subscribing to a video's processing progress.
#[derive(Clone)]
pub struct ProgressChannel {
    client: redis::Client,
}

impl ProgressChannel {
    pub fn new(redis_url: &str) -> QueueResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    pub fn channel_name(video_id: &VideoId) -> String {
        format!("vlearn:progress:{}", video_id)
    }

    /// Publish a progress event (Pub/Sub only, no persistence).
    pub async fn publish(&self, event: &ProgressEvent) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let channel = Self::channel_name(&event.video_id);
        let payload = serde_json::to_string(event)?;

        debug!(channel = %channel, "publishing progress event");
        conn.publish::<_, _, ()>(channel, payload).await?;

        Ok(())
    }

    /// Publish a progress event with persistence to history.
    ///
    /// Dual-write: Pub/Sub for real-time delivery, sorted set (scored by
    /// timestamp) for recovery by a client that reconnects mid-job.
    pub async fn publish_with_history(&self, event: &ProgressEvent) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let channel = Self::channel_name(&event.video_id);
        let history_key = format!("{}{}", PROGRESS_HISTORY_PREFIX, event.video_id);
        let payload = serde_json::to_string(event)?;
        let score = event.timestamp_ms as f64;

        redis::pipe()
            .publish(&channel, &payload)
            .ignore()
            .zadd(&history_key, &payload, score)
            .ignore()
            .expire(&history_key, PROGRESS_HISTORY_TTL_SECS as i64)
            .ignore()
            .exec_async(&mut conn)
            .await?;

        Ok(())
    }

    pub async fn status(&self, video_id: &VideoId, status: ProcessingStatus) -> QueueResult<()> {
        self.publish_with_history(&ProgressEvent::new(video_id.clone(), ProgressMessage::Status { status })).await
    }

    pub async fn batch(&self, video_id: &VideoId, current: u32, total: u32) -> QueueResult<()> {
        self.publish_with_history(&ProgressEvent::new(video_id.clone(), ProgressMessage::Batch { current, total })).await
    }

    pub async fn log(&self, video_id: &VideoId, message: impl Into<String>) -> QueueResult<()> {
        self.publish_with_history(&ProgressEvent::new(video_id.clone(), ProgressMessage::Log { message: message.into() })).await
    }

    pub async fn done(&self, video_id: &VideoId) -> QueueResult<()> {
        self.publish_with_history(&ProgressEvent::new(video_id.clone(), ProgressMessage::Done)).await
    }

    pub async fn error(&self, video_id: &VideoId, message: impl Into<String>) -> QueueResult<()> {
        self.publish_with_history(&ProgressEvent::new(video_id.clone(), ProgressMessage::Error { message: message.into() })).await
    }

    /// Subscribe to progress events for a video.
    /// Returns a pinned stream that can be polled with `.next()`.
    pub async fn subscribe(&self, video_id: &VideoId) -> QueueResult<std::pin::Pin<Box<dyn futures_util::Stream<Item = ProgressEvent> + Send>>> {
        use futures_util::StreamExt;

        let mut pubsub = self.client.get_async_pubsub().await?;
        let channel = Self::channel_name(video_id);

        pubsub.subscribe(&channel).await?;

        let stream = pubsub.into_on_message().filter_map(|msg| async move {
            let payload: String = msg.get_payload().ok()?;
            serde_json::from_str(&payload).ok()
        });

        Ok(Box::pin(stream))
    }

    // ========================================================================
    // Heartbeat
    // ========================================================================

    /// Update worker heartbeat for a video's job. Workers call this
    /// periodically during processing; missing the TTL marks the job stale.
    pub async fn heartbeat(&self, video_id: &VideoId) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("{}{}", HEARTBEAT_KEY_PREFIX, video_id);
        let now = Utc::now().timestamp();

        conn.set_ex::<_, _, ()>(&key, now, HEARTBEAT_TTL_SECS).await?;
        Ok(())
    }

    pub async fn is_alive(&self, video_id: &VideoId) -> QueueResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("{}{}", HEARTBEAT_KEY_PREFIX, video_id);
        Ok(conn.exists(&key).await?)
    }

    pub async fn get_last_heartbeat(&self, video_id: &VideoId) -> QueueResult<Option<i64>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("{}{}", HEARTBEAT_KEY_PREFIX, video_id);
        Ok(conn.get(&key).await?)
    }

    pub async fn clear_heartbeat(&self, video_id: &VideoId) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("{}{}", HEARTBEAT_KEY_PREFIX, video_id);
        conn.del::<_, ()>(&key).await?;
        Ok(())
    }

    // ========================================================================
    // Progress History
    // ========================================================================

    pub async fn get_history_since(&self, video_id: &VideoId, since_ms: i64) -> QueueResult<Vec<ProgressEvent>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("{}{}", PROGRESS_HISTORY_PREFIX, video_id);

        let events: Vec<String> = conn.zrangebyscore(&key, since_ms as f64, "+inf").await?;
        Ok(events.into_iter().filter_map(|s| serde_json::from_str(&s).ok()).collect())
    }

    pub async fn get_full_history(&self, video_id: &VideoId) -> QueueResult<Vec<ProgressEvent>> {
        self.get_history_since(video_id, 0).await
    }

    pub async fn get_history_count(&self, video_id: &VideoId) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("{}{}", PROGRESS_HISTORY_PREFIX, video_id);
        Ok(conn.zcard(&key).await?)
    }

    pub async fn clear_history(&self, video_id: &VideoId) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("{}{}", PROGRESS_HISTORY_PREFIX, video_id);
        conn.del::<_, ()>(&key).await?;
        Ok(())
    }

    // ========================================================================
    // Video Status Cache
    // ========================================================================

    pub async fn init_video_status(&self, video_id: &VideoId) -> QueueResult<()> {
        let status = VideoStatusCache::new(video_id.clone());
        self.update_video_status(video_id, &status).await?;
        self.add_to_active_jobs(video_id).await?;
        Ok(())
    }

    pub async fn update_video_status(&self, video_id: &VideoId, status: &VideoStatusCache) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("{}{}", VIDEO_STATUS_PREFIX, video_id);
        let payload = serde_json::to_string(status)?;

        conn.set_ex::<_, _, ()>(&key, payload, VIDEO_STATUS_TTL_SECS).await?;
        Ok(())
    }

    pub async fn get_video_status(&self, video_id: &VideoId) -> QueueResult<Option<VideoStatusCache>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("{}{}", VIDEO_STATUS_PREFIX, video_id);

        let value: Option<String> = conn.get(&key).await?;
        Ok(value.and_then(|s| serde_json::from_str(&s).ok()))
    }

    pub async fn update_batch_progress(&self, video_id: &VideoId, current: u32, total: u32) -> QueueResult<()> {
        if let Some(mut status) = self.get_video_status(video_id).await? {
            status.set_batch(current, total);
            self.update_video_status(video_id, &status).await?;
        }
        Ok(())
    }

    pub async fn complete_video_status(&self, video_id: &VideoId) -> QueueResult<()> {
        if let Some(mut status) = self.get_video_status(video_id).await? {
            status.complete();
            self.update_video_status(video_id, &status).await?;
            self.remove_from_active_jobs(video_id).await?;
            self.clear_heartbeat(video_id).await?;
        }
        Ok(())
    }

    pub async fn fail_video_status(&self, video_id: &VideoId, error: &str) -> QueueResult<()> {
        if let Some(mut status) = self.get_video_status(video_id).await? {
            status.fail(error);
            self.update_video_status(video_id, &status).await?;
            self.remove_from_active_jobs(video_id).await?;
            self.clear_heartbeat(video_id).await?;
        }
        Ok(())
    }

    // ========================================================================
    // Active Jobs Tracking
    // ========================================================================

    async fn add_to_active_jobs(&self, video_id: &VideoId) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let score = Utc::now().timestamp_millis() as f64;
        conn.zadd::<_, _, _, ()>(ACTIVE_JOBS_KEY, video_id.to_string(), score).await?;
        Ok(())
    }

    async fn remove_from_active_jobs(&self, video_id: &VideoId) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.zrem::<_, _, ()>(ACTIVE_JOBS_KEY, video_id.to_string()).await?;
        Ok(())
    }

    /// All currently active jobs, used by the stale job detector.
    pub async fn get_active_jobs(&self) -> QueueResult<Vec<VideoStatusCache>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let video_ids: Vec<String> = conn.zrange(ACTIVE_JOBS_KEY, 0, -1).await?;

        let mut statuses = Vec::with_capacity(video_ids.len());
        for video_id in video_ids {
            if let Some(status) = self.get_video_status(&VideoId::from(video_id)).await? {
                statuses.push(status);
            }
        }

        Ok(statuses)
    }

    pub async fn get_active_job_count(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn.zcard(ACTIVE_JOBS_KEY).await?)
    }

    /// Remove active-job entries whose status cache has expired.
    pub async fn cleanup_active_jobs(&self) -> QueueResult<u32> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let video_ids: Vec<String> = conn.zrange(ACTIVE_JOBS_KEY, 0, -1).await?;

        let mut removed = 0u32;
        for video_id in video_ids {
            let key = format!("{}{}", VIDEO_STATUS_PREFIX, video_id);
            let exists: bool = conn.exists(&key).await?;
            if !exists {
                conn.zrem::<_, _, ()>(ACTIVE_JOBS_KEY, &video_id).await?;
                removed += 1;
                warn!(video_id = %video_id, "cleaned up orphaned active job");
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_status_cache_tracks_event_seq() {
        let mut status = VideoStatusCache::new(VideoId::from("abc12345678"));
        assert_eq!(status.event_seq, 0);
        status.set_status(ProcessingStatus::Transcribing);
        assert_eq!(status.event_seq, 1);
        status.set_batch(2, 5);
        assert_eq!(status.event_seq, 2);
        assert_eq!(status.batch_current, 2);
        assert_eq!(status.batch_total, 5);
    }

    #[test]
    fn progress_event_serde_roundtrip() {
        let event = ProgressEvent::new(VideoId::from("abc12345678"), ProgressMessage::Done);
        let json = serde_json::to_string(&event).expect("serialize");
        let decoded: ProgressEvent = serde_json::from_str(&json).expect("deserialize");
        assert!(matches!(decoded.message, ProgressMessage::Done));
    }
}
