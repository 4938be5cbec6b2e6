//! Structured job logging utilities.
//!
//! Provides consistent, structured logging for job processing with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};
use vlearn_models::VideoId;

/// Job logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct JobLogger {
    video_id: String,
    operation: String,
}

impl JobLogger {
    /// Create a new job logger for a specific video and operation.
    pub fn new(video_id: &VideoId, operation: &str) -> Self {
        Self { video_id: video_id.to_string(), operation: operation.to_string() }
    }

    /// Log the start of a job operation.
    pub fn log_start(&self, message: &str) {
        info!(video_id = %self.video_id, operation = %self.operation, "job started: {}", message);
    }

    /// Log a progress update during job execution.
    pub fn log_progress(&self, message: &str) {
        info!(video_id = %self.video_id, operation = %self.operation, "job progress: {}", message);
    }

    /// Log a warning during job execution.
    pub fn log_warning(&self, message: &str) {
        warn!(video_id = %self.video_id, operation = %self.operation, "job warning: {}", message);
    }

    /// Log an error during job execution.
    pub fn log_error(&self, message: &str) {
        error!(video_id = %self.video_id, operation = %self.operation, "job error: {}", message);
    }

    /// Log the completion of a job operation.
    pub fn log_completion(&self, message: &str) {
        info!(video_id = %self.video_id, operation = %self.operation, "job completed: {}", message);
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("job", video_id = %self.video_id, operation = %self.operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_logger_tracks_video_and_operation() {
        let video_id = VideoId::from("dQw4w9WgXcQ");
        let logger = JobLogger::new(&video_id, "process_video");

        assert_eq!(logger.video_id(), video_id.to_string());
        assert_eq!(logger.operation(), "process_video");
    }
}
