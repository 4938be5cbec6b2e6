//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("job failed: {0}")]
    JobFailed(String),

    #[error(transparent)]
    Core(#[from] vlearn_core::CoreError),

    #[error("queue error: {0}")]
    Queue(#[from] vlearn_queue::QueueError),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    /// Whether the job should be redelivered instead of moved to the DLQ.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Core(e) => e.is_retryable(),
            WorkerError::Queue(_) => true,
            WorkerError::JobFailed(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vlearn_core::CoreError;

    #[test]
    fn job_failed_is_never_retryable() {
        let err = WorkerError::job_failed("malformed job payload");
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "job failed: malformed job payload");
    }

    #[test]
    fn core_dependency_failure_is_retryable() {
        let err = WorkerError::Core(CoreError::DependencyFailure("firestore timeout".to_string()));
        assert!(err.is_retryable());
    }

    #[test]
    fn core_insufficient_credits_is_not_retryable() {
        let err = WorkerError::Core(CoreError::InsufficientCredits {
            required: 10,
            available: 2,
        });
        assert!(!err.is_retryable());
    }

    #[test]
    fn queue_errors_are_always_retryable() {
        let err = WorkerError::Queue(vlearn_queue::QueueError::enqueue_failed("redis down"));
        assert!(err.is_retryable());
    }
}
