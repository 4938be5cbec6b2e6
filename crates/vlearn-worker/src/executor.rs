//! Job executor: claims `ProcessVideoJob`s from the queue and drives them
//! through the pipeline orchestrator's background half.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use vlearn_core::{FlashcardGenerator, PipelineOrchestrator};
use vlearn_queue::{JobQueue, QueueJob};

use crate::config::WorkerConfig;
use crate::context::ProcessingContext;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;

/// Job executor that processes jobs from the queue.
pub struct JobExecutor {
    config: WorkerConfig,
    queue: Arc<JobQueue>,
    job_semaphore: Arc<Semaphore>,
    shutdown: tokio::sync::watch::Sender<bool>,
    consumer_name: String,
}

impl JobExecutor {
    /// Create a new job executor.
    pub fn new(config: WorkerConfig, queue: JobQueue) -> WorkerResult<Self> {
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let (shutdown, _) = tokio::sync::watch::channel(false);
        let consumer_name = format!("worker-{}", Uuid::new_v4());

        Ok(Self { config, queue: Arc::new(queue), job_semaphore, shutdown, consumer_name })
    }

    /// Start the executor.
    pub async fn run(&self) -> WorkerResult<()> {
        info!("starting job executor '{}' with {} max concurrent jobs", self.consumer_name, self.config.max_concurrent_jobs);

        self.queue.init().await?;
        let ctx = Arc::new(ProcessingContext::new(Arc::clone(&self.queue)).await?);

        let mut shutdown_rx = self.shutdown.subscribe();

        let claim_task = self.spawn_claim_task(Arc::clone(&ctx));

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("shutdown signal received, stopping executor");
                        break;
                    }
                }
                result = self.consume_jobs(&ctx) => {
                    if let Err(e) = result {
                        error!("error consuming jobs: {}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }

        claim_task.abort();

        info!("waiting for in-flight jobs to complete...");
        let _ = tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs()).await;

        info!("job executor stopped");
        Ok(())
    }

    /// Periodically reclaim jobs abandoned by a crashed worker (XPENDING/XCLAIM).
    fn spawn_claim_task(&self, ctx: Arc<ProcessingContext>) -> tokio::task::JoinHandle<()> {
        let queue = Arc::clone(&self.queue);
        let consumer_name = self.consumer_name.clone();
        let semaphore = Arc::clone(&self.job_semaphore);
        let claim_interval = self.config.claim_interval;
        let claim_min_idle_ms = self.config.claim_min_idle.as_millis() as u64;
        let mut shutdown_rx = self.shutdown.subscribe();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(claim_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        match queue.claim_pending(&consumer_name, claim_min_idle_ms, 5).await {
                            Ok(jobs) if !jobs.is_empty() => {
                                info!("claimed {} pending jobs", jobs.len());
                                for (message_id, job) in jobs {
                                    let ctx = Arc::clone(&ctx);
                                    let queue = Arc::clone(&queue);
                                    let Ok(permit) = semaphore.clone().acquire_owned().await else { break };
                                    tokio::spawn(async move {
                                        let _permit = permit;
                                        Self::execute_job(ctx, queue, message_id, job).await;
                                    });
                                }
                            }
                            Ok(_) => {}
                            Err(e) => warn!("failed to claim pending jobs: {}", e),
                        }
                    }
                }
            }
        })
    }

    /// Consume and process new jobs from the queue.
    async fn consume_jobs(&self, ctx: &Arc<ProcessingContext>) -> WorkerResult<()> {
        let available = self.job_semaphore.available_permits();
        if available == 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            return Ok(());
        }

        let jobs = self.queue.consume(&self.consumer_name, 1000, available.min(5)).await?;
        if jobs.is_empty() {
            return Ok(());
        }

        debug!("consumed {} jobs from queue", jobs.len());

        for (message_id, job) in jobs {
            let ctx = Arc::clone(ctx);
            let queue = Arc::clone(&self.queue);
            let permit = self.job_semaphore.clone().acquire_owned().await.map_err(|_| WorkerError::job_failed("semaphore closed"))?;

            tokio::spawn(async move {
                let _permit = permit;
                Self::execute_job(ctx, queue, message_id, job).await;
            });
        }

        Ok(())
    }

    /// Execute a single job with retry and DLQ handling.
    async fn execute_job(ctx: Arc<ProcessingContext>, queue: Arc<JobQueue>, message_id: String, job: QueueJob) {
        let video_id = job.video_id().clone();
        let logger = JobLogger::new(&video_id, "process_video");
        logger.log_start("claimed from queue");

        let heartbeat_task = Self::spawn_heartbeat(Arc::clone(&ctx), video_id.clone());
        let result = Self::process_job(&ctx, &job).await;
        heartbeat_task.abort();

        match result {
            Ok(()) => {
                logger.log_completion("pipeline reached a terminal state");
                if let Err(e) = queue.ack(&message_id).await {
                    error!(video_id = %video_id, error = %e, "failed to ack job");
                }
                if let Err(e) = queue.clear_dedup(&job).await {
                    warn!(video_id = %video_id, error = %e, "failed to clear dedup key");
                }
            }
            Err(e) => {
                logger.log_error(&e.to_string());

                let retry_count = queue.increment_retry(&message_id).await.unwrap_or(u32::MAX);
                let max_retries = queue.max_retries();

                if !e.is_retryable() || retry_count >= max_retries {
                    warn!(video_id = %video_id, retry_count, max_retries, "moving job to DLQ");
                    if let Err(dlq_err) = queue.dlq(&message_id, &job, &e.to_string()).await {
                        error!(video_id = %video_id, error = %dlq_err, "failed to move job to DLQ");
                    }
                    if let Err(e) = queue.clear_dedup(&job).await {
                        warn!(video_id = %video_id, error = %e, "failed to clear dedup key");
                    }
                    let _ = ctx.progress.error(&video_id, format!("job failed after {retry_count} attempts: {e}")).await;
                } else {
                    info!(video_id = %video_id, retry_count, max_retries, "job will be retried");
                }
            }
        }
    }

    /// Refresh this job's `vlearn:heartbeat:{video_id}` key while in flight,
    /// so the claim-scan above doesn't reclaim work that's still running.
    fn spawn_heartbeat(ctx: Arc<ProcessingContext>, video_id: vlearn_models::VideoId) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(30));
            loop {
                interval.tick().await;
                let _ = ctx.progress.heartbeat(&video_id).await;
            }
        })
    }

    /// Wait for all in-flight jobs to complete.
    async fn wait_for_jobs(&self) {
        loop {
            if self.job_semaphore.available_permits() == self.config.max_concurrent_jobs {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    async fn process_job(ctx: &Arc<ProcessingContext>, job: &QueueJob) -> WorkerResult<()> {
        let QueueJob::ProcessVideo(process_job) = job;

        if process_job.video_url.trim().is_empty() {
            return Err(WorkerError::job_failed(format!("ProcessVideoJob for {} has an empty video URL", process_job.video_id)));
        }

        let store = ctx.store();
        let orchestrator = PipelineOrchestrator::new(&store, &ctx.queue, &ctx.intake_config, &ctx.pipeline_config)
            .with_progress(&ctx.progress);
        let flashcards = FlashcardGenerator::new(&store, &ctx.llm);

        orchestrator.run_background(process_job, &flashcards).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vlearn_queue::{JobQueue, QueueConfig};

    #[test]
    fn new_sizes_the_semaphore_to_max_concurrent_jobs() {
        let config = WorkerConfig {
            max_concurrent_jobs: 3,
            ..WorkerConfig::default()
        };
        let queue = JobQueue::new(QueueConfig::default()).expect("queue client should open lazily");
        let executor = JobExecutor::new(config, queue).expect("executor construction is infallible");
        assert_eq!(executor.job_semaphore.available_permits(), 3);
        assert!(executor.consumer_name.starts_with("worker-"));
    }

    #[test]
    fn shutdown_flips_the_watch_channel() {
        let config = WorkerConfig::default();
        let queue = JobQueue::new(QueueConfig::default()).expect("queue client should open lazily");
        let executor = JobExecutor::new(config, queue).expect("executor construction is infallible");
        let mut rx = executor.shutdown.subscribe();
        assert!(!*rx.borrow());
        executor.shutdown();
        assert!(rx.has_changed().unwrap());
    }
}
