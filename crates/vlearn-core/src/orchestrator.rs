//! Pipeline orchestrator (§4.8): ties intake, credit gating, queueing, and
//! the synchronous quiz/notes/report generators into the operations the API
//! surface calls directly.
//!
//! `submit` is the synchronous half: validate, canonicalize, credit-gate,
//! create the video record, enqueue the background job, and return
//! immediately. `run_background` is the half the worker drives once it
//! claims the job: batch transcription plus flashcard generation through to
//! `Completed` or `Failed`.

use tracing::{error, info};

use vlearn_models::{CreditContext, CreditType, ProcessingStatus, ProjectId, ProjectVideoLink, User, UserId, Video, VideoId};
use vlearn_queue::{JobQueue, ProcessVideoJob, ProgressChannel};
use vlearn_transcribe::IntakeConfig;

use crate::batch::BatchProcessor;
use crate::config::PipelineConfig;
use crate::credit::CreditLedger;
use crate::error::{CoreError, CoreResult};
use crate::flashcards::FlashcardGenerator;
use crate::store::Store;

pub struct PipelineOrchestrator<'a> {
    store: &'a Store,
    queue: &'a JobQueue,
    intake_config: &'a IntakeConfig,
    pipeline_config: &'a PipelineConfig,
    progress: Option<&'a ProgressChannel>,
}

/// What the API returns immediately after a successful submission; mirrors
/// the `GET /api/video/{id}/status` shape minus the fields only meaningful
/// once work has started.
pub struct SubmissionResult {
    pub video_id: VideoId,
    pub already_processing: bool,
}

impl<'a> PipelineOrchestrator<'a> {
    pub fn new(store: &'a Store, queue: &'a JobQueue, intake_config: &'a IntakeConfig, pipeline_config: &'a PipelineConfig) -> Self {
        Self { store, queue, intake_config, pipeline_config, progress: None }
    }

    pub fn with_progress(mut self, progress: &'a ProgressChannel) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Synchronous half of `process_video_async` (§4.8, 6-step sequence):
    /// canonicalize -> idempotent-resubmission check -> fetch metadata ->
    /// validate -> credit gate + deduct -> create video record + enqueue.
    pub async fn submit(
        &self,
        user_id: &UserId,
        source_url: &str,
        title: Option<&str>,
        project_id: Option<ProjectId>,
    ) -> CoreResult<SubmissionResult> {
        let video_id = vlearn_transcribe::canonical_id(source_url)?;

        if let Some(existing) = self.store.videos.get(&video_id).await? {
            if !existing.processing_status.is_terminal() {
                info!(video_id = %video_id, "resubmission of a video already in flight, returning existing job");
                return Ok(SubmissionResult { video_id, already_processing: true });
            }
            if existing.processing_status == ProcessingStatus::Completed {
                info!(video_id = %video_id, "video already completed, returning existing record");
                return Ok(SubmissionResult { video_id, already_processing: false });
            }
            // Failed: fall through and resubmit as a fresh attempt.
        }

        let metadata = vlearn_transcribe::fetch_metadata(source_url).await?;
        let has_captions = vlearn_transcribe::captions::fetch_captions(source_url, None).await.is_ok();
        vlearn_transcribe::validate(&metadata, has_captions, self.intake_config)?;
        let duration = metadata.duration.ok_or(CoreError::MetadataUnavailable("duration unknown".to_string()))?;
        let title = title.filter(|t| !t.is_empty()).unwrap_or(&metadata.title);

        // Gate only: actual deduction happens post-success in
        // `run_background`, so a failed or abandoned job never costs the
        // user a credit (§4.8, §7 propagation policy).
        let user = self.get_user_or_not_found(user_id).await?;
        let required = self.pipeline_config.transcription_cost(duration);
        let ledger = CreditLedger::new(&self.store.users, &self.store.credit_history);
        let (has_enough, available) = ledger.has_credits(&user, CreditType::Transcription, required);
        if !has_enough {
            return Err(CoreError::InsufficientCredits { required, available });
        }

        let video = Video::new(video_id.clone(), title, duration, source_url);
        self.store.videos.create(&video).await?;

        if let Some(project_id) = &project_id {
            let link = ProjectVideoLink::new(project_id.clone(), video_id.clone());
            self.store.project_links.link(&link).await?;
        }

        let job = ProcessVideoJob::new(video_id.clone(), source_url, title)
            .with_user(Some(user_id.clone()))
            .with_project(project_id);
        self.queue.enqueue_process(job).await?;

        Ok(SubmissionResult { video_id, already_processing: false })
    }

    /// Background half, run by the worker once it claims a `ProcessVideoJob`.
    ///
    /// Transcription credits are deducted here, strictly after the batch
    /// processor reaches `Completed`, so a `failed` video never shows a
    /// deduction and a retried job never double-charges: the credit-history
    /// row only exists once processing has actually succeeded.
    pub async fn run_background(&self, job: &ProcessVideoJob, flashcards: &FlashcardGenerator<'_>) -> CoreResult<()> {
        let duration = self.video_duration(&job.video_id).await?;
        let mut batch = BatchProcessor::new(self.store, self.intake_config, self.pipeline_config, flashcards);
        if let Some(progress) = self.progress {
            batch = batch.with_progress(progress);
        }
        match batch.run(&job.video_id, &job.video_url, duration).await {
            Ok(_) => {
                info!(video_id = %job.video_id, "pipeline completed");
                if let Some(user_id) = &job.user_id {
                    self.deduct_transcription_credits(user_id, &job.video_id, job.project_id.as_ref(), duration).await?;
                }
                Ok(())
            }
            Err(e) => {
                error!(video_id = %job.video_id, error = %e, "pipeline failed");
                self.store.videos.fail(&job.video_id, &e.to_string()).await?;
                if let Some(progress) = self.progress {
                    let _ = progress.error(&job.video_id, e.to_string()).await;
                }
                Err(e)
            }
        }
    }

    async fn deduct_transcription_credits(
        &self,
        user_id: &UserId,
        video_id: &VideoId,
        project_id: Option<&ProjectId>,
        duration: f64,
    ) -> CoreResult<()> {
        let required = self.pipeline_config.transcription_cost(duration);
        if required == 0 {
            return Ok(());
        }
        let ledger = CreditLedger::new(&self.store.users, &self.store.credit_history);
        let context = CreditContext::new(format!("transcription of {duration}s video")).with_video_id(video_id.clone());
        let context = if let Some(pid) = project_id { context.with_project_id(pid.clone()) } else { context };
        ledger.deduct(user_id, CreditType::Transcription, required, context).await
    }

    async fn video_duration(&self, video_id: &VideoId) -> CoreResult<f64> {
        let video = self.store.videos.get(video_id).await?.ok_or_else(|| CoreError::NotFound(video_id.to_string()))?;
        Ok(video.duration)
    }

    async fn get_user_or_not_found(&self, user_id: &UserId) -> CoreResult<User> {
        self.store.users.get(user_id).await?.ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))
    }

    /// Delete a video. If it is linked from any project, unlink this caller's
    /// project only, leaving the video (and its artifacts) intact for anyone
    /// else who references it; only when no project links remain does the
    /// video and its subcollections get removed (§4.8, §9: junction is
    /// authoritative).
    pub async fn delete_video(&self, video_id: &VideoId, project_id: Option<&ProjectId>) -> CoreResult<()> {
        if let Some(project_id) = project_id {
            self.store.project_links.unlink(project_id, video_id).await?;
        }

        if self.store.project_links.has_any_links(video_id).await? {
            info!(video_id = %video_id, "video still referenced by other projects, skipping cascade delete");
            return Ok(());
        }

        self.store.videos.delete(video_id).await?;
        info!(video_id = %video_id, "video had no remaining project links, deleted");
        Ok(())
    }
}
