//! Batch transcript processor (§4.3).
//!
//! Videos at or under [`PipelineConfig::batch_threshold_secs`] go through
//! `vlearn_transcribe::transcribe` in one call. Longer videos are split into
//! half-open windows `[0, T), [T, 2T), ...` of the same length, each
//! transcribed independently and its flashcards persisted immediately, so a
//! long video's learner-visible artifacts arrive incrementally rather than
//! only once the whole thing finishes.

use tracing::info;

use vlearn_models::{ProcessingStatus, Transcript, TranscriptSegment, VideoId};
use vlearn_queue::ProgressChannel;
use vlearn_transcribe::IntakeConfig;

use crate::config::PipelineConfig;
use crate::error::CoreResult;
use crate::flashcards::FlashcardGenerator;
use crate::store::Store;

pub struct BatchProcessor<'a> {
    store: &'a Store,
    intake_config: &'a IntakeConfig,
    pipeline_config: &'a PipelineConfig,
    flashcards: &'a FlashcardGenerator<'a>,
    progress: Option<&'a ProgressChannel>,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(
        store: &'a Store,
        intake_config: &'a IntakeConfig,
        pipeline_config: &'a PipelineConfig,
        flashcards: &'a FlashcardGenerator<'a>,
    ) -> Self {
        Self { store, intake_config, pipeline_config, flashcards, progress: None }
    }

    /// Attach a progress channel so each phase transition and batch step is
    /// also published to Redis Pub/Sub, for callers polling or streaming
    /// `GET /api/video/{id}/status` while a job is in flight.
    pub fn with_progress(mut self, progress: &'a ProgressChannel) -> Self {
        self.progress = Some(progress);
        self
    }

    async fn publish_status(&self, video_id: &VideoId, status: ProcessingStatus) {
        if let Some(progress) = self.progress {
            let _ = progress.status(video_id, status).await;
        }
    }

    async fn publish_batch(&self, video_id: &VideoId, current: u32, total: u32) {
        if let Some(progress) = self.progress {
            let _ = progress.batch(video_id, current, total).await;
        }
    }

    /// Compute the half-open window boundaries for a video of `duration`
    /// seconds at the configured threshold. Returns a single `(0, duration)`
    /// window when at or under the threshold.
    pub fn windows(&self, duration: f64) -> Vec<(f64, f64)> {
        windows_for(self.pipeline_config, duration)
    }

    /// Drive one video from its initial `Processing` status through to
    /// `Completed`, transcribing window by window and persisting flashcards
    /// after each, then finalizing the full transcript.
    pub async fn run(&self, video_id: &VideoId, source_url: &str, duration: f64) -> CoreResult<Transcript> {
        let windows = self.windows(duration);
        let total = windows.len() as u32;

        if total == 1 {
            self.store.videos.update_status(video_id, ProcessingStatus::Transcribing).await?;
            self.publish_status(video_id, ProcessingStatus::Transcribing).await;
            let transcript = vlearn_transcribe::transcribe(source_url, self.intake_config, None).await?;
            self.store.videos.update_status(video_id, ProcessingStatus::GeneratingFlashcards).await?;
            self.publish_status(video_id, ProcessingStatus::GeneratingFlashcards).await;
            self.flashcards.generate_and_persist(video_id, &transcript.segments).await?;
            self.store.videos.complete(video_id, &transcript).await?;
            if let Some(progress) = self.progress {
                let _ = progress.done(video_id).await;
            }
            return Ok(transcript);
        }

        info!(video_id = %video_id, batch_total = total, "video exceeds batch threshold, processing in windows");

        let mut all_segments: Vec<TranscriptSegment> = Vec::new();
        for (i, (start, end)) in windows.iter().enumerate() {
            let batch_current = (i + 1) as u32;

            self.store
                .videos
                .update_batch_progress(video_id, ProcessingStatus::TranscribingBatch, batch_current, total)
                .await?;
            self.publish_batch(video_id, batch_current, total).await;
            let batch_transcript =
                vlearn_transcribe::transcribe(source_url, self.intake_config, Some((*start, *end))).await?;

            self.store
                .videos
                .update_batch_progress(video_id, ProcessingStatus::GeneratingFlashcardsBatch, batch_current, total)
                .await?;
            self.publish_status(video_id, ProcessingStatus::GeneratingFlashcardsBatch).await;
            self.flashcards.generate_and_persist(video_id, &batch_transcript.segments).await?;

            all_segments.extend(batch_transcript.segments);
        }

        let full_transcript = Transcript::new(all_segments, duration);
        self.store.videos.complete(video_id, &full_transcript).await?;
        if let Some(progress) = self.progress {
            let _ = progress.done(video_id).await;
        }
        info!(video_id = %video_id, "all batches complete, transcript finalized");
        Ok(full_transcript)
    }
}

/// Pure windowing logic, split out so it's testable without a `Store`.
fn windows_for(cfg: &PipelineConfig, duration: f64) -> Vec<(f64, f64)> {
    if duration <= cfg.batch_threshold_secs {
        return vec![(0.0, duration)];
    }
    let step = cfg.batch_threshold_secs;
    let mut out = Vec::new();
    let mut start = 0.0;
    while start < duration {
        let end = (start + step).min(duration);
        out.push((start, end));
        start = end;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(threshold: f64) -> PipelineConfig {
        PipelineConfig { batch_threshold_secs: threshold, ..PipelineConfig::default() }
    }

    #[test]
    fn windows_split_on_half_open_boundaries() {
        let cfg = config(600.0);
        let windows = windows_for(&cfg, 1500.0);
        assert_eq!(windows, vec![(0.0, 600.0), (600.0, 1200.0), (1200.0, 1500.0)]);
    }

    #[test]
    fn exact_multiple_has_no_trailing_short_window() {
        let cfg = config(600.0);
        let windows = windows_for(&cfg, 1200.0);
        assert_eq!(windows, vec![(0.0, 600.0), (600.0, 1200.0)]);
    }

    #[test]
    fn under_threshold_is_one_window() {
        let cfg = config(600.0);
        assert_eq!(windows_for(&cfg, 300.0), vec![(0.0, 300.0)]);
    }
}
