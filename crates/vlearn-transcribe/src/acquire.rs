//! Tiered transcript acquisition (§4.2): captions first, speech-to-text on
//! any captions-stage failure, both re-chunked by the same policy.

use tracing::{info, warn};
use vlearn_models::Transcript;

use crate::captions;
use crate::config::IntakeConfig;
use crate::error::{TranscribeError, TranscribeResult};
use crate::rechunk::rechunk;
use crate::speech_to_text::{SpeechToTextClient, SpeechToTextConfig};

/// `window` is `Some((start, end))` when this call is transcribing one
/// batch window of a longer video; segments are rebased onto absolute
/// video time by adding `start` as an offset once re-chunked.
pub async fn transcribe(video_url: &str, config: &IntakeConfig, window: Option<(f64, f64)>) -> TranscribeResult<Transcript> {
    let offset = window.map(|(start, _)| start).unwrap_or(0.0);
    let duration = window.map(|(start, end)| end - start).unwrap_or(0.0);

    let entries = match captions::fetch_captions(video_url, window).await {
        Ok(entries) => entries,
        Err(captions_err) => {
            warn!(error = %captions_err, "captions tier failed, falling back to speech-to-text");
            let stt_config = SpeechToTextConfig::from_env()
                .map_err(|_| TranscribeError::TranscriptionFailed(format!("captions failed ({captions_err}) and no speech-to-text fallback is configured")))?;
            let client = SpeechToTextClient::new(stt_config);
            client.transcribe(video_url, window).await.map_err(|stt_err| {
                TranscribeError::TranscriptionFailed(format!("captions: {captions_err}; speech-to-text: {stt_err}"))
            })?
        }
    };

    let mut segments = rechunk(&entries, config.segment_target_secs);
    if offset != 0.0 {
        segments = segments.into_iter().map(|s| s.with_offset(offset)).collect();
    }

    let total_duration = if duration > 0.0 { offset + duration } else { segments.last().map(|s| s.end_time).unwrap_or(0.0) };

    info!(segment_count = segments.len(), "transcription tier produced segments");
    Ok(Transcript::new(segments, total_duration))
}
