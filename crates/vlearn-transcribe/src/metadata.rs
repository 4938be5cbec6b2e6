//! Metadata fetch and validation (§4.1).

use tracing::{info, warn};

use crate::config::IntakeConfig;
use crate::error::{TranscribeError, TranscribeResult};

#[derive(Debug, Clone, Default)]
pub struct VideoMetadata {
    pub title: String,
    pub duration: Option<f64>,
    pub language: Option<String>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
}

/// Shell out to `yt-dlp` for title/duration/language/thumbnail/description,
/// off the request thread, via a single non-streaming `--print` invocation.
pub async fn fetch_metadata(video_url: &str) -> TranscribeResult<VideoMetadata> {
    info!(url = %video_url, "fetching video metadata via yt-dlp");

    let output = tokio::process::Command::new("yt-dlp")
        .args([
            "--print",
            "title",
            "--print",
            "duration",
            "--print",
            "language",
            "--print",
            "thumbnail",
            "--print",
            "description",
            "--no-download",
            "--no-playlist",
            video_url,
        ])
        .output()
        .await
        .map_err(|e| TranscribeError::MetadataFetchFailed(format!("failed to spawn yt-dlp: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TranscribeError::MetadataFetchFailed(stderr.trim().to_string()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();

    let title = lines.next().unwrap_or_default().trim().to_string();
    let duration = lines.next().and_then(|l| l.trim().parse::<f64>().ok());
    let language = non_empty(lines.next());
    let thumbnail = non_empty(lines.next());
    let description = non_empty(lines.next());

    if title.is_empty() {
        return Err(TranscribeError::MetadataFetchFailed("yt-dlp returned an empty title".to_string()));
    }

    Ok(VideoMetadata { title, duration, language, thumbnail, description })
}

fn non_empty(line: Option<&str>) -> Option<String> {
    line.map(str::trim).filter(|s| !s.is_empty() && *s != "NA").map(str::to_string)
}

/// Duration and two-stage language validation. The metadata-language check
/// is a weak signal (often absent); captions availability is authoritative
/// when present.
pub fn validate(metadata: &VideoMetadata, has_english_captions: bool, config: &IntakeConfig) -> TranscribeResult<()> {
    let duration = metadata.duration.ok_or(TranscribeError::UnknownDuration)?;

    if duration > config.max_video_duration_secs {
        warn!(duration, max = config.max_video_duration_secs, "video duration exceeds limit");
        return Err(TranscribeError::DurationExceeded { actual: duration, max: config.max_video_duration_secs });
    }

    match &metadata.language {
        None => {
            info!("no metadata language reported, deferring to captions-track check");
        }
        Some(lang) if lang.to_lowercase().starts_with("en") => {}
        Some(lang) => {
            warn!(language = %lang, "video language not supported");
            return Err(TranscribeError::UnsupportedLanguage(lang.clone()));
        }
    }

    if !has_english_captions && metadata.language.as_deref().map(|l| !l.to_lowercase().starts_with("en")).unwrap_or(false) {
        return Err(TranscribeError::UnsupportedLanguage(metadata.language.clone().unwrap_or_default()));
    }
    if !has_english_captions && metadata.language.is_none() {
        info!("no English captions track and no metadata language; allowing provisionally pending post-transcription check");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(duration: f64, language: Option<&str>) -> VideoMetadata {
        VideoMetadata { title: "t".to_string(), duration: Some(duration), language: language.map(str::to_string), thumbnail: None, description: None }
    }

    #[test]
    fn accepts_english_video_within_duration() {
        assert!(validate(&meta(300.0, Some("en")), true, &IntakeConfig::default()).is_ok());
    }

    #[test]
    fn rejects_duration_over_limit() {
        let config = IntakeConfig { max_video_duration_secs: 100.0, ..IntakeConfig::default() };
        assert!(matches!(validate(&meta(300.0, Some("en")), true, &config), Err(TranscribeError::DurationExceeded { .. })));
    }

    #[test]
    fn rejects_non_english_metadata_language() {
        assert!(matches!(validate(&meta(300.0, Some("fr")), true, &IntakeConfig::default()), Err(TranscribeError::UnsupportedLanguage(_))));
    }

    #[test]
    fn missing_metadata_language_defers_to_captions_check() {
        assert!(validate(&meta(300.0, None), true, &IntakeConfig::default()).is_ok());
    }

    #[test]
    fn missing_duration_is_rejected() {
        let metadata = VideoMetadata { title: "t".to_string(), duration: None, language: None, thumbnail: None, description: None };
        assert!(matches!(validate(&metadata, true, &IntakeConfig::default()), Err(TranscribeError::UnknownDuration)));
    }
}
