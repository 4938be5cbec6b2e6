//! Captions tier: download a WebVTT caption track via `yt-dlp` and parse it
//! into raw, un-chunked entries.
//!
//! Emits structured `(start, duration, text)` entries rather than a
//! pre-formatted string so the shared `rechunk` policy can consume either
//! tier uniformly.

use std::path::Path;

use regex::Regex;
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::error::{TranscribeError, TranscribeResult};
use crate::rechunk::CaptionEntry;

fn cue_timestamp_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^((?:\d{2}:)?\d{2}:\d{2}\.\d{3})\s*-->\s*((?:\d{2}:)?\d{2}:\d{2}\.\d{3})").unwrap())
}

fn tag_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

/// Download the English auto/manual caption track for `video_url` into a
/// scoped temp directory (guaranteed cleanup on every exit path) and parse
/// it. `window` applies a download-range filter for batch re-transcription
/// of a sub-range.
pub async fn fetch_captions(video_url: &str, window: Option<(f64, f64)>) -> TranscribeResult<Vec<CaptionEntry>> {
    let workdir = tempfile::tempdir()?;
    let result = fetch_captions_into(video_url, window, workdir.path()).await;
    // `workdir` (and everything yt-dlp wrote into it) is removed here
    // regardless of which branch above returned.
    result
}

async fn fetch_captions_into(video_url: &str, window: Option<(f64, f64)>, workdir: &Path) -> TranscribeResult<Vec<CaptionEntry>> {
    info!(url = %video_url, "fetching captions via yt-dlp");

    let output_template = workdir.join("%(id)s");
    let output_template_str = output_template.to_string_lossy().to_string();
    let section = window.map(|(start, end)| format!("*{start}-{end}"));

    let mut args = vec![
        "--write-auto-sub".to_string(),
        "--write-sub".to_string(),
        "--sub-lang".to_string(),
        "en,en-US,en-GB".to_string(),
        "--skip-download".to_string(),
        "--sub-format".to_string(),
        "vtt".to_string(),
        "--output".to_string(),
        output_template_str,
    ];
    if let Some(section) = &section {
        args.push("--download-sections".to_string());
        args.push(section.clone());
    }
    args.push(video_url.to_string());

    let output = tokio::process::Command::new("yt-dlp").args(&args).output().await.map_err(|e| {
        warn!(error = %e, "failed to spawn yt-dlp");
        TranscribeError::CaptionsDisabled
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(error = %stderr.trim(), "yt-dlp caption download failed");
        return Err(TranscribeError::CaptionsDisabled);
    }

    let mut vtt_files: Vec<_> = std::fs::read_dir(workdir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().and_then(|s| s.to_str()) == Some("vtt"))
        .collect();

    if vtt_files.is_empty() {
        return Err(TranscribeError::NoTranscriptFound);
    }

    vtt_files.sort_by_key(|entry| if entry.file_name().to_string_lossy().contains(".en") { 0 } else { 1 });

    let content = std::fs::read_to_string(vtt_files[0].path())?;
    let entries = parse_vtt(&content);
    if entries.is_empty() {
        return Err(TranscribeError::NoTranscriptFound);
    }
    Ok(entries)
}

/// Parse WebVTT cues into `(start, duration, text)` entries, de-duplicating
/// the rolling-caption repeats auto-generated tracks emit.
fn parse_vtt(content: &str) -> Vec<CaptionEntry> {
    let mut entries = Vec::new();
    let mut lines = content.lines().peekable();
    let mut last_text = String::new();

    while let Some(line) = lines.next() {
        let line = line.trim();
        if let Some(caps) = cue_timestamp_pattern().captures(line) {
            let start = parse_vtt_timestamp(&caps[1]);
            let end = parse_vtt_timestamp(&caps[2]);

            let mut text_lines = Vec::new();
            while let Some(next) = lines.peek() {
                if next.trim().is_empty() {
                    break;
                }
                let cleaned = tag_pattern().replace_all(next.trim(), "").to_string();
                if !cleaned.is_empty() {
                    text_lines.push(cleaned);
                }
                lines.next();
            }
            let text = text_lines.join(" ");
            if !text.is_empty() && text != last_text {
                entries.push(CaptionEntry { start, duration: (end - start).max(0.0), text: text.clone() });
                last_text = text;
            }
        }
    }

    entries
}

fn parse_vtt_timestamp(raw: &str) -> f64 {
    let normalized = if raw.matches(':').count() == 1 { format!("00:{raw}") } else { raw.to_string() };
    let parts: Vec<&str> = normalized.split(':').collect();
    if parts.len() != 3 {
        return 0.0;
    }
    let hours: f64 = parts[0].parse().unwrap_or(0.0);
    let minutes: f64 = parts[1].parse().unwrap_or(0.0);
    let seconds: f64 = parts[2].parse().unwrap_or(0.0);
    hours * 3600.0 + minutes * 60.0 + seconds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_timestamp_with_hours() {
        assert_eq!(parse_vtt_timestamp("01:02:03.500"), 3723.5);
    }

    #[test]
    fn parses_timestamp_without_hours() {
        assert_eq!(parse_vtt_timestamp("02:03.500"), 123.5);
    }

    #[test]
    fn parses_cue_blocks_and_dedupes_rolling_captions() {
        let vtt = "WEBVTT\n\n00:00:00.000 --> 00:00:02.000\nhello there\n\n00:00:02.000 --> 00:00:04.000\nhello there\n\n00:00:04.000 --> 00:00:06.000\n<c>general kenobi</c>\n";
        let entries = parse_vtt(vtt);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "hello there");
        assert_eq!(entries[1].text, "general kenobi");
        assert_eq!(entries[1].start, 4.0);
    }
}
