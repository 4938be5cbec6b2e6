//! Canonical video id extraction (§4.1).

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

use vlearn_models::VideoId;

use crate::error::{TranscribeError, TranscribeResult};

fn id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-zA-Z0-9_-]{11}").unwrap())
}

/// Parse a canonical video id out of any supported YouTube URL shape, or
/// hash the URL for non-YouTube sources. Shorts URLs are rejected (they are
/// a distinct product surface the pipeline does not ingest).
pub fn canonical_id(raw_url: &str) -> TranscribeResult<VideoId> {
    let trimmed = raw_url.trim();
    if trimmed.is_empty() {
        return Err(TranscribeError::UnrecognizedUrl(raw_url.to_string()));
    }

    if trimmed.contains("youtube.com/shorts/") {
        return Err(TranscribeError::UnrecognizedUrl(raw_url.to_string()));
    }

    if let Some(id) = extract_youtube_id(trimmed) {
        return Ok(VideoId::from(id));
    }

    Ok(VideoId::from(hash_url(trimmed)))
}

fn extract_youtube_id(url: &str) -> Option<String> {
    if url.contains("youtube.com/watch") || url.contains("music.youtube.com/watch") || url.contains("gaming.youtube.com/watch") || url.contains("m.youtube.com/watch") {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(id) = parsed.query_pairs().find(|(k, _)| k == "v").map(|(_, v)| v.to_string()) {
                return Some(id);
            }
        }
    }

    for marker in ["youtu.be/", "youtube.com/embed/", "youtube.com/v/", "youtube.com/live/"] {
        if let Some(pos) = url.find(marker) {
            let rest = &url[pos + marker.len()..];
            if let Some(m) = id_pattern().find(rest) {
                return Some(m.as_str().to_string());
            }
        }
    }

    // Fallback: any bare 11-char id-looking token in the URL.
    id_pattern().find(url).map(|m| m.as_str().to_string())
}

/// Stable, non-cryptographic content hash used as a video id for
/// non-YouTube sources. Deliberately not collision-resistant in the
/// cryptographic sense — it only needs to be stable per URL.
fn hash_url(url: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_watch_url() {
        assert_eq!(canonical_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap().as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn parses_short_url() {
        assert_eq!(canonical_id("https://youtu.be/dQw4w9WgXcQ").unwrap().as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn parses_embed_url() {
        assert_eq!(canonical_id("https://www.youtube.com/embed/dQw4w9WgXcQ").unwrap().as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn parses_live_url() {
        assert_eq!(canonical_id("https://www.youtube.com/live/dQw4w9WgXcQ").unwrap().as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn parses_music_and_gaming_urls() {
        assert_eq!(canonical_id("https://music.youtube.com/watch?v=dQw4w9WgXcQ").unwrap().as_str(), "dQw4w9WgXcQ");
        assert_eq!(canonical_id("https://gaming.youtube.com/watch?v=dQw4w9WgXcQ").unwrap().as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn rejects_shorts_url() {
        assert!(canonical_id("https://www.youtube.com/shorts/dQw4w9WgXcQ").is_err());
    }

    #[test]
    fn falls_back_to_hash_for_non_youtube_source() {
        let id = canonical_id("https://vimeo.com/12345678").unwrap();
        assert_eq!(id.as_str().len(), 16);
        // deterministic across calls
        assert_eq!(id, canonical_id("https://vimeo.com/12345678").unwrap());
    }
}
