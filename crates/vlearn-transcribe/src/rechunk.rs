//! Shared 120-second walking-accumulator re-chunking policy (§4.2/§4.3),
//! used identically whether the raw entries came from captions or
//! speech-to-text.

use vlearn_models::TranscriptSegment;

/// A single raw, un-chunked caption or speech-to-text entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionEntry {
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

impl CaptionEntry {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Walk `entries` accumulating text until the running duration crosses
/// `target_secs`, then emit a segment spanning from the chunk's first entry
/// start to the triggering entry's end. Any remainder becomes a final,
/// possibly shorter, segment.
pub fn rechunk(entries: &[CaptionEntry], target_secs: f64) -> Vec<TranscriptSegment> {
    if entries.is_empty() {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut chunk_start = entries[0].start;

    for (i, entry) in entries.iter().enumerate() {
        buffer.push(entry.text.as_str());
        let chunk_duration = entry.end() - chunk_start;

        if chunk_duration >= target_secs {
            segments.push(TranscriptSegment::new(chunk_start, entry.end(), buffer.join(" ")));
            buffer.clear();
            if let Some(next) = entries.get(i + 1) {
                chunk_start = next.start;
            }
        }
    }

    if !buffer.is_empty() {
        let last = entries.last().unwrap();
        segments.push(TranscriptSegment::new(chunk_start, last.end(), buffer.join(" ")));
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(start: f64, duration: f64, text: &str) -> CaptionEntry {
        CaptionEntry { start, duration, text: text.to_string() }
    }

    #[test]
    fn groups_entries_into_target_duration_chunks() {
        let entries = vec![
            entry(0.0, 60.0, "part one"),
            entry(60.0, 65.0, "part two"),
            entry(125.0, 30.0, "part three"),
        ];
        let segments = rechunk(&entries, 120.0);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start_time, 0.0);
        assert_eq!(segments[0].end_time, 125.0);
        assert_eq!(segments[1].start_time, 125.0);
        assert_eq!(segments[1].end_time, 155.0);
    }

    #[test]
    fn empty_input_yields_no_segments() {
        assert!(rechunk(&[], 120.0).is_empty());
    }

    #[test]
    fn single_short_entry_becomes_one_segment() {
        let entries = vec![entry(0.0, 5.0, "hi")];
        let segments = rechunk(&entries, 120.0);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "hi");
    }
}
