//! Time-aligned transcript types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A contiguous slice of a transcript, approximately `flashcard_interval`
/// seconds long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranscriptSegment {
    /// Absolute start time in seconds from the start of the video.
    pub start_time: f64,
    /// Absolute end time in seconds from the start of the video.
    pub end_time: f64,
    /// Spoken text covered by this segment.
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start_time: f64, end_time: f64, text: impl Into<String>) -> Self {
        Self {
            start_time,
            end_time,
            text: text.into(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Shift both timestamps by `offset` seconds. Used to rebase a segment
    /// produced for a batch window onto absolute video time.
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.start_time += offset;
        self.end_time += offset;
        self
    }
}

/// A full, time-aligned transcript.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Transcript {
    pub segments: Vec<TranscriptSegment>,
    pub full_text: String,
    pub duration: f64,
}

impl Transcript {
    pub fn new(segments: Vec<TranscriptSegment>, duration: f64) -> Self {
        let full_text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            segments,
            full_text,
            duration,
        }
    }

    /// Validate the ordering invariant: segments sorted and non-overlapping
    /// up to a small epsilon, bounded by `[0, duration]`.
    pub fn is_well_formed(&self) -> bool {
        const EPSILON: f64 = 0.5;

        if self.segments.is_empty() {
            return false;
        }
        if self.segments[0].start_time < 0.0 {
            return false;
        }
        if let Some(last) = self.segments.last() {
            if last.end_time > self.duration + EPSILON {
                return false;
            }
        }
        self.segments.windows(2).all(|pair| {
            let (a, b) = (&pair[0], &pair[1]);
            a.end_time <= b.start_time + EPSILON
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(s: f64, e: f64) -> TranscriptSegment {
        TranscriptSegment::new(s, e, format!("segment {s}-{e}"))
    }

    #[test]
    fn well_formed_transcript_passes_invariant() {
        let t = Transcript::new(vec![seg(0.0, 120.0), seg(120.0, 240.0)], 240.0);
        assert!(t.is_well_formed());
    }

    #[test]
    fn empty_transcript_is_invalid() {
        let t = Transcript::new(vec![], 0.0);
        assert!(!t.is_well_formed());
    }

    #[test]
    fn overlapping_segments_fail_invariant() {
        let t = Transcript::new(vec![seg(0.0, 130.0), seg(120.0, 240.0)], 240.0);
        // 130.0 > 120.0 + 0.5 epsilon, so this overlaps too much
        assert!(!t.is_well_formed());
    }

    #[test]
    fn offset_shifts_both_timestamps() {
        let s = seg(0.0, 60.0).with_offset(600.0);
        assert_eq!(s.start_time, 600.0);
        assert_eq!(s.end_time, 660.0);
    }
}
