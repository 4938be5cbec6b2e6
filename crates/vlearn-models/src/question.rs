//! Question and quiz types.
//!
//! A `Question` arises from either flashcard generation or quiz generation;
//! the distinction is a tag on the `Attempt`, not on the `Question` itself
//! (see `attempt::QuestionType`).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::{QuestionId, QuizId, VideoId};
use crate::transcript::TranscriptSegment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

/// A single multiple-choice question, immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    pub id: QuestionId,
    pub video_id: VideoId,
    pub question_text: String,
    /// Exactly 4 options, ordered.
    pub options: [String; 4],
    /// Index into `options` of the correct choice.
    pub correct_answer: u8,
    pub explanation: String,
    pub difficulty: Difficulty,
    /// The segment this question is anchored to (provenance / review anchor).
    pub source_segment: TranscriptSegment,
    /// For flashcards: the timestamp at which this question should surface
    /// during playback, equal to the source segment's end_time. `None` for
    /// questions synthesized purely for a quiz with no flashcard analogue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_at_timestamp: Option<f64>,
}

impl Question {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.correct_answer > 3 {
            return Err("correct_answer must be in 0..=3");
        }
        Ok(())
    }

    /// A question produced as an inline flashcard, surfaced at segment end.
    pub fn as_flashcard(mut self) -> Self {
        self.show_at_timestamp = Some(self.source_segment.end_time);
        self
    }
}

/// An assembled quiz: an ordered set of questions, immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Quiz {
    pub id: QuizId,
    pub video_id: VideoId,
    pub questions: Vec<Question>,
}

impl Quiz {
    pub fn new(id: QuizId, video_id: VideoId, questions: Vec<Question>) -> Self {
        Self {
            id,
            video_id,
            questions,
        }
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_question() -> Question {
        Question {
            id: QuestionId::new(),
            video_id: VideoId::from("abc"),
            question_text: "Why?".into(),
            options: [
                "A".into(),
                "B".into(),
                "C".into(),
                "D".into(),
            ],
            correct_answer: 0,
            explanation: "because".into(),
            difficulty: Difficulty::Medium,
            source_segment: TranscriptSegment::new(0.0, 120.0, "text"),
            show_at_timestamp: None,
        }
    }

    #[test]
    fn flashcard_timestamp_matches_segment_end() {
        let q = sample_question().as_flashcard();
        assert_eq!(q.show_at_timestamp, Some(120.0));
    }

    #[test]
    fn correct_answer_out_of_range_is_rejected() {
        let mut q = sample_question();
        q.correct_answer = 4;
        assert!(q.validate().is_err());
    }
}
