//! Per-question grading log.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::{QuestionId, QuizId, UserId, VideoId};

/// Whether an attempt was made against an inline flashcard or a final quiz.
/// This is the sole distinguisher between the two question origins; the
/// `Question` type itself carries no such tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Flashcard,
    Quiz,
}

/// A single graded answer. Append-only; never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Attempt {
    pub id: String,
    pub user_id: UserId,
    pub video_id: VideoId,
    pub question_id: QuestionId,
    pub question_type: QuestionType,
    pub selected_answer: u8,
    pub correct_answer: u8,
    pub is_correct: bool,
    /// 1 + count of prior attempts by the same (user_id, question_id) pair.
    pub attempt_number: u32,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_id: Option<QuizId>,
    pub created_at: DateTime<Utc>,
}

impl Attempt {
    pub fn new(
        user_id: UserId,
        video_id: VideoId,
        question_id: QuestionId,
        question_type: QuestionType,
        selected_answer: u8,
        correct_answer: u8,
        attempt_number: u32,
        quiz_id: Option<QuizId>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            video_id,
            question_id,
            question_type,
            selected_answer,
            correct_answer,
            is_correct: selected_answer == correct_answer,
            attempt_number,
            timestamp: now,
            quiz_id,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_correct_derived_from_answers() {
        let a = Attempt::new(
            UserId::from("u1"),
            VideoId::from("v1"),
            QuestionId::new(),
            QuestionType::Flashcard,
            2,
            2,
            1,
            None,
        );
        assert!(a.is_correct);

        let b = Attempt::new(
            UserId::from("u1"),
            VideoId::from("v1"),
            QuestionId::new(),
            QuestionType::Quiz,
            1,
            2,
            1,
            Some(QuizId::new()),
        );
        assert!(!b.is_correct);
    }
}
