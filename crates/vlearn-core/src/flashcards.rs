//! Flashcard generator (§4.4).
//!
//! One question per transcript segment, synthesized with the previous and
//! next segment's text as context so the question can probe understanding
//! of the current segment without depending on material the learner hasn't
//! reached yet. Falls back to a deterministic template question whenever
//! the LLM call fails or returns something that doesn't validate, mirroring
//! the donor's `GeminiClient` fallback-on-failure posture rather than
//! surfacing a partial-batch error to the caller.

use serde::Deserialize;
use tracing::warn;

use vlearn_models::{Difficulty, Question, QuestionId, TranscriptSegment, VideoId};
use vlearn_llm::LlmClient;

use crate::error::CoreResult;
use crate::store::Store;

pub struct FlashcardGenerator<'a> {
    store: &'a Store,
    llm: &'a LlmClient,
}

/// Shared with the quiz planner's adaptive synthesis (`quiz.rs`), which
/// reuses this type and the neighbor-context prompt below with a focus hint
/// appended.
#[derive(Debug, Deserialize)]
pub(crate) struct GeneratedQuestion {
    pub(crate) question_text: String,
    pub(crate) options: [String; 4],
    pub(crate) correct_answer: u8,
    pub(crate) explanation: String,
    pub(crate) difficulty: GeneratedDifficulty,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum GeneratedDifficulty {
    Easy,
    Medium,
    Hard,
}

impl From<GeneratedDifficulty> for Difficulty {
    fn from(d: GeneratedDifficulty) -> Self {
        match d {
            GeneratedDifficulty::Easy => Difficulty::Easy,
            GeneratedDifficulty::Medium => Difficulty::Medium,
            GeneratedDifficulty::Hard => Difficulty::Hard,
        }
    }
}

impl<'a> FlashcardGenerator<'a> {
    pub fn new(store: &'a Store, llm: &'a LlmClient) -> Self {
        Self { store, llm }
    }

    /// Generate a question for every segment in `segments` and persist the
    /// whole set, each tagged as a flashcard (`show_at_timestamp` set).
    pub async fn generate_and_persist(&self, video_id: &VideoId, segments: &[TranscriptSegment]) -> CoreResult<Vec<Question>> {
        let mut questions = Vec::with_capacity(segments.len());
        for (i, segment) in segments.iter().enumerate() {
            let prev = i.checked_sub(1).and_then(|j| segments.get(j));
            let next = segments.get(i + 1);
            let question = self.generate_one(video_id, segment, prev, next).await;
            questions.push(question);
        }
        self.store.questions.create_many(&questions).await?;
        Ok(questions)
    }

    async fn generate_one(
        &self,
        video_id: &VideoId,
        segment: &TranscriptSegment,
        prev: Option<&TranscriptSegment>,
        next: Option<&TranscriptSegment>,
    ) -> Question {
        match self.try_generate(segment, prev, next).await {
            Ok(generated) => {
                let question = Question {
                    id: QuestionId::new(),
                    video_id: video_id.clone(),
                    question_text: generated.question_text,
                    options: generated.options,
                    correct_answer: generated.correct_answer,
                    explanation: generated.explanation,
                    difficulty: generated.difficulty.into(),
                    source_segment: segment.clone(),
                    show_at_timestamp: None,
                };
                if question.validate().is_ok() {
                    return question.as_flashcard();
                }
                warn!(start = segment.start_time, "generated flashcard failed validation, using fallback");
                fallback_question(video_id, segment)
            }
            Err(e) => {
                warn!(start = segment.start_time, error = %e, "flashcard generation failed, using fallback");
                fallback_question(video_id, segment)
            }
        }
    }

    async fn try_generate(
        &self,
        segment: &TranscriptSegment,
        prev: Option<&TranscriptSegment>,
        next: Option<&TranscriptSegment>,
    ) -> CoreResult<GeneratedQuestion> {
        synthesize(self.llm, segment, prev, next, None).await
    }
}

/// Call the LLM for one segment-anchored question, optionally biased by
/// `focus_hint` (used by the quiz planner's adaptive allocation to carry a
/// weak question's accuracy and push difficulty to medium/hard; `None` here
/// for plain flashcard generation).
pub(crate) async fn synthesize(
    llm: &LlmClient,
    segment: &TranscriptSegment,
    prev: Option<&TranscriptSegment>,
    next: Option<&TranscriptSegment>,
    focus_hint: Option<&str>,
) -> CoreResult<GeneratedQuestion> {
    let prompt = build_prompt(segment, prev, next, focus_hint);
    let generated: GeneratedQuestion = llm.generate_json(&prompt, 0.4).await?;
    Ok(generated)
}

fn build_prompt(
    segment: &TranscriptSegment,
    prev: Option<&TranscriptSegment>,
    next: Option<&TranscriptSegment>,
    focus_hint: Option<&str>,
) -> String {
    let prev_text = prev.map(|s| s.text.as_str()).unwrap_or("(none, this is the first segment)");
    let next_text = next.map(|s| s.text.as_str()).unwrap_or("(none, this is the last segment)");
    let focus_block = focus_hint.map(|hint| format!("\n\nFocus: {hint}")).unwrap_or_default();

    format!(
        "You are writing a single multiple-choice comprehension question for an educational video \
         player. The question tests understanding of the CURRENT segment only; the previous and next \
         segments are given purely as surrounding context, not as material to quiz on.\n\n\
         Previous segment: {prev_text}\n\n\
         Current segment: {current}\n\n\
         Next segment: {next_text}{focus_block}\n\n\
         Write a question at Bloom's Understand or Apply level (not bare recall). Return JSON with \
         fields: question_text (string), options (array of exactly 4 strings), correct_answer \
         (integer index 0-3), explanation (string), difficulty (one of \"easy\", \"medium\", \"hard\").",
        current = segment.text,
    )
}

/// A question that always validates, used whenever LLM synthesis can't be
/// trusted for a given segment. Grounded in the Bloom-level fallback the
/// spec requires rather than dropping the segment's flashcard entirely.
fn fallback_question(video_id: &VideoId, segment: &TranscriptSegment) -> Question {
    let prompt_text = first_sentence(&segment.text);
    Question {
        id: QuestionId::new(),
        video_id: video_id.clone(),
        question_text: format!("What is the main idea discussed in this segment: \"{prompt_text}\"?"),
        options: [
            "The concept described in this part of the video".to_string(),
            "An unrelated topic not covered here".to_string(),
            "A topic covered only in a later segment".to_string(),
            "A topic covered only in an earlier segment".to_string(),
        ],
        correct_answer: 0,
        explanation: "This question is a placeholder generated when automatic question synthesis was unavailable for this segment.".to_string(),
        difficulty: Difficulty::Medium,
        source_segment: segment.clone(),
        show_at_timestamp: None,
    }
    .as_flashcard()
}

fn first_sentence(text: &str) -> String {
    let trimmed = text.trim();
    let cut = trimmed.find(['.', '?', '!']).map(|i| i + 1).unwrap_or(trimmed.len().min(140));
    trimmed[..cut].trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_question_always_validates() {
        let segment = TranscriptSegment::new(0.0, 120.0, "Photosynthesis converts light into chemical energy.");
        let q = fallback_question(&VideoId::from("v1"), &segment);
        assert!(q.validate().is_ok());
        assert_eq!(q.show_at_timestamp, Some(120.0));
    }

    #[test]
    fn first_sentence_truncates_long_text_without_terminator() {
        let long = "a".repeat(300);
        let s = first_sentence(&long);
        assert!(s.len() <= 140);
    }
}
