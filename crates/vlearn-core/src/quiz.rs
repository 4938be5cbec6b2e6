//! Adaptive quiz planner (§4.5).
//!
//! A learner's first quiz for a video draws questions straight from the
//! flashcard pool, one per segment, same as the inline flashcards. Once a
//! learner has prior attempts on the video, the planner instead splits the
//! target question count into an adaptive share (weighted toward questions
//! the learner answered incorrectly before, accuracy below the weak
//! threshold) and a review share (drawn evenly across segments), to bias
//! review time toward material that didn't stick.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use vlearn_llm::LlmClient;
use vlearn_models::{Question, QuestionId, QuizId, TranscriptSegment, UserId, VideoId};

use crate::config::PipelineConfig;
use crate::error::CoreResult;
use crate::flashcards;
use crate::store::Store;

pub struct QuizPlanner<'a> {
    store: &'a Store,
    config: &'a PipelineConfig,
    llm: &'a LlmClient,
}

impl<'a> QuizPlanner<'a> {
    pub fn new(store: &'a Store, config: &'a PipelineConfig, llm: &'a LlmClient) -> Self {
        Self { store, config, llm }
    }

    /// Assemble and persist a quiz of `self.config.final_quiz_questions`
    /// questions for `user_id` on `video_id`.
    pub async fn plan(&self, user_id: &UserId, video_id: &VideoId) -> CoreResult<vlearn_models::Quiz> {
        let pool = self.store.questions.list_flashcards(video_id).await?;
        let prior = self.store.attempts.list_for_video(user_id, video_id, None).await?;

        let selected = if prior.is_empty() {
            first_pass_selection(&pool, self.config.final_quiz_questions)
        } else {
            let weak = weakest_questions(&prior, self.config.weak_question_threshold);
            self.adaptive_selection(video_id, &pool, &weak).await
        };

        let quiz = vlearn_models::Quiz::new(QuizId::new(), video_id.clone(), selected);
        self.store.quizzes.create(&quiz).await?;
        Ok(quiz)
    }

    /// Split `target` into an adaptive share, synthesized fresh via the LLM
    /// against each weak question's segment with a focus hint carrying its
    /// accuracy and difficulty raised to medium/hard, and a review share
    /// drawn evenly across segments from the existing flashcard pool (§4.5
    /// steps 4-5).
    async fn adaptive_selection(&self, video_id: &VideoId, pool: &[Question], weak: &[(QuestionId, f64)]) -> Vec<Question> {
        let target = self.config.final_quiz_questions as usize;
        let adaptive_count = adaptive_allocation(target, self.config.adaptive_share);

        let mut selected: Vec<Question> = Vec::with_capacity(target);
        let mut used: HashSet<QuestionId> = HashSet::new();

        for (id, accuracy) in weak.iter().take(adaptive_count) {
            let Some(idx) = pool.iter().position(|q| &q.id == id) else { continue };
            let segment = &pool[idx].source_segment;
            let prev = idx.checked_sub(1).and_then(|j| pool.get(j)).map(|q| &q.source_segment);
            let next = pool.get(idx + 1).map(|q| &q.source_segment);

            let question = self
                .synthesize_focused(video_id, segment, prev, next, *accuracy)
                .await
                .unwrap_or_else(|| pool[idx].clone());
            used.insert(pool[idx].id.clone());
            selected.push(question);
        }

        let remaining_target = target.saturating_sub(selected.len());
        if remaining_target > 0 && !pool.is_empty() {
            let segment_count = pool.len();
            let per_segment = (remaining_target / segment_count.max(1)).max(1);
            let review: Vec<Question> = pool
                .iter()
                .filter(|q| !used.contains(&q.id))
                .take(per_segment.saturating_mul(segment_count).max(remaining_target))
                .cloned()
                .collect();
            selected.extend(review);
        }

        truncate_or_pad(selected, target)
    }

    /// One adaptive question synthesized via the LLM, reusing the flashcard
    /// generator's neighbor-context prompt (`flashcards::synthesize`) with a
    /// focus hint built from the weak question's accuracy. `None` on any
    /// synthesis or validation failure; the caller falls back to the
    /// existing pool question for that segment, matching the "LLM as
    /// best-effort oracle" posture §9 requires.
    async fn synthesize_focused(
        &self,
        video_id: &VideoId,
        segment: &TranscriptSegment,
        prev: Option<&TranscriptSegment>,
        next: Option<&TranscriptSegment>,
        accuracy: f64,
    ) -> Option<Question> {
        let focus_hint = format!(
            "The learner has answered questions on this concept correctly only {:.0}% of the time. \
             Write a harder question (medium or hard difficulty) that targets the specific \
             misconception behind that weakness rather than repeating the same question.",
            accuracy * 100.0
        );

        let generated = match flashcards::synthesize(self.llm, segment, prev, next, Some(&focus_hint)).await {
            Ok(g) => g,
            Err(e) => {
                warn!(start = segment.start_time, error = %e, "adaptive quiz synthesis failed, falling back to pool question");
                return None;
            }
        };

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
        question.validate().ok().map(|_| question)
    }
}

/// `round(share * target)`, the adaptive/review split of §4.5 step 4
/// (default 60/40).
fn adaptive_allocation(target: usize, share: f64) -> usize {
    (share * target as f64).round() as usize
}

/// Per-question accuracy from the attempt log: correct / total attempts.
fn accuracy_by_question(attempts: &[vlearn_models::Attempt]) -> HashMap<QuestionId, (u32, u32)> {
    let mut counts: HashMap<QuestionId, (u32, u32)> = HashMap::new();
    for attempt in attempts {
        let entry = counts.entry(attempt.question_id.clone()).or_insert((0, 0));
        entry.1 += 1;
        if attempt.is_correct {
            entry.0 += 1;
        }
    }
    counts
}

/// Up to the 10 lowest-accuracy questions (with their accuracy), accuracy
/// strictly below `threshold`, ties broken by original encounter order
/// (GLOSSARY: "weak question").
fn weakest_questions(attempts: &[vlearn_models::Attempt], threshold: f64) -> Vec<(QuestionId, f64)> {
    let counts = accuracy_by_question(attempts);
    let mut first_seen: HashMap<QuestionId, usize> = HashMap::new();
    for (i, a) in attempts.iter().enumerate() {
        first_seen.entry(a.question_id.clone()).or_insert(i);
    }

    let mut weak: Vec<(QuestionId, f64, usize)> = counts
        .into_iter()
        .filter_map(|(id, (correct, total))| {
            if total == 0 {
                return None;
            }
            let accuracy = correct as f64 / total as f64;
            if accuracy < threshold {
                let order = *first_seen.get(&id).unwrap_or(&usize::MAX);
                Some((id, accuracy, order))
            } else {
                None
            }
        })
        .collect();

    weak.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap().then(a.2.cmp(&b.2)));
    weak.into_iter().take(10).map(|(id, accuracy, _)| (id, accuracy)).collect()
}

/// No prior attempts: one question per segment, in segment order, truncated
/// or padded to the target count.
fn first_pass_selection(pool: &[Question], target: u32) -> Vec<Question> {
    truncate_or_pad(pool.to_vec(), target as usize)
}

/// Truncate to exactly `target` questions, or pad by cycling the pool from
/// the start if there weren't enough to begin with (§4.5 edge case: a video
/// with fewer segments than the target quiz size).
fn truncate_or_pad(mut selected: Vec<Question>, target: usize) -> Vec<Question> {
    if selected.len() > target {
        selected.truncate(target);
        return selected;
    }
    if selected.is_empty() {
        return selected;
    }
    let mut i = 0;
    while selected.len() < target {
        selected.push(selected[i % selected.len().max(1)].clone());
        i += 1;
        if i > target * 2 {
            break;
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use vlearn_models::{Attempt, Difficulty, QuestionType, TranscriptSegment};

    fn question(idx: usize) -> Question {
        Question {
            id: QuestionId::from_string(format!("q{idx}")),
            video_id: VideoId::from("v1"),
            question_text: format!("question {idx}"),
            options: ["A".into(), "B".into(), "C".into(), "D".into()],
            correct_answer: 0,
            explanation: "because".into(),
            difficulty: Difficulty::Medium,
            source_segment: TranscriptSegment::new(idx as f64 * 120.0, (idx as f64 + 1.0) * 120.0, "text"),
            show_at_timestamp: Some((idx as f64 + 1.0) * 120.0),
        }
    }

    fn attempt(question_id: QuestionId, correct: bool) -> Attempt {
        Attempt::new(UserId::from("u1"), VideoId::from("v1"), question_id, QuestionType::Quiz, 0, if correct { 0 } else { 1 }, 1, None)
    }

    #[test]
    fn first_pass_truncates_to_target() {
        let pool: Vec<Question> = (0..20).map(question).collect();
        let selected = first_pass_selection(&pool, 10);
        assert_eq!(selected.len(), 10);
    }

    #[test]
    fn first_pass_pads_when_pool_smaller_than_target() {
        let pool: Vec<Question> = (0..3).map(question).collect();
        let selected = first_pass_selection(&pool, 10);
        assert_eq!(selected.len(), 10);
    }

    #[test]
    fn weak_questions_ranked_by_accuracy_then_order() {
        let attempts = vec![
            attempt(QuestionId::from_string("q0"), false),
            attempt(QuestionId::from_string("q0"), false),
            attempt(QuestionId::from_string("q1"), false),
            attempt(QuestionId::from_string("q1"), true),
            attempt(QuestionId::from_string("q2"), true),
        ];
        let weak = weakest_questions(&attempts, 0.70);
        let ids: Vec<QuestionId> = weak.iter().map(|(id, _)| id.clone()).collect();
        assert_eq!(ids, vec![QuestionId::from_string("q0"), QuestionId::from_string("q1")]);
        assert_eq!(weak[0].1, 0.0);
        assert_eq!(weak[1].1, 0.5);
    }

    #[test]
    fn adaptive_allocation_uses_default_60_percent_share() {
        let config = PipelineConfig::default();
        assert_eq!(adaptive_allocation(config.final_quiz_questions as usize, config.adaptive_share), 6);
    }

    #[test]
    fn adaptive_allocation_rounds_to_nearest() {
        assert_eq!(adaptive_allocation(10, 0.65), 7);
        assert_eq!(adaptive_allocation(7, 0.6), 4);
    }
}
