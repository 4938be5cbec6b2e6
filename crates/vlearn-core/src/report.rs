//! Post-quiz learning report generator (§4.7).
//!
//! Seven independent analyses run concurrently over the same attempt log
//! and transcript, then are assembled into one immutable `Report` snapshot:
//! semantic extraction, performance aggregation, mastery partition, growth
//! area analysis, a learning path DAG, video recommendations, and key
//! takeaways. Each LLM-backed step degrades to a documented deterministic
//! fallback rather than failing the whole report.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::warn;

use vlearn_models::{
    Attempt, AttemptBreakdown, LearningPath, LearningPathEdge, LearningPathNode, LearningNodeStatus, MasteryAnalysis,
    MasteryBucket, MasteryEntry, PerformanceStats, Question, QuestionId, QuestionType, QuizId, Report, ReportId,
    Severity, UserId, VideoId, VideoRecommendation, WeakArea,
};
use vlearn_llm::LlmClient;

use crate::config::PipelineConfig;
use crate::error::CoreResult;
use crate::store::Store;

pub struct ReportGenerator<'a> {
    store: &'a Store,
    llm: &'a LlmClient,
    config: &'a PipelineConfig,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(store: &'a Store, llm: &'a LlmClient, config: &'a PipelineConfig) -> Self {
        Self { store, llm, config }
    }

    pub async fn generate(&self, user_id: &UserId, video_id: &VideoId, quiz_id: &QuizId, full_text: &str) -> CoreResult<Report> {
        let attempts = self.store.attempts.list_for_video(user_id, video_id, None).await?;
        let quiz_attempts: Vec<&Attempt> = attempts.iter().filter(|a| a.quiz_id.as_ref() == Some(quiz_id)).collect();
        let pool = self.store.questions.list_flashcards(video_id).await?;
        let questions_by_id: HashMap<QuestionId, &Question> = pool.iter().map(|q| (q.id.clone(), q)).collect();

        let performance_stats = aggregate_performance(&attempts);
        let attempt_breakdown = aggregate_breakdown(&attempts);
        let mastery_analysis = partition_mastery(&performance_stats);

        let incorrect_text: Vec<&str> = quiz_attempts
            .iter()
            .filter(|a| !a.is_correct)
            .filter_map(|a| questions_by_id.get(&a.question_id))
            .map(|q| q.question_text.as_str())
            .collect();
        let excerpt: String = full_text.chars().take(self.config.growth_analysis_transcript_chars).collect();

        let (semantic, growth_areas, takeaways) = tokio::join!(
            self.extract_semantics(full_text),
            self.analyze_growth_areas(&incorrect_text, &excerpt),
            self.key_takeaways(&excerpt),
        );

        let semantic = semantic.unwrap_or_else(|e| {
            warn!(error = %e, "semantic extraction failed, using fallback");
            fallback_semantics()
        });
        let weak_areas = growth_areas.unwrap_or_else(|e| {
            warn!(error = %e, "growth area analysis failed, using fallback");
            fallback_weak_areas(&mastery_analysis, &questions_by_id)
        });
        let key_takeaways = takeaways.unwrap_or_else(|e| {
            warn!(error = %e, "key takeaway extraction failed, using fallback");
            fallback_takeaways(&semantic.main_topics)
        });

        let learning_path = self.build_learning_path(&semantic.main_topics, &mastery_analysis).await;
        let video_recommendations = build_recommendations(&weak_areas);

        let report = Report {
            id: ReportId::new(),
            user_id: user_id.clone(),
            video_id: video_id.clone(),
            quiz_id: quiz_id.clone(),
            word_frequency: semantic.word_frequency,
            performance_stats,
            attempt_breakdown,
            weak_areas,
            mastery_analysis,
            learning_path,
            video_recommendations,
            key_takeaways,
            video_type: semantic.video_type,
            domain: semantic.domain,
            main_topics: semantic.main_topics.clone(),
            created_at: chrono::Utc::now(),
        };

        self.store.reports.create(&report).await?;
        Ok(report)
    }

    async fn extract_semantics(&self, full_text: &str) -> CoreResult<SemanticExtraction> {
        let excerpt: String = full_text.chars().take(self.config.notes_input_chars).collect();
        let prompt = format!(
            "Analyze this video transcript excerpt and return JSON with fields: video_type (string, \
             e.g. \"lecture\", \"tutorial\"), domain (string, e.g. \"biology\"), main_topics (array of \
             3-8 strings), word_frequency (object mapping up to 20 important keywords to an importance \
             score between 20 and 100).\n\nTranscript excerpt:\n{excerpt}"
        );
        let generated: GeneratedSemantics = self.llm.generate_json(&prompt, 0.2).await?;
        Ok(SemanticExtraction {
            video_type: generated.video_type,
            domain: generated.domain,
            main_topics: generated.main_topics,
            word_frequency: generated.word_frequency,
        })
    }

    async fn analyze_growth_areas(&self, incorrect_text: &[&str], excerpt: &str) -> CoreResult<Vec<WeakArea>> {
        if incorrect_text.is_empty() {
            return Ok(Vec::new());
        }
        let joined = incorrect_text.join("\n- ");
        let prompt = format!(
            "A learner answered these questions incorrectly on a quiz about the video transcript \
             excerpt below. For each distinct underlying concept the learner seems to be missing, \
             return an object with: concept (string), severity (one of \"low\", \"medium\", \"high\"), \
             description (string explaining the gap). Return JSON: {{\"weak_areas\": [...]}}\n\n\
             Missed questions:\n- {joined}\n\nTranscript excerpt:\n{excerpt}"
        );
        let generated: GeneratedGrowthAreas = self.llm.generate_json(&prompt, 0.3).await?;
        Ok(generated
            .weak_areas
            .into_iter()
            .map(|w| WeakArea { concept: w.concept, severity: w.severity, description: w.description })
            .collect())
    }

    async fn key_takeaways(&self, excerpt: &str) -> CoreResult<Vec<String>> {
        let prompt = format!(
            "Summarize this video transcript excerpt as exactly 5 key takeaways, each one concise \
             sentence. Return JSON: {{\"takeaways\": [string, string, string, string, string]}}\n\n{excerpt}"
        );
        let generated: GeneratedTakeaways = self.llm.generate_json(&prompt, 0.3).await?;
        Ok(generated.takeaways)
    }

    async fn build_learning_path(&self, main_topics: &[String], mastery: &MasteryAnalysis) -> LearningPath {
        let prompt = format!(
            "Given these topics covered by a video: {topics:?}, and that the learner has {mastered} \
             mastered questions, {learning} still-learning questions, and {needs_review} questions \
             needing review, propose a short learning path. Return JSON with: nodes (array of objects \
             with id, topic, status one of \"mastered\"/\"learning\"/\"locked\"), edges (array of \
             objects with from, to, both node ids), next_steps (array of 2-4 short strings).",
            topics = main_topics,
            mastered = mastery.mastered.len(),
            learning = mastery.learning.len(),
            needs_review = mastery.needs_review.len(),
        );
        match self.llm.generate_json::<GeneratedLearningPath>(&prompt, 0.3).await {
            Ok(g) => LearningPath {
                nodes: g
                    .nodes
                    .into_iter()
                    .map(|n| LearningPathNode { id: n.id, topic: n.topic, status: n.status })
                    .collect(),
                edges: g.edges.into_iter().map(|e| LearningPathEdge { from: e.from, to: e.to }).collect(),
                next_steps: g.next_steps,
            },
            Err(e) => {
                warn!(error = %e, "learning path generation failed, using fallback");
                fallback_learning_path(main_topics)
            }
        }
    }
}

struct SemanticExtraction {
    video_type: String,
    domain: String,
    main_topics: Vec<String>,
    word_frequency: HashMap<String, u32>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSemantics {
    video_type: String,
    domain: String,
    main_topics: Vec<String>,
    word_frequency: HashMap<String, u32>,
}

#[derive(Debug, Deserialize)]
struct GeneratedGrowthAreas {
    weak_areas: Vec<GeneratedWeakArea>,
}

#[derive(Debug, Deserialize)]
struct GeneratedWeakArea {
    concept: String,
    severity: Severity,
    description: String,
}

#[derive(Debug, Deserialize)]
struct GeneratedTakeaways {
    takeaways: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeneratedLearningPath {
    nodes: Vec<GeneratedLearningNode>,
    edges: Vec<GeneratedLearningEdge>,
    next_steps: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeneratedLearningNode {
    id: String,
    topic: String,
    status: LearningNodeStatus,
}

#[derive(Debug, Deserialize)]
struct GeneratedLearningEdge {
    from: String,
    to: String,
}

/// Flat counters, per-question accuracy, and the session-grouped average
/// score required by §4.7 (`quiz_average_score` is the mean of per-session
/// scores, not a flat mean over every quiz attempt ever made).
fn aggregate_performance(attempts: &[Attempt]) -> PerformanceStats {
    let total = attempts.len() as u32;
    let correct = attempts.iter().filter(|a| a.is_correct).count() as u32;
    let incorrect = total - correct;
    let accuracy_rate = if total > 0 { correct as f64 / total as f64 } else { 0.0 };

    let mut per_question_counts: HashMap<String, (u32, u32)> = HashMap::new();
    for a in attempts {
        let entry = per_question_counts.entry(a.question_id.to_string()).or_insert((0, 0));
        entry.1 += 1;
        if a.is_correct {
            entry.0 += 1;
        }
    }
    let per_question: HashMap<String, f64> =
        per_question_counts.into_iter().map(|(id, (c, t))| (id, if t > 0 { c as f64 / t as f64 } else { 0.0 })).collect();

    let quiz_average_score = session_average_score(attempts);

    PerformanceStats { total, correct, incorrect, accuracy_rate, quiz_average_score, per_question }
}

/// Group quiz-type attempts by `quiz_id`, compute each session's accuracy,
/// then average those per-session scores (not a flat attempt-level mean).
fn session_average_score(attempts: &[Attempt]) -> f64 {
    let mut sessions: HashMap<QuizId, (u32, u32)> = HashMap::new();
    for a in attempts {
        if a.question_type != QuestionType::Quiz {
            continue;
        }
        let Some(quiz_id) = &a.quiz_id else { continue };
        let entry = sessions.entry(quiz_id.clone()).or_insert((0, 0));
        entry.1 += 1;
        if a.is_correct {
            entry.0 += 1;
        }
    }
    if sessions.is_empty() {
        return 0.0;
    }
    let sum: f64 = sessions.values().map(|(c, t)| if *t > 0 { *c as f64 / *t as f64 } else { 0.0 }).sum();
    sum / sessions.len() as f64
}

fn aggregate_breakdown(attempts: &[Attempt]) -> AttemptBreakdown {
    let mut breakdown = AttemptBreakdown::default();
    for a in attempts {
        match a.question_type {
            QuestionType::Flashcard => {
                breakdown.flashcard_attempts += 1;
                if a.is_correct {
                    breakdown.flashcard_correct += 1;
                }
            }
            QuestionType::Quiz => {
                breakdown.quiz_attempts += 1;
                if a.is_correct {
                    breakdown.quiz_correct += 1;
                }
            }
        }
    }
    breakdown
}

/// Partition per-question accuracy into mastered (>=0.80), learning
/// (0.50-0.79), and needs_review (<0.50), each capped at the 10 lowest (for
/// needs_review/learning) or highest (for mastered) entries to keep the
/// report bounded in size.
fn partition_mastery(stats: &PerformanceStats) -> MasteryAnalysis {
    let mut mastered = Vec::new();
    let mut learning = Vec::new();
    let mut needs_review = Vec::new();

    for (id, accuracy) in &stats.per_question {
        let entry = MasteryEntry { question_id: QuestionId::from_string(id.clone()), accuracy: *accuracy };
        match bucket_for(*accuracy) {
            MasteryBucket::Mastered => mastered.push(entry),
            MasteryBucket::Learning => learning.push(entry),
            MasteryBucket::NeedsReview => needs_review.push(entry),
        }
    }

    mastered.sort_by(|a, b| b.accuracy.partial_cmp(&a.accuracy).unwrap());
    learning.sort_by(|a, b| a.accuracy.partial_cmp(&b.accuracy).unwrap());
    needs_review.sort_by(|a, b| a.accuracy.partial_cmp(&b.accuracy).unwrap());

    mastered.truncate(10);
    learning.truncate(10);
    needs_review.truncate(10);

    MasteryAnalysis { mastered, learning, needs_review }
}

fn bucket_for(accuracy: f64) -> MasteryBucket {
    if accuracy >= 0.80 {
        MasteryBucket::Mastered
    } else if accuracy >= 0.50 {
        MasteryBucket::Learning
    } else {
        MasteryBucket::NeedsReview
    }
}

/// Up to 5 recommendations, ordered by severity (High first), each with 1-2
/// search queries derived from the concept name and a deterministically
/// encoded search URL.
fn build_recommendations(weak_areas: &[WeakArea]) -> Vec<VideoRecommendation> {
    let mut ranked: Vec<&WeakArea> = weak_areas.iter().collect();
    ranked.sort_by_key(|w| std::cmp::Reverse(severity_rank(w.severity)));

    ranked
        .into_iter()
        .take(5)
        .map(|w| {
            let queries = vec![
                format!("{} explained", w.concept),
                format!("{} tutorial", w.concept),
            ];
            let search_urls = queries
                .iter()
                .map(|q| format!("https://www.youtube.com/results?search_query={}", urlencoding::encode(q)))
                .collect();
            VideoRecommendation { concept: w.concept.clone(), search_queries: queries, search_urls }
        })
        .collect()
}

fn severity_rank(severity: Severity) -> u8 {
    match severity {
        Severity::High => 2,
        Severity::Medium => 1,
        Severity::Low => 0,
    }
}

fn fallback_semantics() -> SemanticExtraction {
    SemanticExtraction {
        video_type: "unknown".to_string(),
        domain: "general".to_string(),
        main_topics: Vec::new(),
        word_frequency: HashMap::new(),
    }
}

fn fallback_weak_areas(mastery: &MasteryAnalysis, questions: &HashMap<QuestionId, &Question>) -> Vec<WeakArea> {
    mastery
        .needs_review
        .iter()
        .filter_map(|entry| {
            let question = questions.get(&entry.question_id)?;
            Some(WeakArea {
                concept: question.question_text.clone(),
                severity: Severity::Medium,
                description: "This question was missed more often than answered correctly.".to_string(),
            })
        })
        .collect()
}

fn fallback_takeaways(main_topics: &[String]) -> Vec<String> {
    main_topics.iter().take(5).map(|t| format!("This video covers {t}.")).collect()
}

fn fallback_learning_path(main_topics: &[String]) -> LearningPath {
    let nodes: Vec<LearningPathNode> = main_topics
        .iter()
        .enumerate()
        .map(|(i, topic)| LearningPathNode { id: format!("topic-{i}"), topic: topic.clone(), status: LearningNodeStatus::Learning })
        .collect();
    let edges = nodes
        .windows(2)
        .map(|pair| LearningPathEdge { from: pair[0].id.clone(), to: pair[1].id.clone() })
        .collect();
    LearningPath { nodes, edges, next_steps: vec!["Review the video's weakest topics before retaking the quiz.".to_string()] }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vlearn_models::{Attempt, QuestionId, QuestionType, UserId, VideoId};

    fn quiz_attempt(quiz_id: QuizId, correct: bool) -> Attempt {
        Attempt::new(UserId::from("u1"), VideoId::from("v1"), QuestionId::new(), QuestionType::Quiz, 0, if correct { 0 } else { 1 }, 1, Some(quiz_id))
    }

    #[test]
    fn session_average_is_mean_of_per_session_scores_not_flat_mean() {
        let session_a = QuizId::new();
        let session_b = QuizId::new();
        // session_a: 1/2 correct (0.5), session_b: 2/2 correct (1.0)
        let attempts = vec![
            quiz_attempt(session_a.clone(), true),
            quiz_attempt(session_a, false),
            quiz_attempt(session_b.clone(), true),
            quiz_attempt(session_b, true),
        ];
        // flat mean would be 3/4 = 0.75; session mean is (0.5 + 1.0) / 2 = 0.75 here by
        // coincidence, so use unbalanced session sizes to distinguish them below.
        assert_eq!(session_average_score(&attempts), 0.75);
    }

    #[test]
    fn session_average_distinguishes_from_flat_mean_with_uneven_sessions() {
        let small = QuizId::new();
        let big = QuizId::new();
        let mut attempts = vec![quiz_attempt(small, true)]; // session: 1/1 = 1.0
        for _ in 0..9 {
            attempts.push(quiz_attempt(big.clone(), false));
        }
        attempts.push(quiz_attempt(big, true)); // session: 1/10 = 0.1
        // flat mean: 2/11 ≈ 0.18; session mean: (1.0 + 0.1) / 2 = 0.55
        let session_mean = session_average_score(&attempts);
        let flat_mean = attempts.iter().filter(|a| a.is_correct).count() as f64 / attempts.len() as f64;
        assert!((session_mean - 0.55).abs() < 1e-9);
        assert!((session_mean - flat_mean).abs() > 0.1);
    }

    #[test]
    fn mastery_buckets_respect_thresholds() {
        assert_eq!(bucket_for(0.80), MasteryBucket::Mastered);
        assert_eq!(bucket_for(0.79), MasteryBucket::Learning);
        assert_eq!(bucket_for(0.50), MasteryBucket::Learning);
        assert_eq!(bucket_for(0.49), MasteryBucket::NeedsReview);
    }

    #[test]
    fn recommendations_cap_at_five_and_rank_by_severity() {
        let weak_areas = vec![
            WeakArea { concept: "a".into(), severity: Severity::Low, description: "d".into() },
            WeakArea { concept: "b".into(), severity: Severity::High, description: "d".into() },
            WeakArea { concept: "c".into(), severity: Severity::Medium, description: "d".into() },
        ];
        let recs = build_recommendations(&weak_areas);
        assert_eq!(recs[0].concept, "b");
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].search_queries.len(), 2);
    }
}
