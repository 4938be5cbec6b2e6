//! Post-quiz learning report: a frozen snapshot of aggregated performance
//! plus LLM-derived semantic and growth analysis.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::{QuestionId, QuizId, ReportId, UserId, VideoId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WeakArea {
    pub concept: String,
    pub severity: Severity,
    pub description: String,
}

/// Flat counters plus per-session average, grouped by quiz_id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PerformanceStats {
    pub total: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub accuracy_rate: f64,
    /// Mean of per-session (quiz_id) scores, not a flat mean over all quiz
    /// attempts — see `vlearn-core::report` for the aggregation.
    pub quiz_average_score: f64,
    /// question_id -> accuracy across all of that user's attempts on it.
    pub per_question: HashMap<String, f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AttemptBreakdown {
    pub flashcard_attempts: u32,
    pub flashcard_correct: u32,
    pub quiz_attempts: u32,
    pub quiz_correct: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MasteryBucket {
    /// Per-question accuracy >= 0.80
    Mastered,
    /// Per-question accuracy in [0.50, 0.80)
    Learning,
    /// Per-question accuracy < 0.50
    NeedsReview,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MasteryEntry {
    pub question_id: QuestionId,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct MasteryAnalysis {
    pub mastered: Vec<MasteryEntry>,
    pub learning: Vec<MasteryEntry>,
    pub needs_review: Vec<MasteryEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LearningNodeStatus {
    Mastered,
    Learning,
    Locked,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LearningPathNode {
    pub id: String,
    pub topic: String,
    pub status: LearningNodeStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LearningPathEdge {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct LearningPath {
    pub nodes: Vec<LearningPathNode>,
    pub edges: Vec<LearningPathEdge>,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoRecommendation {
    pub concept: String,
    pub search_queries: Vec<String>,
    pub search_urls: Vec<String>,
}

/// An immutable snapshot taken at generation time.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Report {
    pub id: ReportId,
    pub user_id: UserId,
    pub video_id: VideoId,
    pub quiz_id: QuizId,
    /// keyword -> importance, normalized to [20, 100].
    pub word_frequency: HashMap<String, u32>,
    pub performance_stats: PerformanceStats,
    pub attempt_breakdown: AttemptBreakdown,
    pub weak_areas: Vec<WeakArea>,
    pub mastery_analysis: MasteryAnalysis,
    pub learning_path: LearningPath,
    pub video_recommendations: Vec<VideoRecommendation>,
    pub key_takeaways: Vec<String>,
    pub video_type: String,
    pub domain: String,
    pub main_topics: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mastery_bucket_thresholds() {
        // Documented as a constant in vlearn-core, re-asserted here as a
        // boundary sanity check on the bucket names themselves.
        assert_ne!(MasteryBucket::Mastered, MasteryBucket::Learning);
        assert_ne!(MasteryBucket::Learning, MasteryBucket::NeedsReview);
    }
}
