//! Shared data models for the video-learning pipeline.
//!
//! This crate provides serde/schemars-annotated types for the entities
//! described by the persistence schema: videos and their transcripts,
//! questions and quizzes, the per-attempt grading log, learning reports,
//! study notes, users, the credit ledger, and project↔video links.

pub mod attempt;
pub mod credit;
pub mod ids;
pub mod notes;
pub mod project;
pub mod question;
pub mod report;
pub mod transcript;
pub mod user;
pub mod video;

pub use attempt::{Attempt, QuestionType};
pub use credit::{CreditContext, CreditHistoryEntry, CreditOperation, CreditType};
pub use ids::{NotesId, ProjectId, QuestionId, QuizId, ReportId, UserId, VideoId};
pub use notes::{Diagram, DiagramType, Notes, NotesSection};
pub use project::{Project, ProjectVideoLink};
pub use question::{Difficulty, Question, Quiz};
pub use report::{
    AttemptBreakdown, LearningNodeStatus, LearningPath, LearningPathEdge, LearningPathNode,
    MasteryAnalysis, MasteryBucket, MasteryEntry, PerformanceStats, Report, Severity,
    VideoRecommendation, WeakArea,
};
pub use transcript::{Transcript, TranscriptSegment};
pub use user::{User, UserRole};
pub use video::{ProcessingStatus, Video};
