//! Credit ledger, batch transcript processor, flashcard/quiz/notes/report
//! generators, and the pipeline orchestrator that ties them together.
//!
//! This crate has no transport awareness: `vlearn-api` drives it from HTTP
//! handlers and `vlearn-worker` drives its background half from a queue
//! consumer. Everything here talks to Firestore, Gemini, and `yt-dlp` only
//! through the lower crates' published ports.

pub mod batch;
pub mod config;
pub mod credit;
pub mod error;
pub mod flashcards;
pub mod notes;
pub mod orchestrator;
pub mod quiz;
pub mod report;
pub mod store;

pub use batch::BatchProcessor;
pub use config::PipelineConfig;
pub use credit::CreditLedger;
pub use error::{CoreError, CoreResult};
pub use flashcards::FlashcardGenerator;
pub use notes::NotesGenerator;
pub use orchestrator::{PipelineOrchestrator, SubmissionResult};
pub use quiz::QuizPlanner;
pub use report::ReportGenerator;
pub use store::Store;
