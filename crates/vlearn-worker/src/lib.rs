//! Background worker for the video-learning pipeline.
//!
//! Claims `ProcessVideoJob`s from the Redis Streams queue and drives each
//! one through `vlearn_core::PipelineOrchestrator::run_background`: batched
//! transcription, flashcard generation, and (on success) transcription
//! credit deduction. Retry and dead-letter handling, crash recovery via
//! `XPENDING`/`XCLAIM`, and heartbeat publishing live here; none of the
//! pipeline semantics do.

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod logging;

pub use config::WorkerConfig;
pub use context::ProcessingContext;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use logging::JobLogger;
