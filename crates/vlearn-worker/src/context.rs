//! Shared handles each claimed job is processed against.

use std::sync::Arc;

use vlearn_core::config::PipelineConfig;
use vlearn_core::Store;
use vlearn_llm::LlmClient;
use vlearn_queue::{JobQueue, ProgressChannel};
use vlearn_store::FirestoreClient;
use vlearn_transcribe::IntakeConfig;

use crate::error::WorkerResult;

/// One long-lived handle per external collaborator the pipeline core needs,
/// built once at startup and shared across every job the executor runs.
#[derive(Clone)]
pub struct ProcessingContext {
    firestore: Arc<FirestoreClient>,
    pub queue: Arc<JobQueue>,
    pub progress: Arc<ProgressChannel>,
    pub llm: Arc<LlmClient>,
    pub intake_config: Arc<IntakeConfig>,
    pub pipeline_config: Arc<PipelineConfig>,
}

impl ProcessingContext {
    pub async fn new(queue: Arc<JobQueue>) -> WorkerResult<Self> {
        let firestore = FirestoreClient::from_env().await.map_err(vlearn_core::CoreError::from)?;

        let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let progress = ProgressChannel::new(&redis_url)?;

        let llm = LlmClient::from_env().map_err(vlearn_core::CoreError::from)?;

        Ok(Self {
            firestore: Arc::new(firestore),
            queue,
            progress: Arc::new(progress),
            llm: Arc::new(llm),
            intake_config: Arc::new(IntakeConfig::from_env()),
            pipeline_config: Arc::new(PipelineConfig::from_env()),
        })
    }

    /// Build a fresh per-entity repository bundle over the shared Firestore
    /// client. Cheap: `FirestoreClient` wraps an `Arc`'d inner connection.
    pub fn store(&self) -> Store {
        Store::new((*self.firestore).clone())
    }
}
