//! Application state.

use std::sync::Arc;

use vlearn_core::config::PipelineConfig;
use vlearn_core::Store;
use vlearn_llm::LlmClient;
use vlearn_queue::{JobQueue, ProgressChannel};
use vlearn_store::FirestoreClient;
use vlearn_transcribe::IntakeConfig;

use crate::config::ApiConfig;

/// Shared application state.
///
/// Holds one long-lived handle per external collaborator named in §1's
/// "persistence port, LLM port, ... identity/credit port" plus the two
/// config blocks that size the pipeline. Handlers build the relevant
/// generator/orchestrator type from these handles per request; nothing
/// here is itself business logic.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub firestore: Arc<FirestoreClient>,
    pub queue: Arc<JobQueue>,
    pub progress: Arc<ProgressChannel>,
    pub llm: Arc<LlmClient>,
    pub intake_config: Arc<IntakeConfig>,
    pub pipeline_config: Arc<PipelineConfig>,
}

impl AppState {
    /// Create new application state from environment-sourced configuration.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let firestore = FirestoreClient::from_env().await?;
        let queue = JobQueue::from_env()?;

        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let progress = ProgressChannel::new(&redis_url)?;

        let llm = LlmClient::from_env()?;

        Ok(Self {
            config,
            firestore: Arc::new(firestore),
            queue: Arc::new(queue),
            progress: Arc::new(progress),
            llm: Arc::new(llm),
            intake_config: Arc::new(IntakeConfig::from_env()),
            pipeline_config: Arc::new(PipelineConfig::from_env()),
        })
    }

    /// Build a fresh per-entity repository bundle over the shared Firestore
    /// client. Cheap: `FirestoreClient` wraps an `Arc`'d inner connection, so
    /// this only constructs repository wrappers, not new connections.
    pub fn store(&self) -> Store {
        Store::new((*self.firestore).clone())
    }
}
