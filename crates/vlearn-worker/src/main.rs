//! Video-learning pipeline worker binary.

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vlearn_queue::JobQueue;
use vlearn_worker::{JobExecutor, WorkerConfig};

#[tokio::main]
async fn main() {
    rustls::crypto::ring::default_provider().install_default().expect("Failed to install rustls crypto provider");

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(EnvFilter::from_default_env().add_directive("vlearn=info".parse().unwrap()))
        .init();

    info!("Starting vlearn-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let queue = match JobQueue::from_env() {
        Ok(q) => q,
        Err(e) => {
            error!("Failed to create job queue: {}", e);
            std::process::exit(1);
        }
    };

    let executor = match JobExecutor::new(config, queue) {
        Ok(e) => std::sync::Arc::new(e),
        Err(e) => {
            error!("Failed to create job executor: {}", e);
            std::process::exit(1);
        }
    };

    let run_handle = {
        let executor = executor.clone();
        tokio::spawn(async move { executor.run().await })
    };

    tokio::signal::ctrl_c().await.ok();
    info!("Received shutdown signal");
    executor.shutdown();

    match run_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Executor error: {}", e),
        Err(e) => error!("Executor task panicked: {}", e),
    }

    info!("Worker shutdown complete");
}
