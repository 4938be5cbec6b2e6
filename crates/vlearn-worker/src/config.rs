//! Worker configuration.

use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent jobs.
    pub max_concurrent_jobs: usize,
    /// Graceful shutdown timeout.
    pub shutdown_timeout: Duration,
    /// How often the worker scans for orphaned pending jobs.
    pub claim_interval: Duration,
    /// Minimum idle time before a pending job can be claimed (crash recovery).
    pub claim_min_idle: Duration,
    /// Interval for refreshing job ownership while processing, so the
    /// claim scan doesn't reclaim work that is still in flight.
    pub job_heartbeat_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 4,
            shutdown_timeout: Duration::from_secs(30),
            claim_interval: Duration::from_secs(60),
            claim_min_idle: Duration::from_secs(1800),
            job_heartbeat_interval: Duration::from_secs(30),
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_concurrent_jobs: env_usize("WORKER_MAX_JOBS", default.max_concurrent_jobs),
            shutdown_timeout: Duration::from_secs(env_u64("WORKER_SHUTDOWN_TIMEOUT_SECS", default.shutdown_timeout.as_secs())),
            claim_interval: Duration::from_secs(env_u64("WORKER_CLAIM_INTERVAL_SECS", default.claim_interval.as_secs())),
            claim_min_idle: Duration::from_secs(env_u64("WORKER_CLAIM_MIN_IDLE_SECS", default.claim_min_idle.as_secs())),
            job_heartbeat_interval: Duration::from_secs(
                env_u64("WORKER_JOB_HEARTBEAT_SECS", default.job_heartbeat_interval.as_secs()),
            ),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = WorkerConfig::default();
        assert_eq!(config.max_concurrent_jobs, 4);
        assert!(config.claim_min_idle > config.claim_interval);
        assert!(config.job_heartbeat_interval < config.claim_min_idle);
    }

    #[test]
    fn env_usize_falls_back_on_missing_or_invalid() {
        assert_eq!(env_usize("WORKER_CONFIG_TEST_MISSING_USIZE", 7), 7);
        std::env::set_var("WORKER_CONFIG_TEST_BAD_USIZE", "not-a-number");
        assert_eq!(env_usize("WORKER_CONFIG_TEST_BAD_USIZE", 7), 7);
        std::env::remove_var("WORKER_CONFIG_TEST_BAD_USIZE");
    }

    #[test]
    fn env_u64_parses_present_value() {
        std::env::set_var("WORKER_CONFIG_TEST_U64", "42");
        assert_eq!(env_u64("WORKER_CONFIG_TEST_U64", 1), 42);
        std::env::remove_var("WORKER_CONFIG_TEST_U64");
    }
}
