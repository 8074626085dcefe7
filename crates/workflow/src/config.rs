use std::time::Duration;

/// Tuning for the onboarding workflow, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Platforms provisioned concurrently within one batch (default: `4`).
    pub platform_concurrency: usize,
    /// Limit applied to every individual remote call (default: `30s`).
    pub platform_timeout: Duration,
    /// Freelancers processed concurrently by bulk operations (default: `4`).
    pub bulk_concurrency: usize,
}

impl WorkflowConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default |
    /// |-------------------------|---------|
    /// | `PLATFORM_CONCURRENCY`  | `4`     |
    /// | `PLATFORM_TIMEOUT_SECS` | `30`    |
    /// | `BULK_CONCURRENCY`      | `4`     |
    pub fn from_env() -> Self {
        let platform_concurrency: usize = std::env::var("PLATFORM_CONCURRENCY")
            .unwrap_or_else(|_| "4".into())
            .parse()
            .expect("PLATFORM_CONCURRENCY must be a valid usize");

        let platform_timeout_secs: u64 = std::env::var("PLATFORM_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("PLATFORM_TIMEOUT_SECS must be a valid u64");

        let bulk_concurrency: usize = std::env::var("BULK_CONCURRENCY")
            .unwrap_or_else(|_| "4".into())
            .parse()
            .expect("BULK_CONCURRENCY must be a valid usize");

        Self {
            platform_concurrency: platform_concurrency.max(1),
            platform_timeout: Duration::from_secs(platform_timeout_secs),
            bulk_concurrency: bulk_concurrency.max(1),
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            platform_concurrency: 4,
            platform_timeout: Duration::from_secs(30),
            bulk_concurrency: 4,
        }
    }
}
