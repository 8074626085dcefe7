use std::str::FromStr;
use std::time::Duration;

use gigsync_workflow::WorkflowConfig;

/// Headroom on top of the slowest single-platform request.
const REQUEST_TIMEOUT_MARGIN_SECS: u64 = 5;

/// HTTP server settings loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// Whole-request limit in seconds (default: `30`). Raised by
    /// [`fit_to_workflow`](Self::fit_to_workflow) when platform calls need longer.
    pub request_timeout_secs: u64,
}

fn env_or<T>(key: &str, default: &str) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).unwrap_or_else(|_| default.into());
    raw.parse()
        .unwrap_or_else(|e| panic!("{key} must be a valid {}: {e}", std::any::type_name::<T>()))
}

impl ServerConfig {
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `3000`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("PORT", "3000"),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", "30"),
        }
    }

    /// Shortest request timeout that lets one platform finish: `initialize`
    /// and `create_user` are each bounded by the platform timeout.
    pub fn minimum_request_timeout(workflow: &WorkflowConfig) -> u64 {
        workflow.platform_timeout.as_secs().saturating_mul(2) + REQUEST_TIMEOUT_MARGIN_SECS
    }

    /// Raise `request_timeout_secs` so a toggle or onboarding request is not
    /// answered with 408 while its platform calls are still within their own
    /// limits.
    pub fn fit_to_workflow(mut self, workflow: &WorkflowConfig) -> Self {
        let minimum = Self::minimum_request_timeout(workflow);
        if self.request_timeout_secs < minimum {
            tracing::warn!(
                configured = self.request_timeout_secs,
                minimum,
                "REQUEST_TIMEOUT_SECS below platform call budget, raising it"
            );
            self.request_timeout_secs = minimum;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
