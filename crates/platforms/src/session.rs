//! Session type shared by the stand-in modules.
//!
//! Two optional config keys steer a session, so failure paths can be
//! exercised end to end without a real platform:
//!
//! | Key                | Values                                                          |
//! |--------------------|-----------------------------------------------------------------|
//! | `mock_behavior`    | `ok` (default), `reject_credentials`, `unreachable`, `reject_users`, `fail_delete` |
//! | `mock_latency_ms`  | delay applied before every remote call                          |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gigsync_core::platform::{FreelancerProfile, PlatformError, PlatformSession, RemoteAccount};
use gigsync_core::types::ConfigBlob;

use crate::remote::MockRemote;

pub const BEHAVIOR_KEY: &str = "mock_behavior";
pub const LATENCY_KEY: &str = "mock_latency_ms";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockBehavior {
    #[default]
    Ok,
    /// `initialize` fails as if the credentials were wrong.
    RejectCredentials,
    /// Every remote call fails as if the host were down.
    Unreachable,
    /// `create_user` is refused by the platform.
    RejectUsers,
    /// `delete_user` fails; everything else works.
    FailDelete,
}

impl MockBehavior {
    pub fn from_config(config: &ConfigBlob) -> Result<Self, PlatformError> {
        let Some(value) = config.get(BEHAVIOR_KEY) else {
            return Ok(Self::Ok);
        };
        match value.as_str() {
            Some("ok") => Ok(Self::Ok),
            Some("reject_credentials") => Ok(Self::RejectCredentials),
            Some("unreachable") => Ok(Self::Unreachable),
            Some("reject_users") => Ok(Self::RejectUsers),
            Some("fail_delete") => Ok(Self::FailDelete),
            _ => Err(PlatformError::InvalidConfig(format!(
                "unknown {BEHAVIOR_KEY} value {value}"
            ))),
        }
    }
}

pub fn latency_from_config(config: &ConfigBlob) -> Duration {
    config
        .get(LATENCY_KEY)
        .and_then(serde_json::Value::as_u64)
        .map(Duration::from_millis)
        .unwrap_or_default()
}

/// Where a session's accounts live and how its ids and URLs look.
#[derive(Debug, Clone, Copy)]
pub struct Namespace {
    pub platform: &'static str,
    pub id_prefix: &'static str,
    pub domain: &'static str,
}

pub struct MockSession {
    namespace: Namespace,
    remote: Arc<MockRemote>,
    behavior: MockBehavior,
    latency: Duration,
}

impl MockSession {
    pub fn new(
        namespace: Namespace,
        remote: Arc<MockRemote>,
        behavior: MockBehavior,
        latency: Duration,
    ) -> Self {
        Self {
            namespace,
            remote,
            behavior,
            latency,
        }
    }

    async fn round_trip(&self) -> Result<(), PlatformError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.behavior == MockBehavior::Unreachable {
            return Err(PlatformError::Unreachable(format!(
                "{} did not respond",
                self.namespace.domain
            )));
        }
        Ok(())
    }
}

/// Common `initialize` path: required fields, behavior switches, then a
/// session bound to `namespace`.
pub fn open(
    namespace: Namespace,
    remote: &Arc<MockRemote>,
    required: &[&str],
    config: &ConfigBlob,
) -> Result<Box<dyn PlatformSession>, PlatformError> {
    let missing = gigsync_core::config_shape::missing_required_fields(config, required);
    if !missing.is_empty() {
        return Err(PlatformError::InvalidConfig(format!(
            "missing {}",
            missing.join(", ")
        )));
    }
    let behavior = MockBehavior::from_config(config)?;
    if behavior == MockBehavior::RejectCredentials {
        return Err(PlatformError::Unauthorized(format!(
            "{} rejected the supplied credentials",
            namespace.domain
        )));
    }
    Ok(Box::new(MockSession::new(
        namespace,
        Arc::clone(remote),
        behavior,
        latency_from_config(config),
    )))
}

#[async_trait]
impl PlatformSession for MockSession {
    async fn test_connection(&self) -> Result<(), PlatformError> {
        self.round_trip().await
    }

    async fn create_user(&self, profile: &FreelancerProfile) -> Result<RemoteAccount, PlatformError> {
        self.round_trip().await?;
        if self.behavior == MockBehavior::RejectUsers {
            return Err(PlatformError::Rejected(format!(
                "{} refused to create an account for {}",
                self.namespace.domain, profile.email
            )));
        }
        let account = self.remote.create(
            self.namespace.platform,
            self.namespace.id_prefix,
            self.namespace.domain,
            profile,
        )?;
        tracing::debug!(
            platform_id = self.namespace.platform,
            remote_id = %account.remote_id,
            "Remote account created"
        );
        Ok(account)
    }

    async fn update_user(
        &self,
        remote_id: &str,
        profile: &FreelancerProfile,
    ) -> Result<(), PlatformError> {
        self.round_trip().await?;
        self.remote.update(self.namespace.platform, remote_id, profile)
    }

    async fn delete_user(&self, remote_id: &str) -> Result<(), PlatformError> {
        self.round_trip().await?;
        if self.behavior == MockBehavior::FailDelete {
            return Err(PlatformError::Unreachable(format!(
                "{} failed to delete {remote_id}",
                self.namespace.domain
            )));
        }
        self.remote.delete(self.namespace.platform, remote_id)
    }

    async fn get_user(&self, remote_id: &str) -> Result<RemoteAccount, PlatformError> {
        self.round_trip().await?;
        self.remote.get(self.namespace.platform, remote_id)
    }

    async fn list_users(&self) -> Result<Vec<RemoteAccount>, PlatformError> {
        self.round_trip().await?;
        Ok(self.remote.list(self.namespace.platform))
    }
}
