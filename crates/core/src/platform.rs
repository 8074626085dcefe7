//! External platform integration contract.
//!
//! A [`PlatformModule`] describes one external platform and turns a
//! configuration blob into a [`PlatformSession`]. Everything the module
//! derives from its configuration (endpoints, tokens, HTTP clients) lives in
//! the session, so a module instance holds no per-organization state and is
//! shared freely across concurrent workflows.
//!
//! Per-platform failures surface as [`PlatformError`] (remote integration
//! errors) or [`ProvisionError`] (the full per-platform failure taxonomy
//! recorded by the onboarding workflow).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config_shape;
use crate::types::{ConfigBlob, EntityId, Timestamp};

// ---------------------------------------------------------------------------
// Data
// ---------------------------------------------------------------------------

/// Broad grouping used when listing platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformCategory {
    Marketplace,
    FileTransfer,
    Payments,
    Communication,
    Other,
}

/// Descriptive metadata for a platform module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformMetadata {
    /// Stable identifier, used as the registry key and in persisted rows.
    pub id: String,
    pub display_name: String,
    pub category: PlatformCategory,
    /// Whether the platform needs credentials before any call succeeds.
    pub requires_auth: bool,
    pub description: String,
}

/// The freelancer data pushed to a platform when creating or updating an
/// account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreelancerProfile {
    pub entity_id: EntityId,
    pub full_name: String,
    pub email: String,
    pub headline: Option<String>,
    pub skills: Vec<String>,
    pub country: Option<String>,
}

/// An account as it exists on the remote platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteAccount {
    pub remote_id: String,
    pub email: String,
    pub display_name: String,
    pub profile_url: Option<String>,
    pub created_at: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by a platform module or session.
///
/// Messages are passed through verbatim into association `last_error` and
/// the batch error list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("credentials rejected: {0}")]
    Unauthorized(String),

    #[error("platform unreachable: {0}")]
    Unreachable(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("remote account not found: {0}")]
    NotFound(String),

    #[error("timeout")]
    Timeout,
}

/// Why provisioning a single platform for a single freelancer did not
/// succeed.
///
/// Configuration variants are terminal without operator action; remote
/// variants are retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvisionError {
    #[error("platform not enabled")]
    NotEnabled,

    #[error("platform module not found")]
    ModuleNotFound,

    #[error("platform not configured")]
    NotConfigured,

    #[error("missing required configuration fields: {}", .0.join(", "))]
    InvalidConfig(Vec<String>),

    #[error(transparent)]
    Remote(#[from] PlatformError),

    #[error("cancelled")]
    Cancelled,
}

impl ProvisionError {
    /// Whether the operator has to change configuration before a retry can
    /// succeed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NotEnabled | Self::ModuleNotFound | Self::NotConfigured | Self::InvalidConfig(_)
        ) || matches!(self, Self::Remote(PlatformError::InvalidConfig(_)))
    }

    pub fn is_retryable(&self) -> bool {
        !self.is_configuration()
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// One external platform integration.
///
/// Implementations must not keep mutable state across calls; everything
/// derived from a configuration belongs to the [`PlatformSession`] returned
/// by [`initialize`](PlatformModule::initialize).
#[async_trait]
pub trait PlatformModule: Send + Sync {
    fn metadata(&self) -> &PlatformMetadata;

    fn id(&self) -> &str {
        &self.metadata().id
    }

    /// Config keys that must be present and non-empty.
    fn required_config_fields(&self) -> &[&'static str];

    /// Cheap, offline shape check of a configuration blob.
    fn validate_config(&self, config: &ConfigBlob) -> bool {
        config_shape::missing_required_fields(config, self.required_config_fields()).is_empty()
    }

    /// Build a session from `config`. May contact the platform.
    async fn initialize(&self, config: &ConfigBlob)
        -> Result<Box<dyn PlatformSession>, PlatformError>;
}

/// A configured connection to one platform.
#[async_trait]
pub trait PlatformSession: Send + Sync {
    async fn test_connection(&self) -> Result<(), PlatformError>;

    async fn create_user(&self, profile: &FreelancerProfile)
        -> Result<RemoteAccount, PlatformError>;

    async fn update_user(
        &self,
        remote_id: &str,
        profile: &FreelancerProfile,
    ) -> Result<(), PlatformError>;

    async fn delete_user(&self, remote_id: &str) -> Result<(), PlatformError>;

    async fn get_user(&self, remote_id: &str) -> Result<RemoteAccount, PlatformError>;

    async fn list_users(&self) -> Result<Vec<RemoteAccount>, PlatformError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
