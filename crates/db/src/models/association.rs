//! Freelancer ↔ platform association row and its lifecycle.
//!
//! The `mark_*` methods are the only way status changes; each validates the
//! transition and keeps `remote_account_id` consistent: set while `active`,
//! kept (for audit) once `deactivated`, cleared whenever provisioning starts.

use gigsync_core::error::CoreError;
use gigsync_core::status::AssociationStatus;
use gigsync_core::types::{EntityId, OrgId, PlatformId, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A row from the `freelancer_platforms` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreelancerPlatformAssociation {
    pub id: Uuid,
    pub freelancer_id: EntityId,
    pub organization_id: OrgId,
    pub platform_id: PlatformId,
    pub status: AssociationStatus,
    pub remote_account_id: Option<String>,
    pub last_error: Option<String>,
    pub provisioned_at: Option<Timestamp>,
    pub last_sync_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl FreelancerPlatformAssociation {
    /// A new `pending` association.
    pub fn pending(freelancer_id: EntityId, organization_id: OrgId, platform_id: &str) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Uuid::now_v7(),
            freelancer_id,
            organization_id,
            platform_id: platform_id.to_string(),
            status: AssociationStatus::Pending,
            remote_account_id: None,
            last_error: None,
            provisioned_at: None,
            last_sync_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn transition(&mut self, to: AssociationStatus) -> Result<(), CoreError> {
        self.status.validate_transition(to)?;
        self.status = to;
        self.updated_at = chrono::Utc::now();
        Ok(())
    }

    pub fn mark_provisioning(&mut self) -> Result<(), CoreError> {
        self.transition(AssociationStatus::Provisioning)?;
        self.remote_account_id = None;
        self.last_error = None;
        Ok(())
    }

    pub fn mark_active(&mut self, remote_account_id: &str) -> Result<(), CoreError> {
        self.transition(AssociationStatus::Active)?;
        let now = self.updated_at;
        self.remote_account_id = Some(remote_account_id.to_string());
        self.last_error = None;
        self.provisioned_at = Some(now);
        // create_user pushed the whole profile.
        self.last_sync_at = Some(now);
        Ok(())
    }

    pub fn mark_failed(&mut self, error: impl ToString) -> Result<(), CoreError> {
        self.transition(AssociationStatus::Failed)?;
        self.remote_account_id = None;
        self.last_error = Some(error.to_string());
        Ok(())
    }

    /// `remote_account_id` is retained for audit only.
    pub fn mark_deactivated(&mut self) -> Result<(), CoreError> {
        self.transition(AssociationStatus::Deactivated)?;
        self.last_error = None;
        Ok(())
    }

    /// Record a successful profile push without changing status.
    pub fn mark_synced(&mut self) {
        let now = chrono::Utc::now();
        self.last_sync_at = Some(now);
        self.updated_at = now;
    }

    /// Remote account id, only while the account is live.
    pub fn active_remote_id(&self) -> Option<&str> {
        match self.status {
            AssociationStatus::Active => self.remote_account_id.as_deref(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
