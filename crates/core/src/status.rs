//! Lifecycle status enums and their transition rules.
//!
//! Statuses are persisted as lowercase strings (`"active"`, `"failed"`, ...),
//! so each enum round-trips through serde and [`std::str::FromStr`] with the
//! same names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// AssociationStatus
// ---------------------------------------------------------------------------

/// Status of one freelancer's account on one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssociationStatus {
    Pending,
    Provisioning,
    Active,
    Failed,
    Deactivated,
}

impl AssociationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Provisioning => "provisioning",
            Self::Active => "active",
            Self::Failed => "failed",
            Self::Deactivated => "deactivated",
        }
    }

    /// Whether a provisioning run may start from this status.
    ///
    /// `provisioning` is included: a row left there by an interrupted batch
    /// has an unknown remote outcome and is retried by the next batch.
    pub fn is_provisionable(self) -> bool {
        matches!(
            self,
            Self::Pending | Self::Provisioning | Self::Failed | Self::Deactivated
        )
    }

    /// Whether `self -> to` is a legal lifecycle step.
    pub fn can_transition_to(self, to: AssociationStatus) -> bool {
        match self {
            Self::Pending => matches!(to, Self::Provisioning),
            Self::Provisioning => matches!(to, Self::Provisioning | Self::Active | Self::Failed),
            Self::Active => matches!(to, Self::Deactivated),
            Self::Failed | Self::Deactivated => matches!(to, Self::Provisioning),
        }
    }

    /// Validate a transition, returning a [`CoreError::Conflict`] if illegal.
    pub fn validate_transition(self, to: AssociationStatus) -> Result<(), CoreError> {
        if self.can_transition_to(to) {
            Ok(())
        } else {
            Err(CoreError::Conflict(format!(
                "Invalid association transition: cannot go from '{self}' to '{to}'"
            )))
        }
    }
}

impl fmt::Display for AssociationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssociationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "provisioning" => Ok(Self::Provisioning),
            "active" => Ok(Self::Active),
            "failed" => Ok(Self::Failed),
            "deactivated" => Ok(Self::Deactivated),
            other => Err(CoreError::Validation(format!(
                "Unknown association status '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// FreelancerStatus
// ---------------------------------------------------------------------------

/// Status of the freelancer record itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreelancerStatus {
    Pending,
    Active,
    Inactive,
    Error,
}

impl FreelancerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for FreelancerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FreelancerStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "error" => Ok(Self::Error),
            other => Err(CoreError::Validation(format!(
                "Unknown freelancer status '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// ProgressStatus
// ---------------------------------------------------------------------------

/// Aggregate status of one onboarding batch.
///
/// `Failed` means "not fully successful": some platforms may still be active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    #[default]
    Idle,
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
