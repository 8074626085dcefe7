//! Transient progress of one onboarding batch.
//!
//! A batch covers one freelancer and one or more platforms. Counters only
//! ever grow and `completed + failed` never exceeds `total`, whatever order
//! platform outcomes arrive in.

use serde::{Deserialize, Serialize};

use crate::status::ProgressStatus;
use crate::types::{EntityId, PlatformId, Timestamp};

/// One failed platform in a batch, with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformFailure {
    pub platform: PlatformId,
    pub error: String,
}

/// Progress snapshot for a freelancer's current or most recent batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingProgress {
    pub entity_id: EntityId,
    pub total_platforms: usize,
    pub completed_platforms: usize,
    pub failed_platforms: usize,
    pub current_platform: Option<PlatformId>,
    pub status: ProgressStatus,
    pub errors: Vec<PlatformFailure>,
    pub started_at: Timestamp,
    pub finished_at: Option<Timestamp>,
}

impl OnboardingProgress {
    /// Begin a batch over `total` platforms.
    pub fn start(entity_id: EntityId, total: usize) -> Self {
        Self {
            entity_id,
            total_platforms: total,
            completed_platforms: 0,
            failed_platforms: 0,
            current_platform: None,
            status: ProgressStatus::Processing,
            errors: Vec::new(),
            started_at: chrono::Utc::now(),
            finished_at: None,
        }
    }

    /// Platforms with a recorded outcome so far.
    pub fn processed(&self) -> usize {
        self.completed_platforms + self.failed_platforms
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, ProgressStatus::Completed | ProgressStatus::Failed)
    }

    /// Mark `platform` as the one in flight.
    pub fn begin_platform(&mut self, platform: &str) {
        self.current_platform = Some(platform.to_string());
    }

    /// Count a successful platform. Returns `false` (and changes nothing) if
    /// the batch already accounts for every platform.
    pub fn record_success(&mut self, platform: &str) -> bool {
        if self.processed() >= self.total_platforms {
            return false;
        }
        self.current_platform = Some(platform.to_string());
        self.completed_platforms += 1;
        true
    }

    /// Count a failed platform and keep its message.
    pub fn record_failure(&mut self, platform: &str, error: impl ToString) -> bool {
        if self.processed() >= self.total_platforms {
            return false;
        }
        self.current_platform = Some(platform.to_string());
        self.failed_platforms += 1;
        self.errors.push(PlatformFailure {
            platform: platform.to_string(),
            error: error.to_string(),
        });
        true
    }

    /// Close the batch.
    ///
    /// Errors are reordered to follow `order` (the requested platform order)
    /// so the final snapshot does not depend on completion order.
    pub fn finish(&mut self, order: &[PlatformId]) {
        self.errors.sort_by_key(|failure| {
            order
                .iter()
                .position(|p| *p == failure.platform)
                .unwrap_or(usize::MAX)
        });
        self.current_platform = None;
        self.status = if self.failed_platforms == 0 {
            ProgressStatus::Completed
        } else {
            ProgressStatus::Failed
        };
        self.finished_at = Some(chrono::Utc::now());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
