//! Onboarding workflow engine.
//!
//! Drives a freelancer through account provisioning on a set of platforms:
//!
//! 1. Load the freelancer from the store.
//! 2. Skip platforms that are not enabled for the organization.
//! 3. Skip platforms with no registered module or an unusable config.
//! 4. Create or reuse the association row and mark it `provisioning`.
//! 5. `initialize` the module, then 6. `create_user`; the row ends `active`
//!    or `failed`.
//! 7. Update the batch progress after every platform.
//!
//! Platforms run with bounded concurrency and each remote call has its own
//! timeout. One platform's failure never stops the others; a store failure
//! stops the batch. Operations on the same freelancer are serialized.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use gigsync_core::locks::KeyedLocks;
use gigsync_core::platform::{FreelancerProfile, PlatformError, ProvisionError};
use gigsync_core::progress::{OnboardingProgress, PlatformFailure};
use gigsync_core::registry::PlatformRegistry;
use gigsync_core::status::{AssociationStatus, FreelancerStatus};
use gigsync_core::types::{EntityId, OrgId, PlatformId};
use gigsync_db::models::{Freelancer, FreelancerPlatformAssociation};
use gigsync_db::repositories::FreelancerRepo;
use gigsync_db::RecordStore;
use gigsync_events::{EventBus, StatusEvent, StatusSynchronizer};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::association_store::AssociationStore;
use crate::config::WorkflowConfig;
use crate::config_store::ConfigurationStore;
use crate::error::{WorkflowError, WorkflowResult};
use crate::tester::{bounded, preflight, ConnectionTester};

/// Result of a single-platform toggle or deactivation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToggleOutcome {
    Activated {
        association: FreelancerPlatformAssociation,
    },
    /// Provisioning was attempted and did not succeed. `association` is
    /// `None` when the platform was rejected before a row was needed.
    ProvisionFailed {
        association: Option<FreelancerPlatformAssociation>,
        error: String,
    },
    Deactivated {
        association: FreelancerPlatformAssociation,
    },
    /// Nothing to do in the current state.
    Unchanged {
        association: Option<FreelancerPlatformAssociation>,
    },
}

impl ToggleOutcome {
    pub fn association(&self) -> Option<&FreelancerPlatformAssociation> {
        match self {
            Self::Activated { association } | Self::Deactivated { association } => Some(association),
            Self::ProvisionFailed { association, .. } | Self::Unchanged { association } => {
                association.as_ref()
            }
        }
    }
}

/// Outcome of pushing a profile update to every active platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub synced: Vec<PlatformId>,
    pub failed: Vec<PlatformFailure>,
}

enum PlatformOutcome {
    Provisioned(FreelancerPlatformAssociation),
    AlreadyActive,
    Failed(ProvisionError),
}

/// Platform ids in first-seen order without repeats.
fn distinct(platform_ids: &[PlatformId]) -> Vec<PlatformId> {
    let mut seen = HashSet::new();
    platform_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

fn rejected(entity_id: EntityId, platform_id: &str, error: ProvisionError) -> PlatformOutcome {
    tracing::warn!(
        entity_id = %entity_id,
        platform_id,
        error = %error,
        "Platform skipped"
    );
    PlatformOutcome::Failed(error)
}

pub struct WorkflowEngine {
    store: Arc<dyn RecordStore>,
    registry: Arc<PlatformRegistry>,
    configs: Arc<ConfigurationStore>,
    associations: Arc<AssociationStore>,
    sync: Arc<StatusSynchronizer>,
    config: WorkflowConfig,
    entity_locks: KeyedLocks<EntityId>,
    progress: RwLock<HashMap<EntityId, OnboardingProgress>>,
}

impl WorkflowEngine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        registry: Arc<PlatformRegistry>,
        bus: Arc<EventBus>,
        config: WorkflowConfig,
    ) -> Self {
        let sync = Arc::new(StatusSynchronizer::new(Arc::clone(&store), bus));
        let configs = Arc::new(ConfigurationStore::new(Arc::clone(&store), Arc::clone(&sync)));
        let associations = Arc::new(AssociationStore::new(Arc::clone(&store), Arc::clone(&sync)));
        Self {
            store,
            registry,
            configs,
            associations,
            sync,
            config,
            entity_locks: KeyedLocks::new(),
            progress: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<PlatformRegistry> {
        &self.registry
    }

    pub fn configurations(&self) -> &Arc<ConfigurationStore> {
        &self.configs
    }

    pub fn associations(&self) -> &Arc<AssociationStore> {
        &self.associations
    }

    pub fn synchronizer(&self) -> &Arc<StatusSynchronizer> {
        &self.sync
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn tester(&self) -> ConnectionTester {
        ConnectionTester::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.configs),
            self.config.platform_timeout,
        )
    }

    /// Latest progress snapshot for the freelancer's current or last batch.
    pub async fn progress(&self, entity_id: EntityId) -> Option<OnboardingProgress> {
        self.progress.read().await.get(&entity_id).cloned()
    }

    async fn publish_progress(&self, progress: &OnboardingProgress) {
        self.progress
            .write()
            .await
            .insert(progress.entity_id, progress.clone());
        self.sync.bus().publish(StatusEvent::progress(progress));
    }

    async fn load_freelancer(&self, entity_id: EntityId) -> WorkflowResult<Freelancer> {
        FreelancerRepo::find_by_id(&*self.store, entity_id)
            .await?
            .ok_or(WorkflowError::EntityNotFound(entity_id))
    }

    // -- onboarding ---------------------------------------------------------

    /// Provision `platform_ids` for a freelancer and return the final
    /// progress.
    pub async fn onboard(
        &self,
        entity_id: EntityId,
        platform_ids: &[PlatformId],
    ) -> WorkflowResult<OnboardingProgress> {
        self.onboard_with_cancel(entity_id, platform_ids, CancellationToken::new())
            .await
    }

    /// [`onboard`](Self::onboard) that stops when `cancel` fires.
    ///
    /// Platforms not yet started are skipped; platforms interrupted in
    /// flight keep their association in `provisioning` since the remote
    /// outcome is unknown. Both are recorded with error `"cancelled"` and
    /// the call returns [`WorkflowError::Cancelled`].
    pub async fn onboard_with_cancel(
        &self,
        entity_id: EntityId,
        platform_ids: &[PlatformId],
        cancel: CancellationToken,
    ) -> WorkflowResult<OnboardingProgress> {
        let _entity = self.entity_locks.lock(&entity_id).await;
        let freelancer = self.load_freelancer(entity_id).await?;
        let profile = freelancer.profile();
        let order = distinct(platform_ids);
        // Fired on a store failure so no further platforms are started.
        let halt = cancel.child_token();

        let mut progress = OnboardingProgress::start(entity_id, order.len());
        self.publish_progress(&progress).await;
        tracing::info!(entity_id = %entity_id, platforms = order.len(), "Onboarding started");

        let mut outcomes = stream::iter(order.iter().cloned())
            .map(|platform_id| {
                let (freelancer, profile, cancel, halt) = (&freelancer, &profile, &cancel, &halt);
                async move {
                    let outcome = self
                        .provision(freelancer, &platform_id, profile, cancel, halt)
                        .await;
                    (platform_id, outcome)
                }
            })
            .buffer_unordered(self.config.platform_concurrency.max(1));

        let mut fatal = None;
        let mut interrupted = false;
        while let Some((platform_id, outcome)) = outcomes.next().await {
            match outcome {
                Ok(PlatformOutcome::Provisioned(_) | PlatformOutcome::AlreadyActive) => {
                    progress.record_success(&platform_id);
                }
                Ok(PlatformOutcome::Failed(error)) => {
                    interrupted |= error == ProvisionError::Cancelled;
                    progress.record_failure(&platform_id, &error);
                }
                Err(e) => {
                    tracing::error!(
                        entity_id = %entity_id,
                        platform_id = %platform_id,
                        error = %e,
                        "Store failure, halting onboarding"
                    );
                    halt.cancel();
                    progress.record_failure(&platform_id, &e);
                    fatal.get_or_insert(e);
                }
            }
            self.publish_progress(&progress).await;
        }
        drop(outcomes);

        progress.finish(&order);
        self.publish_progress(&progress).await;

        if let Some(e) = fatal {
            return Err(e);
        }

        let entity_status = if progress.completed_platforms > 0 {
            Some(FreelancerStatus::Active)
        } else if interrupted || order.is_empty() {
            None
        } else {
            Some(FreelancerStatus::Error)
        };
        if let Some(status) = entity_status.filter(|s| *s != freelancer.status) {
            if FreelancerRepo::update_status(&*self.store, entity_id, status)
                .await?
                .is_none()
            {
                tracing::warn!(entity_id = %entity_id, "Freelancer vanished during onboarding");
            }
        }

        tracing::info!(
            entity_id = %entity_id,
            completed = progress.completed_platforms,
            failed = progress.failed_platforms,
            status = %progress.status,
            "Onboarding finished"
        );

        if interrupted {
            return Err(WorkflowError::Cancelled);
        }
        Ok(progress)
    }

    /// Steps 2–6 for one platform. `Err` only for store failures.
    async fn provision(
        &self,
        freelancer: &Freelancer,
        platform_id: &str,
        profile: &FreelancerProfile,
        cancel: &CancellationToken,
        halt: &CancellationToken,
    ) -> WorkflowResult<PlatformOutcome> {
        let entity_id = freelancer.id;
        if halt.is_cancelled() {
            return Ok(PlatformOutcome::Failed(ProvisionError::Cancelled));
        }

        let configuration = match self
            .configs
            .get(freelancer.organization_id, platform_id)
            .await?
        {
            Some(configuration) if configuration.enabled => configuration,
            _ => return Ok(rejected(entity_id, platform_id, ProvisionError::NotEnabled)),
        };
        let Some(module) = self.registry.get(platform_id) else {
            return Ok(rejected(entity_id, platform_id, ProvisionError::ModuleNotFound));
        };
        if let Err(error) = preflight(module.as_ref(), &configuration.config) {
            return Ok(rejected(entity_id, platform_id, error));
        }

        let _row = self.associations.lock(entity_id, platform_id).await;
        let mut association = self
            .associations
            .get_or_create(entity_id, freelancer.organization_id, platform_id)
            .await?;
        if association.status == AssociationStatus::Active {
            tracing::debug!(entity_id = %entity_id, platform_id, "Already active");
            return Ok(PlatformOutcome::AlreadyActive);
        }
        association.mark_provisioning()?;
        let mut association = self.associations.save(&association).await?;

        let limit = self.config.platform_timeout;
        let remote = async {
            let session = bounded(limit, module.initialize(&configuration.config)).await?;
            bounded(limit, session.create_user(profile)).await
        };
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!(
                    entity_id = %entity_id,
                    platform_id,
                    "Provisioning interrupted, association left provisioning"
                );
                return Ok(PlatformOutcome::Failed(ProvisionError::Cancelled));
            }
            result = remote => result,
        };

        match result {
            Ok(account) => {
                association.mark_active(&account.remote_id)?;
                let saved = self.associations.save(&association).await?;
                tracing::info!(
                    entity_id = %entity_id,
                    platform_id,
                    remote_id = %account.remote_id,
                    "Platform account provisioned"
                );
                Ok(PlatformOutcome::Provisioned(saved))
            }
            Err(error) => {
                let error = ProvisionError::from(error);
                association.mark_failed(&error)?;
                self.associations.save(&association).await?;
                tracing::warn!(
                    entity_id = %entity_id,
                    platform_id,
                    error = %error,
                    "Platform provisioning failed"
                );
                Ok(PlatformOutcome::Failed(error))
            }
        }
    }

    // -- single-platform operations -----------------------------------------

    /// Delete the remote account and mark the association `deactivated`.
    ///
    /// No-op unless the association is `active`. If the remote deletion
    /// fails the association stays `active` and the error is returned.
    pub async fn deactivate(
        &self,
        entity_id: EntityId,
        platform_id: &str,
    ) -> WorkflowResult<ToggleOutcome> {
        let _entity = self.entity_locks.lock(&entity_id).await;
        let freelancer = self.load_freelancer(entity_id).await?;
        self.deactivate_locked(&freelancer, platform_id).await
    }

    async fn deactivate_locked(
        &self,
        freelancer: &Freelancer,
        platform_id: &str,
    ) -> WorkflowResult<ToggleOutcome> {
        let _row = self.associations.lock(freelancer.id, platform_id).await;
        let Some(mut association) = self.associations.get(freelancer.id, platform_id).await? else {
            return Ok(ToggleOutcome::Unchanged { association: None });
        };
        let Some(remote_id) = association.active_remote_id().map(str::to_string) else {
            return Ok(ToggleOutcome::Unchanged {
                association: Some(association),
            });
        };

        let failure = |source: ProvisionError| WorkflowError::Deactivation {
            platform: platform_id.to_string(),
            source,
        };
        let module = self
            .registry
            .get(platform_id)
            .ok_or_else(|| failure(ProvisionError::ModuleNotFound))?;
        // Credentials are needed even if the platform has since been disabled.
        let configuration = self
            .configs
            .get(freelancer.organization_id, platform_id)
            .await?
            .ok_or_else(|| failure(ProvisionError::NotConfigured))?;
        preflight(module.as_ref(), &configuration.config).map_err(failure)?;

        let limit = self.config.platform_timeout;
        let result = async {
            let session = bounded(limit, module.initialize(&configuration.config)).await?;
            bounded(limit, session.delete_user(&remote_id)).await
        }
        .await;

        match result {
            // Already gone remotely: nothing left to protect.
            Ok(()) | Err(PlatformError::NotFound(_)) => {
                association.mark_deactivated()?;
                let saved = self.associations.save(&association).await?;
                tracing::info!(
                    entity_id = %freelancer.id,
                    platform_id,
                    remote_id = %remote_id,
                    "Platform account deactivated"
                );
                Ok(ToggleOutcome::Deactivated { association: saved })
            }
            Err(error) => {
                tracing::warn!(
                    entity_id = %freelancer.id,
                    platform_id,
                    error = %error,
                    "Remote deletion failed, association stays active"
                );
                Err(failure(ProvisionError::Remote(error)))
            }
        }
    }

    /// Bring one platform to the desired state.
    ///
    /// | desired | current                              | action        |
    /// |---------|--------------------------------------|---------------|
    /// | on      | none, pending, failed, deactivated   | provision     |
    /// | on      | active, provisioning                 | nothing       |
    /// | off     | active                               | deactivate    |
    /// | off     | anything else                        | nothing       |
    pub async fn retry_or_toggle(
        &self,
        entity_id: EntityId,
        platform_id: &str,
        desired_enabled: bool,
    ) -> WorkflowResult<ToggleOutcome> {
        let _entity = self.entity_locks.lock(&entity_id).await;
        let freelancer = self.load_freelancer(entity_id).await?;
        let current = self.associations.get(entity_id, platform_id).await?;

        use AssociationStatus::*;
        match (desired_enabled, current.as_ref().map(|a| a.status)) {
            (true, None | Some(Pending | Failed | Deactivated)) => {
                self.provision_single(&freelancer, platform_id).await
            }
            (false, Some(Active)) => self.deactivate_locked(&freelancer, platform_id).await,
            _ => Ok(ToggleOutcome::Unchanged {
                association: current,
            }),
        }
    }

    /// Provision one platform, reported as a one-platform batch.
    async fn provision_single(
        &self,
        freelancer: &Freelancer,
        platform_id: &str,
    ) -> WorkflowResult<ToggleOutcome> {
        let mut progress = OnboardingProgress::start(freelancer.id, 1);
        progress.begin_platform(platform_id);
        self.publish_progress(&progress).await;

        let never = CancellationToken::new();
        let outcome = self
            .provision(freelancer, platform_id, &freelancer.profile(), &never, &never)
            .await;

        match &outcome {
            Ok(PlatformOutcome::Provisioned(_) | PlatformOutcome::AlreadyActive) => {
                progress.record_success(platform_id);
            }
            Ok(PlatformOutcome::Failed(error)) => {
                progress.record_failure(platform_id, error);
            }
            Err(e) => {
                progress.record_failure(platform_id, e);
            }
        }
        progress.finish(&[platform_id.to_string()]);
        self.publish_progress(&progress).await;

        match outcome? {
            PlatformOutcome::Provisioned(association) => {
                if freelancer.status != FreelancerStatus::Active {
                    FreelancerRepo::update_status(&*self.store, freelancer.id, FreelancerStatus::Active)
                        .await?;
                }
                Ok(ToggleOutcome::Activated { association })
            }
            PlatformOutcome::AlreadyActive => Ok(ToggleOutcome::Unchanged {
                association: self.associations.get(freelancer.id, platform_id).await?,
            }),
            PlatformOutcome::Failed(error) => Ok(ToggleOutcome::ProvisionFailed {
                association: self.associations.get(freelancer.id, platform_id).await?,
                error: error.to_string(),
            }),
        }
    }

    // -- profile sync -------------------------------------------------------

    /// Push the freelancer's current profile to every active platform
    /// account and stamp `last_sync_at` on success.
    pub async fn sync_profile(&self, entity_id: EntityId) -> WorkflowResult<SyncReport> {
        let _entity = self.entity_locks.lock(&entity_id).await;
        let freelancer = self.load_freelancer(entity_id).await?;
        let profile = freelancer.profile();
        let mut report = SyncReport::default();

        for mut association in self.associations.list_for_entity(entity_id).await? {
            let Some(remote_id) = association.active_remote_id().map(str::to_string) else {
                continue;
            };
            let platform_id = association.platform_id.clone();
            let _row = self.associations.lock(entity_id, &platform_id).await;

            match self
                .push_profile(freelancer.organization_id, &platform_id, &remote_id, &profile)
                .await?
            {
                Ok(()) => {
                    association.mark_synced();
                    self.associations.save(&association).await?;
                    report.synced.push(platform_id);
                }
                Err(error) => {
                    tracing::warn!(
                        entity_id = %entity_id,
                        platform_id = %platform_id,
                        error = %error,
                        "Profile sync failed"
                    );
                    report.failed.push(PlatformFailure {
                        platform: platform_id,
                        error: error.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    async fn push_profile(
        &self,
        organization_id: OrgId,
        platform_id: &str,
        remote_id: &str,
        profile: &FreelancerProfile,
    ) -> WorkflowResult<Result<(), ProvisionError>> {
        let Some(module) = self.registry.get(platform_id) else {
            return Ok(Err(ProvisionError::ModuleNotFound));
        };
        let Some(configuration) = self.configs.get(organization_id, platform_id).await? else {
            return Ok(Err(ProvisionError::NotConfigured));
        };
        if let Err(error) = preflight(module.as_ref(), &configuration.config) {
            return Ok(Err(error));
        }

        let limit = self.config.platform_timeout;
        let result = async {
            let session = bounded(limit, module.initialize(&configuration.config)).await?;
            bounded(limit, session.update_user(remote_id, profile)).await
        }
        .await;
        Ok(result.map_err(ProvisionError::from))
    }

    // -- freelancer status and queries --------------------------------------

    /// Set the freelancer's own status. Associations are left untouched.
    pub async fn set_entity_status(
        &self,
        entity_id: EntityId,
        status: FreelancerStatus,
    ) -> WorkflowResult<Freelancer> {
        let _entity = self.entity_locks.lock(&entity_id).await;
        let freelancer = FreelancerRepo::update_status(&*self.store, entity_id, status)
            .await?
            .ok_or(WorkflowError::EntityNotFound(entity_id))?;
        tracing::info!(entity_id = %entity_id, status = %status, "Freelancer status changed");
        Ok(freelancer)
    }

    pub async fn associations_for_entity(
        &self,
        entity_id: EntityId,
    ) -> WorkflowResult<Vec<FreelancerPlatformAssociation>> {
        self.associations.list_for_entity(entity_id).await
    }

    pub async fn associations_for_org(
        &self,
        organization_id: OrgId,
    ) -> WorkflowResult<Vec<FreelancerPlatformAssociation>> {
        self.associations.list_for_org(organization_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_keeps_first_occurrence_order() {
        let ids: Vec<PlatformId> = ["fiverr", "amove", "fiverr", "upwork", "amove"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(distinct(&ids), vec!["fiverr", "amove", "upwork"]);
    }

    #[test]
    fn toggle_outcome_serializes_with_tag() {
        let outcome = ToggleOutcome::Unchanged { association: None };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "unchanged");
        assert!(outcome.association().is_none());
    }
}
