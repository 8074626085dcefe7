//! Per-organization platform configuration.
//!
//! Writes to the same `(organization, platform)` are serialized; different
//! keys proceed concurrently. Updates are last-writer-wins.

use std::sync::Arc;

use gigsync_core::locks::KeyedLocks;
use gigsync_core::types::{OrgId, PlatformId};
use gigsync_db::models::{ConfigPatch, ConfigReadiness, PlatformConfiguration};
use gigsync_db::repositories::PlatformConfigRepo;
use gigsync_db::{ChangeScope, RecordStore, StoreError, Subscription, Table};
use gigsync_events::StatusSynchronizer;

use crate::error::WorkflowResult;

pub struct ConfigurationStore {
    store: Arc<dyn RecordStore>,
    sync: Arc<StatusSynchronizer>,
    locks: KeyedLocks<(OrgId, PlatformId)>,
}

impl ConfigurationStore {
    pub fn new(store: Arc<dyn RecordStore>, sync: Arc<StatusSynchronizer>) -> Self {
        Self {
            store,
            sync,
            locks: KeyedLocks::new(),
        }
    }

    pub async fn get(
        &self,
        organization_id: OrgId,
        platform_id: &str,
    ) -> WorkflowResult<Option<PlatformConfiguration>> {
        Ok(PlatformConfigRepo::find(&*self.store, organization_id, platform_id).await?)
    }

    /// Merge `patch` into the stored configuration, creating it if needed.
    ///
    /// Config keys are merged and `null` removes a key. Saving a patch that
    /// carries at least one non-null config value switches the platform on
    /// unless the same patch sets `enabled` explicitly.
    pub async fn upsert(
        &self,
        organization_id: OrgId,
        platform_id: &str,
        patch: ConfigPatch,
    ) -> WorkflowResult<PlatformConfiguration> {
        let _guard = self
            .locks
            .lock(&(organization_id, platform_id.to_string()))
            .await;
        let existing = PlatformConfigRepo::find(&*self.store, organization_id, platform_id).await?;
        let existed = existing.is_some();
        let mut configuration = existing
            .unwrap_or_else(|| PlatformConfiguration::new(organization_id, platform_id));

        let mut saved_values = false;
        if let Some(values) = patch.config {
            for (key, value) in values {
                if value.is_null() {
                    configuration.config.remove(&key);
                } else {
                    configuration.config.insert(key, value);
                    saved_values = true;
                }
            }
        }

        configuration.enabled = match patch.enabled {
            Some(explicit) => explicit,
            None if saved_values => true,
            None => configuration.enabled,
        };
        configuration.updated_at = chrono::Utc::now();

        let saved = self.persist(&configuration, existed).await?;
        tracing::info!(
            organization_id = %organization_id,
            platform_id,
            enabled = saved.enabled,
            configured = saved.is_configured(),
            "Platform configuration saved"
        );
        Ok(saved)
    }

    /// Switch a platform on or off.
    ///
    /// Enabling an unknown platform creates an empty, enabled configuration
    /// ("enable now, configure later"). Disabling one that was never
    /// configured writes nothing and returns `None`.
    pub async fn set_enabled(
        &self,
        organization_id: OrgId,
        platform_id: &str,
        enabled: bool,
    ) -> WorkflowResult<Option<PlatformConfiguration>> {
        let _guard = self
            .locks
            .lock(&(organization_id, platform_id.to_string()))
            .await;
        let existing = PlatformConfigRepo::find(&*self.store, organization_id, platform_id).await?;
        let existed = existing.is_some();
        let mut configuration = match existing {
            Some(configuration) => configuration,
            None if enabled => PlatformConfiguration::new(organization_id, platform_id),
            None => return Ok(None),
        };

        configuration.enabled = enabled;
        configuration.updated_at = chrono::Utc::now();
        let saved = self.persist(&configuration, existed).await?;
        tracing::info!(
            organization_id = %organization_id,
            platform_id,
            enabled,
            "Platform toggled"
        );
        Ok(Some(saved))
    }

    pub async fn list_for_org(
        &self,
        organization_id: OrgId,
    ) -> WorkflowResult<Vec<PlatformConfiguration>> {
        Ok(PlatformConfigRepo::list_for_org(&*self.store, organization_id).await?)
    }

    pub async fn readiness(
        &self,
        organization_id: OrgId,
        platform_id: &str,
    ) -> WorkflowResult<ConfigReadiness> {
        let configuration = self.get(organization_id, platform_id).await?;
        Ok(ConfigReadiness::of(configuration.as_ref()))
    }

    /// Delete a configuration. Returns whether one existed.
    pub async fn remove(&self, organization_id: OrgId, platform_id: &str) -> WorkflowResult<bool> {
        let _guard = self
            .locks
            .lock(&(organization_id, platform_id.to_string()))
            .await;
        let Some(existing) =
            PlatformConfigRepo::find(&*self.store, organization_id, platform_id).await?
        else {
            return Ok(false);
        };
        let removed = PlatformConfigRepo::delete(&*self.store, organization_id, platform_id).await?;
        if removed {
            self.sync.forget_configuration(&existing).await;
        }
        Ok(removed)
    }

    /// Configuration changes for one organization, wherever they were made.
    pub fn subscribe(&self, organization_id: OrgId) -> Subscription {
        self.store.subscribe(
            ChangeScope::organization(organization_id).in_table(Table::PlatformConfigurations),
        )
    }

    async fn persist(
        &self,
        configuration: &PlatformConfiguration,
        existed: bool,
    ) -> WorkflowResult<PlatformConfiguration> {
        let store = &*self.store;
        let saved = if existed {
            match PlatformConfigRepo::save(store, configuration).await? {
                Some(row) => row,
                // Deleted elsewhere since we read it.
                None => PlatformConfigRepo::insert(store, configuration).await?,
            }
        } else {
            match PlatformConfigRepo::insert(store, configuration).await {
                Ok(row) => row,
                // Created elsewhere since we read it; last writer wins.
                Err(StoreError::Conflict { .. }) => PlatformConfigRepo::save(store, configuration)
                    .await?
                    .ok_or_else(|| {
                        StoreError::Unavailable(format!(
                            "configuration ({}, {}) vanished during save",
                            configuration.organization_id, configuration.platform_id
                        ))
                    })?,
                Err(e) => return Err(e.into()),
            }
        };
        self.sync.record_configuration(&saved).await;
        Ok(saved)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
