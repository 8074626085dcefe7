//! Repository for the `platform_configurations` table.

use gigsync_core::types::OrgId;
use serde_json::json;

use super::{decode, decode_all, encode};
use crate::models::platform_configuration::PlatformConfiguration;
use crate::store::{Filter, RecordStore, StoreError, Table};

const TABLE: Table = Table::PlatformConfigurations;

fn key(organization_id: OrgId, platform_id: &str) -> Filter {
    Filter::all()
        .eq("organization_id", organization_id)
        .eq("platform_id", platform_id)
}

/// Provides CRUD operations for per-organization platform configuration.
pub struct PlatformConfigRepo;

impl PlatformConfigRepo {
    pub async fn find(
        store: &dyn RecordStore,
        organization_id: OrgId,
        platform_id: &str,
    ) -> Result<Option<PlatformConfiguration>, StoreError> {
        store
            .select_one(TABLE, &key(organization_id, platform_id))
            .await?
            .map(|row| decode(TABLE, row))
            .transpose()
    }

    pub async fn insert(
        store: &dyn RecordStore,
        configuration: &PlatformConfiguration,
    ) -> Result<PlatformConfiguration, StoreError> {
        let row = store.insert(TABLE, encode(TABLE, configuration)?).await?;
        decode(TABLE, row)
    }

    /// Write `enabled`, `config` and `updated_at` for an existing row.
    ///
    /// Returns `None` if the row disappeared in the meantime.
    pub async fn save(
        store: &dyn RecordStore,
        configuration: &PlatformConfiguration,
    ) -> Result<Option<PlatformConfiguration>, StoreError> {
        let patch = json!({
            "enabled": configuration.enabled,
            "config": configuration.config,
            "updated_at": configuration.updated_at,
        });
        store
            .update(
                TABLE,
                &key(configuration.organization_id, &configuration.platform_id),
                patch,
            )
            .await?
            .into_iter()
            .next()
            .map(|row| decode(TABLE, row))
            .transpose()
    }

    pub async fn list_for_org(
        store: &dyn RecordStore,
        organization_id: OrgId,
    ) -> Result<Vec<PlatformConfiguration>, StoreError> {
        let rows = store
            .select(TABLE, &Filter::all().eq("organization_id", organization_id))
            .await?;
        decode_all(TABLE, rows)
    }

    /// Delete a configuration. Returns whether a row was removed.
    pub async fn delete(
        store: &dyn RecordStore,
        organization_id: OrgId,
        platform_id: &str,
    ) -> Result<bool, StoreError> {
        Ok(store.delete(TABLE, &key(organization_id, platform_id)).await? > 0)
    }
}
