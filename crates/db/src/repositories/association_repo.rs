//! Repository for the `freelancer_platforms` table.
//!
//! At most one row exists per `(freelancer_id, platform_id)`; the store's
//! key constraint enforces it and [`AssociationRepo::get_or_create`] folds a
//! lost insert race back into a lookup.

use gigsync_core::types::{EntityId, OrgId};
use serde_json::json;

use super::{decode, decode_all, encode};
use crate::models::association::FreelancerPlatformAssociation;
use crate::store::{Filter, RecordStore, StoreError, Table};

const TABLE: Table = Table::FreelancerPlatforms;

fn key(freelancer_id: EntityId, platform_id: &str) -> Filter {
    Filter::all()
        .eq("freelancer_id", freelancer_id)
        .eq("platform_id", platform_id)
}

/// Provides persistence for freelancer ↔ platform associations.
pub struct AssociationRepo;

impl AssociationRepo {
    pub async fn find(
        store: &dyn RecordStore,
        freelancer_id: EntityId,
        platform_id: &str,
    ) -> Result<Option<FreelancerPlatformAssociation>, StoreError> {
        store
            .select_one(TABLE, &key(freelancer_id, platform_id))
            .await?
            .map(|row| decode(TABLE, row))
            .transpose()
    }

    /// Fetch the pair's row, inserting a `pending` one if none exists.
    ///
    /// The boolean is `true` when this call created the row.
    pub async fn get_or_create(
        store: &dyn RecordStore,
        freelancer_id: EntityId,
        organization_id: OrgId,
        platform_id: &str,
    ) -> Result<(FreelancerPlatformAssociation, bool), StoreError> {
        if let Some(existing) = Self::find(store, freelancer_id, platform_id).await? {
            return Ok((existing, false));
        }

        let fresh = FreelancerPlatformAssociation::pending(freelancer_id, organization_id, platform_id);
        match store.insert(TABLE, encode(TABLE, &fresh)?).await {
            Ok(row) => Ok((decode(TABLE, row)?, true)),
            Err(StoreError::Conflict { .. }) => {
                let existing = Self::find(store, freelancer_id, platform_id)
                    .await?
                    .ok_or_else(|| {
                        StoreError::Unavailable(format!(
                            "association ({freelancer_id}, {platform_id}) vanished after conflict"
                        ))
                    })?;
                Ok((existing, false))
            }
            Err(e) => Err(e),
        }
    }

    /// Persist the lifecycle columns of an existing row.
    pub async fn save(
        store: &dyn RecordStore,
        association: &FreelancerPlatformAssociation,
    ) -> Result<FreelancerPlatformAssociation, StoreError> {
        let patch = json!({
            "status": association.status,
            "remote_account_id": association.remote_account_id,
            "last_error": association.last_error,
            "provisioned_at": association.provisioned_at,
            "last_sync_at": association.last_sync_at,
            "updated_at": association.updated_at,
        });
        let updated = store
            .update(
                TABLE,
                &key(association.freelancer_id, &association.platform_id),
                patch,
            )
            .await?;
        match updated.into_iter().next() {
            Some(row) => decode(TABLE, row),
            None => Err(StoreError::Unavailable(format!(
                "association ({}, {}) missing on save",
                association.freelancer_id, association.platform_id
            ))),
        }
    }

    pub async fn list_for_freelancer(
        store: &dyn RecordStore,
        freelancer_id: EntityId,
    ) -> Result<Vec<FreelancerPlatformAssociation>, StoreError> {
        let rows = store
            .select(TABLE, &Filter::all().eq("freelancer_id", freelancer_id))
            .await?;
        decode_all(TABLE, rows)
    }

    pub async fn list_for_org(
        store: &dyn RecordStore,
        organization_id: OrgId,
    ) -> Result<Vec<FreelancerPlatformAssociation>, StoreError> {
        let rows = store
            .select(TABLE, &Filter::all().eq("organization_id", organization_id))
            .await?;
        decode_all(TABLE, rows)
    }
}
