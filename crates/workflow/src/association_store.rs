//! Freelancer ↔ platform associations.
//!
//! Thin layer over [`AssociationRepo`] that serializes writers of the same
//! `(freelancer, platform)` row and records every write in the status cache.

use std::sync::Arc;

use gigsync_core::locks::KeyedLocks;
use gigsync_core::types::{EntityId, OrgId, PlatformId};
use gigsync_db::models::FreelancerPlatformAssociation;
use gigsync_db::repositories::AssociationRepo;
use gigsync_db::{ChangeScope, RecordStore, Subscription, Table};
use gigsync_events::StatusSynchronizer;
use tokio::sync::OwnedMutexGuard;

use crate::error::WorkflowResult;

pub struct AssociationStore {
    store: Arc<dyn RecordStore>,
    sync: Arc<StatusSynchronizer>,
    locks: KeyedLocks<(EntityId, PlatformId)>,
}

impl AssociationStore {
    pub fn new(store: Arc<dyn RecordStore>, sync: Arc<StatusSynchronizer>) -> Self {
        Self {
            store,
            sync,
            locks: KeyedLocks::new(),
        }
    }

    /// Exclusive write access to one row. Hold it across read-modify-write.
    pub async fn lock(&self, entity_id: EntityId, platform_id: &str) -> OwnedMutexGuard<()> {
        self.locks.lock(&(entity_id, platform_id.to_string())).await
    }

    pub async fn get(
        &self,
        entity_id: EntityId,
        platform_id: &str,
    ) -> WorkflowResult<Option<FreelancerPlatformAssociation>> {
        Ok(AssociationRepo::find(&*self.store, entity_id, platform_id).await?)
    }

    /// Fetch the row or create it `pending`. Never produces a second row.
    pub async fn get_or_create(
        &self,
        entity_id: EntityId,
        organization_id: OrgId,
        platform_id: &str,
    ) -> WorkflowResult<FreelancerPlatformAssociation> {
        let (row, created) =
            AssociationRepo::get_or_create(&*self.store, entity_id, organization_id, platform_id)
                .await?;
        if created {
            tracing::debug!(entity_id = %entity_id, platform_id, "Association created");
            self.sync.record_association(&row).await;
        }
        Ok(row)
    }

    pub async fn save(
        &self,
        association: &FreelancerPlatformAssociation,
    ) -> WorkflowResult<FreelancerPlatformAssociation> {
        let saved = AssociationRepo::save(&*self.store, association).await?;
        self.sync.record_association(&saved).await;
        Ok(saved)
    }

    pub async fn list_for_entity(
        &self,
        entity_id: EntityId,
    ) -> WorkflowResult<Vec<FreelancerPlatformAssociation>> {
        Ok(AssociationRepo::list_for_freelancer(&*self.store, entity_id).await?)
    }

    pub async fn list_for_org(
        &self,
        organization_id: OrgId,
    ) -> WorkflowResult<Vec<FreelancerPlatformAssociation>> {
        Ok(AssociationRepo::list_for_org(&*self.store, organization_id).await?)
    }

    /// Association changes for one organization, wherever they were made.
    pub fn subscribe(&self, organization_id: OrgId) -> Subscription {
        self.store.subscribe(
            ChangeScope::organization(organization_id).in_table(Table::FreelancerPlatforms),
        )
    }
}
