//! Repository for the `freelancers` table.

use gigsync_core::status::FreelancerStatus;
use gigsync_core::types::{EntityId, OrgId};
use serde_json::json;
use uuid::Uuid;

use super::{decode, decode_all, encode};
use crate::models::freelancer::{CreateFreelancer, Freelancer};
use crate::store::{Filter, RecordStore, StoreError, Table};

const TABLE: Table = Table::Freelancers;

/// Provides CRUD operations for freelancers.
pub struct FreelancerRepo;

impl FreelancerRepo {
    /// Insert a new freelancer in `pending` status.
    pub async fn create(
        store: &dyn RecordStore,
        body: &CreateFreelancer,
    ) -> Result<Freelancer, StoreError> {
        let now = chrono::Utc::now();
        let freelancer = Freelancer {
            id: Uuid::now_v7(),
            organization_id: body.organization_id,
            full_name: body.full_name.clone(),
            email: body.email.clone(),
            headline: body.headline.clone(),
            skills: body.skills.clone(),
            country: body.country.clone(),
            status: FreelancerStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let row = store.insert(TABLE, encode(TABLE, &freelancer)?).await?;
        decode(TABLE, row)
    }

    pub async fn find_by_id(
        store: &dyn RecordStore,
        id: EntityId,
    ) -> Result<Option<Freelancer>, StoreError> {
        store
            .select_one(TABLE, &Filter::all().eq("id", id))
            .await?
            .map(|row| decode(TABLE, row))
            .transpose()
    }

    /// Set the freelancer's status. Returns `None` if no such freelancer.
    pub async fn update_status(
        store: &dyn RecordStore,
        id: EntityId,
        status: FreelancerStatus,
    ) -> Result<Option<Freelancer>, StoreError> {
        let patch = json!({
            "status": status,
            "updated_at": chrono::Utc::now(),
        });
        store
            .update(TABLE, &Filter::all().eq("id", id), patch)
            .await?
            .into_iter()
            .next()
            .map(|row| decode(TABLE, row))
            .transpose()
    }

    pub async fn list_for_org(
        store: &dyn RecordStore,
        organization_id: OrgId,
    ) -> Result<Vec<Freelancer>, StoreError> {
        let rows = store
            .select(TABLE, &Filter::all().eq("organization_id", organization_id))
            .await?;
        decode_all(TABLE, rows)
    }
}
