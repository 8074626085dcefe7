//! Handlers for bulk operations over many freelancers.
//!
//! Bulk calls always answer 200; per-freelancer failures are in the report.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use gigsync_core::types::{EntityId, PlatformId};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BulkOnboardRequest {
    pub entity_ids: Vec<EntityId>,
    pub platform_ids: Vec<PlatformId>,
}

#[derive(Debug, Deserialize)]
pub struct BulkEntitiesRequest {
    pub entity_ids: Vec<EntityId>,
}

fn ensure_not_empty(entity_ids: &[EntityId]) -> AppResult<()> {
    if entity_ids.is_empty() {
        return Err(AppError::BadRequest("entity_ids must not be empty".into()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// POST /bulk/onboard
// ---------------------------------------------------------------------------

pub async fn bulk_onboard(
    State(state): State<AppState>,
    Json(input): Json<BulkOnboardRequest>,
) -> AppResult<impl IntoResponse> {
    ensure_not_empty(&input.entity_ids)?;
    let report = state
        .bulk
        .bulk_onboard(&input.entity_ids, &input.platform_ids)
        .await;
    Ok(Json(DataResponse { data: report }))
}

// ---------------------------------------------------------------------------
// POST /bulk/deactivate
// ---------------------------------------------------------------------------

/// Mark freelancers `inactive`. Platform accounts are left in place.
pub async fn bulk_deactivate(
    State(state): State<AppState>,
    Json(input): Json<BulkEntitiesRequest>,
) -> AppResult<impl IntoResponse> {
    ensure_not_empty(&input.entity_ids)?;
    let report = state.bulk.bulk_deactivate_entities(&input.entity_ids).await;
    Ok(Json(DataResponse { data: report }))
}

// ---------------------------------------------------------------------------
// POST /bulk/reactivate
// ---------------------------------------------------------------------------

pub async fn bulk_reactivate(
    State(state): State<AppState>,
    Json(input): Json<BulkEntitiesRequest>,
) -> AppResult<impl IntoResponse> {
    ensure_not_empty(&input.entity_ids)?;
    let report = state.bulk.bulk_reactivate_entities(&input.entity_ids).await;
    Ok(Json(DataResponse { data: report }))
}
