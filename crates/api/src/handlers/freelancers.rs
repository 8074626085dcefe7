//! Handlers for freelancer records and their platform associations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use gigsync_core::error::CoreError;
use gigsync_core::status::FreelancerStatus;
use gigsync_core::types::{EntityId, OrgId};
use gigsync_db::models::CreateFreelancer;
use gigsync_db::repositories::FreelancerRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: FreelancerStatus,
}

fn validate_create(input: &CreateFreelancer) -> Result<(), CoreError> {
    if input.full_name.trim().is_empty() {
        return Err(CoreError::Validation("full_name must not be empty".into()));
    }
    let email = input.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(CoreError::Validation(format!(
            "email '{}' is not a valid address",
            input.email
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// POST /freelancers
// ---------------------------------------------------------------------------

/// Create a freelancer in `pending` status.
pub async fn create_freelancer(
    State(state): State<AppState>,
    Json(input): Json<CreateFreelancer>,
) -> AppResult<impl IntoResponse> {
    validate_create(&input)?;
    let created = FreelancerRepo::create(state.engine.store().as_ref(), &input).await?;
    tracing::info!(entity_id = %created.id, organization_id = %created.organization_id, "Freelancer created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

// ---------------------------------------------------------------------------
// GET /freelancers/{id}
// ---------------------------------------------------------------------------

pub async fn get_freelancer(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    let freelancer = FreelancerRepo::find_by_id(state.engine.store().as_ref(), id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Freelancer",
                id: id.to_string(),
            })
        })?;
    Ok(Json(DataResponse { data: freelancer }))
}

// ---------------------------------------------------------------------------
// PUT /freelancers/{id}/status
// ---------------------------------------------------------------------------

/// Set the freelancer's own status. Platform accounts are not touched.
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(input): Json<SetStatusRequest>,
) -> AppResult<impl IntoResponse> {
    let freelancer = state.engine.set_entity_status(id, input.status).await?;
    Ok(Json(DataResponse { data: freelancer }))
}

// ---------------------------------------------------------------------------
// GET /freelancers/{id}/associations
// ---------------------------------------------------------------------------

pub async fn list_associations(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    let items = state.engine.associations_for_entity(id).await?;
    Ok(Json(DataResponse { data: items }))
}

// ---------------------------------------------------------------------------
// GET /organizations/{org_id}/freelancers
// ---------------------------------------------------------------------------

pub async fn list_for_org(
    State(state): State<AppState>,
    Path(organization_id): Path<OrgId>,
) -> AppResult<impl IntoResponse> {
    let items = FreelancerRepo::list_for_org(state.engine.store().as_ref(), organization_id).await?;
    tracing::debug!(count = items.len(), "Listed freelancers");
    Ok(Json(DataResponse { data: items }))
}

// ---------------------------------------------------------------------------
// GET /organizations/{org_id}/associations
// ---------------------------------------------------------------------------

pub async fn list_org_associations(
    State(state): State<AppState>,
    Path(organization_id): Path<OrgId>,
) -> AppResult<impl IntoResponse> {
    let items = state.engine.associations_for_org(organization_id).await?;
    Ok(Json(DataResponse { data: items }))
}
