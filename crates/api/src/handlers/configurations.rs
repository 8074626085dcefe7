//! Handlers for per-organization platform configuration.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use gigsync_core::error::CoreError;
use gigsync_core::types::{OrgId, PlatformId};
use gigsync_db::models::{ConfigPatch, ConfigReadiness};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::platforms::{ensure_platform_exists, ConnectionTestResponse};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub platform_id: PlatformId,
    pub readiness: ConfigReadiness,
}

fn not_found(organization_id: OrgId, platform_id: &str) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "PlatformConfiguration",
        id: format!("{organization_id}/{platform_id}"),
    })
}

// ---------------------------------------------------------------------------
// GET /organizations/{org_id}/configurations
// ---------------------------------------------------------------------------

pub async fn list_configurations(
    State(state): State<AppState>,
    Path(organization_id): Path<OrgId>,
) -> AppResult<impl IntoResponse> {
    let items = state
        .engine
        .configurations()
        .list_for_org(organization_id)
        .await?;
    tracing::debug!(count = items.len(), "Listed platform configurations");
    Ok(Json(DataResponse { data: items }))
}

// ---------------------------------------------------------------------------
// GET /organizations/{org_id}/configurations/{platform_id}
// ---------------------------------------------------------------------------

pub async fn get_configuration(
    State(state): State<AppState>,
    Path((organization_id, platform_id)): Path<(OrgId, String)>,
) -> AppResult<impl IntoResponse> {
    let configuration = state
        .engine
        .configurations()
        .get(organization_id, &platform_id)
        .await?
        .ok_or_else(|| not_found(organization_id, &platform_id))?;
    Ok(Json(DataResponse {
        data: configuration,
    }))
}

// ---------------------------------------------------------------------------
// PUT /organizations/{org_id}/configurations/{platform_id}
// ---------------------------------------------------------------------------

/// Merge a config patch. `null` values remove keys; saving values enables
/// the platform unless `enabled` is given.
pub async fn upsert_configuration(
    State(state): State<AppState>,
    Path((organization_id, platform_id)): Path<(OrgId, String)>,
    Json(patch): Json<ConfigPatch>,
) -> AppResult<impl IntoResponse> {
    ensure_platform_exists(&state, &platform_id)?;
    let saved = state
        .engine
        .configurations()
        .upsert(organization_id, &platform_id, patch)
        .await?;
    Ok(Json(DataResponse { data: saved }))
}

// ---------------------------------------------------------------------------
// PUT /organizations/{org_id}/configurations/{platform_id}/enabled
// ---------------------------------------------------------------------------

/// Switch a platform on or off. Disabling a platform that was never
/// configured returns `data: null`.
pub async fn set_enabled(
    State(state): State<AppState>,
    Path((organization_id, platform_id)): Path<(OrgId, String)>,
    Json(input): Json<SetEnabledRequest>,
) -> AppResult<impl IntoResponse> {
    ensure_platform_exists(&state, &platform_id)?;
    let saved = state
        .engine
        .configurations()
        .set_enabled(organization_id, &platform_id, input.enabled)
        .await?;
    Ok(Json(DataResponse { data: saved }))
}

// ---------------------------------------------------------------------------
// GET /organizations/{org_id}/configurations/{platform_id}/readiness
// ---------------------------------------------------------------------------

pub async fn get_readiness(
    State(state): State<AppState>,
    Path((organization_id, platform_id)): Path<(OrgId, String)>,
) -> AppResult<impl IntoResponse> {
    let readiness = state
        .engine
        .configurations()
        .readiness(organization_id, &platform_id)
        .await?;
    Ok(Json(DataResponse {
        data: ReadinessResponse {
            platform_id,
            readiness,
        },
    }))
}

// ---------------------------------------------------------------------------
// DELETE /organizations/{org_id}/configurations/{platform_id}
// ---------------------------------------------------------------------------

pub async fn delete_configuration(
    State(state): State<AppState>,
    Path((organization_id, platform_id)): Path<(OrgId, String)>,
) -> AppResult<StatusCode> {
    let removed = state
        .engine
        .configurations()
        .remove(organization_id, &platform_id)
        .await?;
    if removed {
        tracing::info!(organization_id = %organization_id, platform_id = %platform_id, "Platform configuration deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(organization_id, &platform_id))
    }
}

// ---------------------------------------------------------------------------
// POST /organizations/{org_id}/configurations/{platform_id}/test
// ---------------------------------------------------------------------------

/// Test the saved configuration, enabled or not.
pub async fn test_configuration(
    State(state): State<AppState>,
    Path((organization_id, platform_id)): Path<(OrgId, String)>,
) -> AppResult<impl IntoResponse> {
    let result = state
        .engine
        .tester()
        .test_stored(organization_id, &platform_id)
        .await?;
    Ok(Json(DataResponse {
        data: ConnectionTestResponse::from(result),
    }))
}
