//! Handlers for onboarding, progress, toggling and profile sync.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use gigsync_core::error::CoreError;
use gigsync_core::types::{EntityId, PlatformId};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OnboardRequest {
    pub platform_ids: Vec<PlatformId>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

// ---------------------------------------------------------------------------
// POST /freelancers/{id}/onboard
// ---------------------------------------------------------------------------

/// Run an onboarding batch and return its final progress.
///
/// Per-platform failures are part of the progress; only freelancer lookup
/// and store failures are HTTP errors.
pub async fn onboard(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(input): Json<OnboardRequest>,
) -> AppResult<impl IntoResponse> {
    let progress = state.engine.onboard(id, &input.platform_ids).await?;
    Ok(Json(DataResponse { data: progress }))
}

// ---------------------------------------------------------------------------
// GET /freelancers/{id}/progress
// ---------------------------------------------------------------------------

/// Latest batch snapshot, live while a batch is running.
pub async fn get_progress(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    let progress = state.engine.progress(id).await.ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "OnboardingProgress",
            id: id.to_string(),
        })
    })?;
    Ok(Json(DataResponse { data: progress }))
}

// ---------------------------------------------------------------------------
// POST /freelancers/{id}/platforms/{platform_id}/toggle
// ---------------------------------------------------------------------------

/// Bring one platform to the desired state (retry, provision or deactivate).
pub async fn toggle(
    State(state): State<AppState>,
    Path((id, platform_id)): Path<(EntityId, String)>,
    Json(input): Json<ToggleRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = state
        .engine
        .retry_or_toggle(id, &platform_id, input.enabled)
        .await?;
    Ok(Json(DataResponse { data: outcome }))
}

// ---------------------------------------------------------------------------
// POST /freelancers/{id}/platforms/{platform_id}/deactivate
// ---------------------------------------------------------------------------

/// Delete the remote account. A failed remote deletion is a 502 and the
/// association stays active.
pub async fn deactivate(
    State(state): State<AppState>,
    Path((id, platform_id)): Path<(EntityId, String)>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.engine.deactivate(id, &platform_id).await?;
    Ok(Json(DataResponse { data: outcome }))
}

// ---------------------------------------------------------------------------
// POST /freelancers/{id}/sync
// ---------------------------------------------------------------------------

pub async fn sync_profile(
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<impl IntoResponse> {
    let report = state.engine.sync_profile(id).await?;
    Ok(Json(DataResponse { data: report }))
}
