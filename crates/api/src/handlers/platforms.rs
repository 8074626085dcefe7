//! Handlers for the platform catalogue and draft connection tests.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use gigsync_core::error::CoreError;
use gigsync_core::platform::ProvisionError;
use gigsync_core::types::ConfigBlob;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Result of a connection test. A failed test is a normal response, not an
/// HTTP error.
#[derive(Debug, Serialize)]
pub struct ConnectionTestResponse {
    pub success: bool,
    pub error: Option<String>,
}

impl From<Result<(), ProvisionError>> for ConnectionTestResponse {
    fn from(result: Result<(), ProvisionError>) -> Self {
        Self {
            success: result.is_ok(),
            error: result.err().map(|e| e.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TestDraftRequest {
    #[serde(default)]
    pub config: ConfigBlob,
}

/// 404 unless `platform_id` has a registered module.
pub(crate) fn ensure_platform_exists(state: &AppState, platform_id: &str) -> AppResult<()> {
    if state.engine.registry().contains(platform_id) {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Platform",
            id: platform_id.to_string(),
        }))
    }
}

// ---------------------------------------------------------------------------
// GET /platforms
// ---------------------------------------------------------------------------

/// Every registered platform module, in registration order.
pub async fn list_platforms(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let items = state.engine.registry().metadata();
    Ok(Json(DataResponse { data: items }))
}

// ---------------------------------------------------------------------------
// POST /platforms/{platform_id}/test
// ---------------------------------------------------------------------------

/// Test an unsaved configuration. Nothing is persisted.
pub async fn test_draft(
    State(state): State<AppState>,
    Path(platform_id): Path<String>,
    Json(input): Json<TestDraftRequest>,
) -> AppResult<impl IntoResponse> {
    ensure_platform_exists(&state, &platform_id)?;
    let result = state
        .engine
        .tester()
        .test_draft(&platform_id, &input.config)
        .await;
    tracing::debug!(platform_id = %platform_id, success = result.is_ok(), "Draft connection tested");
    Ok(Json(DataResponse {
        data: ConnectionTestResponse::from(result),
    }))
}
