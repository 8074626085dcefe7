//! Platform catalogue routes, mounted at `/platforms`.
//!
//! ```text
//! GET    /                              list_platforms
//! POST   /{platform_id}/test            test_draft
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::platforms;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(platforms::list_platforms))
        .route("/{platform_id}/test", post(platforms::test_draft))
}
