//! Bulk routes, mounted at `/bulk`.
//!
//! ```text
//! POST   /onboard                       bulk_onboard
//! POST   /deactivate                    bulk_deactivate
//! POST   /reactivate                    bulk_reactivate
//! ```

use axum::routing::post;
use axum::Router;

use crate::handlers::bulk;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/onboard", post(bulk::bulk_onboard))
        .route("/deactivate", post(bulk::bulk_deactivate))
        .route("/reactivate", post(bulk::bulk_reactivate))
}
