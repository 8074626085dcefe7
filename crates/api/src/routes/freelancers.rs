//! Freelancer routes, mounted at `/freelancers`.
//!
//! ```text
//! POST   /                                         create_freelancer
//! GET    /{id}                                     get_freelancer
//! PUT    /{id}/status                              set_status
//! GET    /{id}/associations                        list_associations
//! POST   /{id}/onboard                             onboard
//! GET    /{id}/progress                            get_progress
//! POST   /{id}/sync                                sync_profile
//! POST   /{id}/platforms/{platform_id}/toggle      toggle
//! POST   /{id}/platforms/{platform_id}/deactivate  deactivate
//! ```

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{freelancers, onboarding};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(freelancers::create_freelancer))
        .route("/{id}", get(freelancers::get_freelancer))
        .route("/{id}/status", put(freelancers::set_status))
        .route("/{id}/associations", get(freelancers::list_associations))
        .route("/{id}/onboard", post(onboarding::onboard))
        .route("/{id}/progress", get(onboarding::get_progress))
        .route("/{id}/sync", post(onboarding::sync_profile))
        .route(
            "/{id}/platforms/{platform_id}/toggle",
            post(onboarding::toggle),
        )
        .route(
            "/{id}/platforms/{platform_id}/deactivate",
            post(onboarding::deactivate),
        )
}
