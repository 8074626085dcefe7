//! Organization-scoped routes, mounted at `/organizations`.
//!
//! ```text
//! GET    /{org_id}/configurations                           list_configurations
//! GET    /{org_id}/configurations/{platform_id}             get_configuration
//! PUT    /{org_id}/configurations/{platform_id}             upsert_configuration
//! DELETE /{org_id}/configurations/{platform_id}             delete_configuration
//! PUT    /{org_id}/configurations/{platform_id}/enabled     set_enabled
//! GET    /{org_id}/configurations/{platform_id}/readiness   get_readiness
//! POST   /{org_id}/configurations/{platform_id}/test        test_configuration
//! GET    /{org_id}/freelancers                              list_for_org
//! GET    /{org_id}/associations                             list_org_associations
//! ```

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{configurations, freelancers};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{org_id}/configurations",
            get(configurations::list_configurations),
        )
        .route(
            "/{org_id}/configurations/{platform_id}",
            get(configurations::get_configuration)
                .put(configurations::upsert_configuration)
                .delete(configurations::delete_configuration),
        )
        .route(
            "/{org_id}/configurations/{platform_id}/enabled",
            put(configurations::set_enabled),
        )
        .route(
            "/{org_id}/configurations/{platform_id}/readiness",
            get(configurations::get_readiness),
        )
        .route(
            "/{org_id}/configurations/{platform_id}/test",
            post(configurations::test_configuration),
        )
        .route("/{org_id}/freelancers", get(freelancers::list_for_org))
        .route(
            "/{org_id}/associations",
            get(freelancers::list_org_associations),
        )
}
