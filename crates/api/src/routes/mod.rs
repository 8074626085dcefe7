pub mod bulk;
pub mod freelancers;
pub mod health;
pub mod organizations;
pub mod platforms;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /platforms                                    catalogue, draft connection test
/// /organizations/{org_id}/configurations        per-platform config, enable flag, test
/// /organizations/{org_id}/freelancers           freelancers of one organization
/// /organizations/{org_id}/associations          platform accounts of one organization
/// /freelancers                                  create, get, status
/// /freelancers/{id}/onboard                     onboarding batch and its progress
/// /freelancers/{id}/platforms/{platform_id}     toggle, deactivate
/// /bulk                                         onboard, deactivate, reactivate
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/platforms", platforms::router())
        .nest("/organizations", organizations::router())
        .nest("/freelancers", freelancers::router())
        .nest("/bulk", bulk::router())
}
