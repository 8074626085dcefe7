//! HTTP-level tests for configuration, onboarding, toggling and bulk calls.
//!
//! Uses `tower::ServiceExt` to send requests straight to the router.

mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{body_json, delete, get, post_json, put_json};
use serde_json::{json, Value};
use uuid::Uuid;

async fn create_freelancer(app: &Router, org: Uuid, name: &str) -> String {
    let response = post_json(
        app.clone(),
        "/api/v1/freelancers",
        json!({
            "organization_id": org,
            "full_name": name,
            "email": format!("{}@example.com", name.to_lowercase()),
            "skills": ["editing"],
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "pending");
    json["data"]["id"].as_str().unwrap().to_string()
}

async fn configure(app: &Router, org: Uuid, platform: &str, body: Value) -> Value {
    let response = put_json(
        app.clone(),
        &format!("/api/v1/organizations/{org}/configurations/{platform}"),
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

fn amove_config() -> Value {
    json!({"config": {"api_key": "ak-123", "workspace_id": "studio"}})
}

// ---------------------------------------------------------------------------
// Platforms and configuration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lists_registered_platforms() {
    let app = common::build_test_app();

    let response = get(app, "/api/v1/platforms").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let ids: Vec<_> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["amove", "fiverr", "upwork"]);
}

#[tokio::test]
async fn saving_config_enables_the_platform() {
    let app = common::build_test_app();
    let org = Uuid::now_v7();

    let saved = configure(&app, org, "amove", amove_config()).await;
    assert_eq!(saved["enabled"], true);

    let response = get(
        app.clone(),
        &format!("/api/v1/organizations/{org}/configurations/amove/readiness"),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["readiness"], "ready");

    let response = put_json(
        app.clone(),
        &format!("/api/v1/organizations/{org}/configurations/amove/enabled"),
        json!({"enabled": false}),
    )
    .await;
    assert_eq!(body_json(response).await["data"]["enabled"], false);

    let response = get(app, &format!("/api/v1/organizations/{org}/configurations")).await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn configuring_unknown_platform_returns_404() {
    let app = common::build_test_app();
    let org = Uuid::now_v7();

    let response = put_json(
        app,
        &format!("/api/v1/organizations/{org}/configurations/myspace"),
        json!({"config": {"token": "x"}}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn deleting_configuration_twice_returns_404() {
    let app = common::build_test_app();
    let org = Uuid::now_v7();
    configure(&app, org, "amove", amove_config()).await;
    let uri = format!("/api/v1/organizations/{org}/configurations/amove");

    assert_eq!(delete(app.clone(), &uri).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(delete(app.clone(), &uri).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(app, &uri).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn draft_connection_test_reports_missing_fields() {
    let app = common::build_test_app();

    let response = post_json(
        app,
        "/api/v1/platforms/amove/test",
        json!({"config": {"api_key": "ak-123"}}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], false);
    assert_eq!(
        json["data"]["error"],
        "missing required configuration fields: workspace_id"
    );
}

#[tokio::test]
async fn stored_connection_test_passes_for_valid_config() {
    let app = common::build_test_app();
    let org = Uuid::now_v7();
    configure(&app, org, "amove", amove_config()).await;

    let response = post_json(
        app,
        &format!("/api/v1/organizations/{org}/configurations/amove/test"),
        json!({}),
    )
    .await;

    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], true);
    assert!(json["data"]["error"].is_null());
}

// ---------------------------------------------------------------------------
// Freelancers and onboarding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_freelancer_is_rejected() {
    let app = common::build_test_app();

    let response = post_json(
        app,
        "/api/v1/freelancers",
        json!({"organization_id": Uuid::now_v7(), "full_name": "", "email": "x@example.com"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn onboarding_reports_partial_failure() {
    let app = common::build_test_app();
    let org = Uuid::now_v7();
    let id = create_freelancer(&app, org, "Grace").await;
    configure(&app, org, "amove", amove_config()).await;

    let response = post_json(
        app.clone(),
        &format!("/api/v1/freelancers/{id}/onboard"),
        json!({"platform_ids": ["amove", "fiverr"]}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let progress = body_json(response).await["data"].clone();
    assert_eq!(progress["total_platforms"], 2);
    assert_eq!(progress["completed_platforms"], 1);
    assert_eq!(progress["failed_platforms"], 1);
    assert_eq!(progress["status"], "failed");
    assert_eq!(progress["errors"][0]["platform"], "fiverr");
    assert_eq!(progress["errors"][0]["error"], "platform not enabled");

    let response = get(app.clone(), &format!("/api/v1/freelancers/{id}/progress")).await;
    assert_eq!(body_json(response).await["data"], progress);

    let response = get(app.clone(), &format!("/api/v1/freelancers/{id}")).await;
    assert_eq!(body_json(response).await["data"]["status"], "active");

    let response = get(app, &format!("/api/v1/freelancers/{id}/associations")).await;
    let json = body_json(response).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["platform_id"], "amove");
    assert_eq!(rows[0]["status"], "active");
}

#[tokio::test]
async fn onboarding_unknown_freelancer_returns_404() {
    let app = common::build_test_app();

    let response = post_json(
        app,
        &format!("/api/v1/freelancers/{}/onboard", Uuid::now_v7()),
        json!({"platform_ids": ["amove"]}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn progress_before_any_batch_returns_404() {
    let app = common::build_test_app();
    let id = create_freelancer(&app, Uuid::now_v7(), "Ada").await;

    let response = get(app, &format!("/api/v1/freelancers/{id}/progress")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn toggle_round_trip() {
    let app = common::build_test_app();
    let org = Uuid::now_v7();
    let id = create_freelancer(&app, org, "Linus").await;
    configure(&app, org, "amove", amove_config()).await;
    let uri = format!("/api/v1/freelancers/{id}/platforms/amove/toggle");

    let on = body_json(post_json(app.clone(), &uri, json!({"enabled": true})).await).await;
    assert_eq!(on["data"]["outcome"], "activated");
    assert_eq!(on["data"]["association"]["status"], "active");

    let again = body_json(post_json(app.clone(), &uri, json!({"enabled": true})).await).await;
    assert_eq!(again["data"]["outcome"], "unchanged");

    let off = body_json(post_json(app.clone(), &uri, json!({"enabled": false})).await).await;
    assert_eq!(off["data"]["outcome"], "deactivated");
    assert_eq!(off["data"]["association"]["status"], "deactivated");

    let response = get(app, &format!("/api/v1/organizations/{org}/associations")).await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_remote_deletion_returns_502() {
    let app = common::build_test_app();
    let org = Uuid::now_v7();
    let id = create_freelancer(&app, org, "Hedy").await;
    configure(
        &app,
        org,
        "amove",
        json!({"config": {"api_key": "k", "workspace_id": "w", "mock_behavior": "fail_delete"}}),
    )
    .await;
    post_json(
        app.clone(),
        &format!("/api/v1/freelancers/{id}/onboard"),
        json!({"platform_ids": ["amove"]}),
    )
    .await;

    let response = post_json(
        app.clone(),
        &format!("/api/v1/freelancers/{id}/platforms/amove/deactivate"),
        json!({}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "DEACTIVATION_FAILED");

    let response = get(app, &format!("/api/v1/freelancers/{id}/associations")).await;
    assert_eq!(body_json(response).await["data"][0]["status"], "active");
}

#[tokio::test]
async fn profile_sync_reports_synced_platforms() {
    let app = common::build_test_app();
    let org = Uuid::now_v7();
    let id = create_freelancer(&app, org, "Katherine").await;
    configure(&app, org, "amove", amove_config()).await;
    post_json(
        app.clone(),
        &format!("/api/v1/freelancers/{id}/onboard"),
        json!({"platform_ids": ["amove"]}),
    )
    .await;

    let response = post_json(app, &format!("/api/v1/freelancers/{id}/sync"), json!({})).await;

    let json = body_json(response).await;
    assert_eq!(json["data"]["synced"], json!(["amove"]));
    assert_eq!(json["data"]["failed"], json!([]));
}

// ---------------------------------------------------------------------------
// Bulk
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bulk_onboard_and_status_changes() {
    let app = common::build_test_app();
    let org = Uuid::now_v7();
    let a = create_freelancer(&app, org, "Alan").await;
    let b = create_freelancer(&app, org, "Barbara").await;
    let missing = Uuid::now_v7().to_string();
    configure(&app, org, "amove", amove_config()).await;

    let response = post_json(
        app.clone(),
        "/api/v1/bulk/onboard",
        json!({"entity_ids": [a, missing, b], "platform_ids": ["amove"]}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await["data"].clone();
    assert_eq!(report["succeeded"], 2);
    assert_eq!(report["failed"], 1);
    assert_eq!(report["results"][0]["entity_id"], a);
    assert_eq!(report["results"][0]["result"], "onboarded");
    assert_eq!(report["results"][1]["result"], "failed");
    assert_eq!(report["results"][2]["entity_id"], b);

    let response = post_json(
        app.clone(),
        "/api/v1/bulk/deactivate",
        json!({"entity_ids": [a, b]}),
    )
    .await;
    let report = body_json(response).await["data"].clone();
    assert_eq!(report["succeeded"], 2);
    assert_eq!(report["results"][0]["status"], "inactive");

    let response = get(app.clone(), &format!("/api/v1/organizations/{org}/freelancers")).await;
    let json = body_json(response).await;
    assert!(json["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|f| f["status"] == "inactive"));

    let response = get(app, &format!("/api/v1/freelancers/{a}/associations")).await;
    assert_eq!(body_json(response).await["data"][0]["status"], "active");
}

#[tokio::test]
async fn bulk_with_no_entities_is_rejected() {
    let app = common::build_test_app();

    let response = post_json(app, "/api/v1/bulk/reactivate", json!({"entity_ids": []})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
