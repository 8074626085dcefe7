mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::{ids, Harness};
use gigsync_core::platform::PlatformError;
use gigsync_core::progress::PlatformFailure;
use gigsync_core::status::{AssociationStatus, FreelancerStatus, ProgressStatus};
use gigsync_db::models::ConfigPatch;
use gigsync_events::event_types;
use gigsync_workflow::{WorkflowConfig, WorkflowError};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn failure(platform: &str, error: &str) -> PlatformFailure {
    PlatformFailure {
        platform: platform.to_string(),
        error: error.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Batch outcomes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn disabled_platform_fails_alone_while_others_succeed() {
    let h = Harness::new(&["p1", "p2", "p3"]);
    let entity = h.freelancer("Ada").await;
    h.enable("p1").await;
    h.enable("p2").await;
    h.enable("p3").await;
    h.disable("p2").await;

    let progress = h.engine.onboard(entity, &ids(&["p1", "p2", "p3"])).await.unwrap();

    assert_eq!(progress.total_platforms, 3);
    assert_eq!(progress.completed_platforms, 2);
    assert_eq!(progress.failed_platforms, 1);
    assert_eq!(progress.status, ProgressStatus::Failed);
    assert_eq!(progress.errors, vec![failure("p2", "platform not enabled")]);
    assert!(progress.finished_at.is_some());
    assert!(progress.current_platform.is_none());

    assert_eq!(h.freelancer_status(entity).await, FreelancerStatus::Active);
    assert_eq!(h.module("p2").creates(), 0);
    assert!(h.association(entity, "p2").await.is_none());
    for platform in ["p1", "p3"] {
        let row = h.association(entity, platform).await.unwrap();
        assert_eq!(row.status, AssociationStatus::Active);
        assert!(row.remote_account_id.is_some());
        assert!(row.provisioned_at.is_some());
    }
}

#[tokio::test]
async fn all_platforms_succeeding_completes_the_batch() {
    let h = Harness::new(&["p1", "p2"]);
    let entity = h.freelancer("Grace").await;
    h.enable("p1").await;
    h.enable("p2").await;

    let progress = h.engine.onboard(entity, &ids(&["p1", "p2"])).await.unwrap();

    assert_eq!(progress.status, ProgressStatus::Completed);
    assert_eq!(progress.completed_platforms, 2);
    assert!(progress.errors.is_empty());
    assert_eq!(h.engine.progress(entity).await, Some(progress));
}

#[tokio::test]
async fn every_platform_failing_marks_freelancer_error() {
    let h = Harness::new(&["p1", "p2"]);
    let entity = h.freelancer("Linus").await;
    h.enable("p1").await;
    h.module("p1").fail_create(PlatformError::Rejected("email taken".into()));

    let progress = h.engine.onboard(entity, &ids(&["p1", "p2"])).await.unwrap();

    assert_eq!(progress.completed_platforms, 0);
    assert_eq!(
        progress.errors,
        vec![
            failure("p1", "request rejected: email taken"),
            failure("p2", "platform not enabled"),
        ]
    );
    assert_eq!(h.freelancer_status(entity).await, FreelancerStatus::Error);

    let row = h.association(entity, "p1").await.unwrap();
    assert_eq!(row.status, AssociationStatus::Failed);
    assert_eq!(row.last_error.as_deref(), Some("request rejected: email taken"));
}

#[tokio::test]
async fn empty_batch_finishes_immediately() {
    let h = Harness::new(&["p1"]);
    let entity = h.freelancer("Alan").await;

    let progress = h.engine.onboard(entity, &[]).await.unwrap();

    assert_eq!(progress.total_platforms, 0);
    assert_eq!(progress.status, ProgressStatus::Completed);
    assert_eq!(h.freelancer_status(entity).await, FreelancerStatus::Pending);
}

#[tokio::test]
async fn duplicate_platform_ids_are_processed_once() {
    let h = Harness::new(&["p1", "p2"]);
    let entity = h.freelancer("Barbara").await;
    h.enable("p1").await;
    h.enable("p2").await;

    let progress = h
        .engine
        .onboard(entity, &ids(&["p1", "p2", "p1"]))
        .await
        .unwrap();

    assert_eq!(progress.total_platforms, 2);
    assert_eq!(progress.completed_platforms, 2);
    assert_eq!(h.module("p1").creates(), 1);
    assert_eq!(h.association_rows(entity, "p1").await, 1);
}

// ---------------------------------------------------------------------------
// Configuration rejections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_module_is_reported_per_platform() {
    let h = Harness::new(&["p1"]);
    let entity = h.freelancer("Edsger").await;
    h.enable("p1").await;
    h.enable("ghost").await;

    let progress = h.engine.onboard(entity, &ids(&["ghost", "p1"])).await.unwrap();

    assert_eq!(progress.completed_platforms, 1);
    assert_eq!(progress.errors, vec![failure("ghost", "platform module not found")]);
    assert!(h.association(entity, "ghost").await.is_none());
}

#[tokio::test]
async fn enabled_but_empty_config_is_not_configured() {
    let h = Harness::new(&["p1"]);
    let entity = h.freelancer("Donald").await;
    h.engine
        .configurations()
        .set_enabled(h.org, "p1", true)
        .await
        .unwrap();

    let progress = h.engine.onboard(entity, &ids(&["p1"])).await.unwrap();

    assert_eq!(progress.errors, vec![failure("p1", "platform not configured")]);
    assert_eq!(h.module("p1").initializes(), 0);
    assert!(h.association(entity, "p1").await.is_none());
}

#[tokio::test]
async fn config_missing_required_field_never_reaches_the_module() {
    let h = Harness::new(&["p1"]);
    let entity = h.freelancer("Frances").await;
    h.engine
        .configurations()
        .upsert(
            h.org,
            "p1",
            ConfigPatch {
                enabled: None,
                config: json!({"region": "eu"}).as_object().cloned(),
            },
        )
        .await
        .unwrap();

    let progress = h.engine.onboard(entity, &ids(&["p1"])).await.unwrap();

    assert_eq!(
        progress.errors,
        vec![failure("p1", "missing required configuration fields: token")]
    );
    assert_eq!(h.module("p1").initializes(), 0);
}

#[tokio::test]
async fn initialize_failure_is_recorded_on_the_association() {
    let h = Harness::new(&["p1"]);
    let entity = h.freelancer("Ken").await;
    h.enable("p1").await;
    h.module("p1")
        .fail_initialize(PlatformError::Unauthorized("token revoked".into()));

    let progress = h.engine.onboard(entity, &ids(&["p1"])).await.unwrap();

    assert_eq!(
        progress.errors,
        vec![failure("p1", "credentials rejected: token revoked")]
    );
    assert_eq!(h.module("p1").creates(), 0);
    let row = h.association(entity, "p1").await.unwrap();
    assert_eq!(row.status, AssociationStatus::Failed);
    assert!(row.remote_account_id.is_none());
}

// ---------------------------------------------------------------------------
// At most one association per pair
// ---------------------------------------------------------------------------

#[tokio::test]
async fn repeated_onboarding_reuses_the_active_row() {
    let h = Harness::new(&["p1"]);
    let entity = h.freelancer("Niklaus").await;
    h.enable("p1").await;

    h.engine.onboard(entity, &ids(&["p1"])).await.unwrap();
    let first = h.association(entity, "p1").await.unwrap();
    let again = h.engine.onboard(entity, &ids(&["p1"])).await.unwrap();

    assert_eq!(again.completed_platforms, 1);
    assert_eq!(h.module("p1").creates(), 1);
    assert_eq!(h.association_rows(entity, "p1").await, 1);
    assert_eq!(h.association(entity, "p1").await.unwrap(), first);
}

#[tokio::test]
async fn concurrent_onboarding_of_one_freelancer_creates_one_account() {
    let h = Harness::new(&["p1", "p2"]);
    let entity = h.freelancer("Tony").await;
    h.enable("p1").await;
    h.enable("p2").await;
    h.module("p1").delay_create(Duration::from_millis(20));

    let platforms = ids(&["p1", "p2"]);
    let runs = (0..4).map(|_| {
        let engine = Arc::clone(&h.engine);
        let platforms = platforms.clone();
        tokio::spawn(async move { engine.onboard(entity, &platforms).await })
    });
    for run in futures::future::join_all(runs).await {
        let progress = run.unwrap().unwrap();
        assert_eq!(progress.completed_platforms, 2);
    }

    assert_eq!(h.module("p1").creates(), 1);
    assert_eq!(h.module("p2").creates(), 1);
    assert_eq!(h.association_rows(entity, "p1").await, 1);
    assert_eq!(h.association_rows(entity, "p2").await, 1);
}

#[tokio::test]
async fn failed_row_is_retried_in_place() {
    let h = Harness::new(&["p1"]);
    let entity = h.freelancer("Radia").await;
    h.enable("p1").await;
    h.module("p1").fail_create(PlatformError::Unreachable("down".into()));

    h.engine.onboard(entity, &ids(&["p1"])).await.unwrap();
    let failed = h.association(entity, "p1").await.unwrap();
    assert_eq!(failed.status, AssociationStatus::Failed);

    h.module("p1").heal();
    let progress = h.engine.onboard(entity, &ids(&["p1"])).await.unwrap();

    assert_eq!(progress.status, ProgressStatus::Completed);
    let active = h.association(entity, "p1").await.unwrap();
    assert_eq!(active.id, failed.id);
    assert_eq!(active.status, AssociationStatus::Active);
    assert!(active.last_error.is_none());
    assert_eq!(h.association_rows(entity, "p1").await, 1);
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn published_progress_never_goes_backwards() {
    let h = Harness::with_config(
        &["p1", "p2", "p3", "p4"],
        WorkflowConfig {
            platform_concurrency: 2,
            ..WorkflowConfig::default()
        },
    );
    let entity = h.freelancer("Margaret").await;
    for platform in ["p1", "p2", "p3"] {
        h.enable(platform).await;
    }
    h.module("p2").fail_create(PlatformError::Rejected("nope".into()));
    h.module("p3").delay_create(Duration::from_millis(10));
    let mut events = h.bus.subscribe();

    let progress = h
        .engine
        .onboard(entity, &ids(&["p1", "p2", "p3", "p4"]))
        .await
        .unwrap();

    let mut snapshots = Vec::new();
    while let Ok(event) = events.try_recv() {
        if event.event_type == event_types::ONBOARDING_PROGRESS {
            assert_eq!(event.entity_id, Some(entity));
            snapshots.push(event.payload);
        }
    }

    // Start, one per platform, then the final snapshot.
    assert_eq!(snapshots.len(), 6);
    let mut last = (0, 0);
    for snapshot in &snapshots {
        let completed = snapshot["completed_platforms"].as_u64().unwrap();
        let failed = snapshot["failed_platforms"].as_u64().unwrap();
        assert!(completed >= last.0 && failed >= last.1);
        assert!(completed + failed <= 4);
        last = (completed, failed);
    }
    assert_eq!(last, (2, 2));
    assert_eq!(snapshots[0]["status"], "processing");
    assert_eq!(snapshots[5]["status"], "failed");
    assert_eq!(progress.processed(), 4);
}

#[tokio::test]
async fn errors_follow_requested_order() {
    let h = Harness::new(&["p1", "p2", "p3"]);
    let entity = h.freelancer("Hedy").await;
    h.enable("p1").await;
    h.enable("p3").await;
    h.module("p1").delay_create(Duration::from_millis(30));
    h.module("p1").fail_create(PlatformError::Timeout);
    h.module("p3").fail_create(PlatformError::Rejected("x".into()));

    let progress = h
        .engine
        .onboard(entity, &ids(&["p3", "p1", "p2"]))
        .await
        .unwrap();

    let order: Vec<_> = progress.errors.iter().map(|f| f.platform.as_str()).collect();
    assert_eq!(order, vec!["p3", "p1", "p2"]);
}

#[tokio::test]
async fn platform_concurrency_is_bounded() {
    let platforms = ["p1", "p2", "p3", "p4", "p5", "p6"];
    let h = Harness::with_config(
        &platforms,
        WorkflowConfig {
            platform_concurrency: 2,
            ..WorkflowConfig::default()
        },
    );
    let entity = h.freelancer("Sophie").await;
    for platform in platforms {
        h.enable(platform).await;
        h.module(platform).delay_create(Duration::from_millis(15));
    }

    let progress = h.engine.onboard(entity, &ids(&platforms)).await.unwrap();

    assert_eq!(progress.completed_platforms, 6);
    assert!(h.gauge.peak() <= 2, "peak was {}", h.gauge.peak());
}

// ---------------------------------------------------------------------------
// Timeouts, cancellation, store failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn slow_platform_times_out_without_blocking_the_rest() {
    let h = Harness::with_config(
        &["slow", "fast"],
        WorkflowConfig {
            platform_timeout: Duration::from_millis(50),
            ..WorkflowConfig::default()
        },
    );
    let entity = h.freelancer("Katherine").await;
    h.enable("slow").await;
    h.enable("fast").await;
    h.module("slow").delay_create(Duration::from_secs(5));

    let progress = h.engine.onboard(entity, &ids(&["slow", "fast"])).await.unwrap();

    assert_eq!(progress.completed_platforms, 1);
    assert_eq!(progress.errors, vec![failure("slow", "timeout")]);
    let row = h.association(entity, "slow").await.unwrap();
    assert_eq!(row.status, AssociationStatus::Failed);
    assert_eq!(row.last_error.as_deref(), Some("timeout"));
}

#[tokio::test]
async fn cancelling_leaves_in_flight_rows_provisioning() {
    let h = Harness::new(&["p1"]);
    let entity = h.freelancer("Mary").await;
    h.enable("p1").await;
    h.module("p1").delay_create(Duration::from_secs(10));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = h
        .engine
        .onboard_with_cancel(entity, &ids(&["p1"]), cancel)
        .await;

    assert_matches!(result, Err(WorkflowError::Cancelled));
    let row = h.association(entity, "p1").await.unwrap();
    assert_eq!(row.status, AssociationStatus::Provisioning);
    assert_eq!(h.freelancer_status(entity).await, FreelancerStatus::Pending);

    let progress = h.engine.progress(entity).await.unwrap();
    assert!(progress.is_finished());
    assert_eq!(progress.errors, vec![failure("p1", "cancelled")]);
}

#[tokio::test]
async fn interrupted_row_is_picked_up_by_the_next_batch() {
    let h = Harness::new(&["p1"]);
    let entity = h.freelancer("Jean").await;
    h.enable("p1").await;
    h.module("p1").delay_create(Duration::from_secs(10));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });
    let result = h
        .engine
        .onboard_with_cancel(entity, &ids(&["p1"]), cancel)
        .await;
    assert_matches!(result, Err(WorkflowError::Cancelled));

    h.module("p1").delay_create(Duration::ZERO);
    let progress = h.engine.onboard(entity, &ids(&["p1"])).await.unwrap();

    assert_eq!(progress.completed_platforms, 1);
    assert_eq!(h.association(entity, "p1").await.unwrap().status, AssociationStatus::Active);
    assert_eq!(h.association_rows(entity, "p1").await, 1);
}

#[tokio::test]
async fn store_failure_aborts_with_store_error() {
    let h = Harness::new(&["p1"]);
    let entity = h.freelancer("Evelyn").await;
    h.enable("p1").await;
    h.store.fail_writes(true);

    let result = h.engine.onboard(entity, &ids(&["p1"])).await;

    assert_matches!(result, Err(WorkflowError::Store(_)));
    assert_eq!(h.module("p1").creates(), 0);

    h.store.fail_writes(false);
    assert_eq!(h.freelancer_status(entity).await, FreelancerStatus::Pending);
}

#[tokio::test]
async fn unreadable_store_is_not_reported_as_missing_freelancer() {
    let h = Harness::new(&["p1"]);
    let entity = h.freelancer("Adele").await;
    h.store.fail_reads(true);

    let result = h.engine.onboard(entity, &ids(&["p1"])).await;

    assert_matches!(result, Err(WorkflowError::Store(_)));
}

#[tokio::test]
async fn unknown_freelancer_is_rejected() {
    let h = Harness::new(&["p1"]);
    let missing = Uuid::now_v7();

    let result = h.engine.onboard(missing, &ids(&["p1"])).await;

    assert_matches!(result, Err(WorkflowError::EntityNotFound(id)) if id == missing);
    assert!(h.engine.progress(missing).await.is_none());
}
