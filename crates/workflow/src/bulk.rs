//! Bulk operations over many freelancers.
//!
//! Each bulk call applies a single-freelancer operation to every id with
//! bounded concurrency. A failure for one freelancer is recorded in its
//! result and never stops the rest. Results follow input order.

use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use gigsync_core::progress::OnboardingProgress;
use gigsync_core::status::FreelancerStatus;
use gigsync_core::types::{EntityId, PlatformId};
use serde::Serialize;

use crate::engine::WorkflowEngine;
use crate::error::{WorkflowError, WorkflowResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum EntityOutcome {
    /// The batch ran; individual platforms may still have failed.
    Onboarded { progress: OnboardingProgress },
    StatusChanged { status: FreelancerStatus },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityResult {
    pub entity_id: EntityId,
    #[serde(flatten)]
    pub outcome: EntityOutcome,
}

impl EntityResult {
    pub fn is_success(&self) -> bool {
        !matches!(self.outcome, EntityOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkReport {
    pub results: Vec<EntityResult>,
    pub succeeded: usize,
    pub failed: usize,
}

impl BulkReport {
    fn new(results: Vec<EntityResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        Self {
            failed: results.len() - succeeded,
            succeeded,
            results,
        }
    }
}

pub struct BulkCoordinator {
    engine: Arc<WorkflowEngine>,
    concurrency: usize,
}

impl BulkCoordinator {
    pub fn new(engine: Arc<WorkflowEngine>) -> Self {
        let concurrency = engine.config().bulk_concurrency.max(1);
        Self {
            engine,
            concurrency,
        }
    }

    async fn for_each<F, Fut>(&self, entity_ids: &[EntityId], operation: F) -> BulkReport
    where
        F: Fn(EntityId) -> Fut,
        Fut: Future<Output = WorkflowResult<EntityOutcome>>,
    {
        let results = stream::iter(entity_ids.iter().copied())
            .map(|entity_id| {
                let run = operation(entity_id);
                async move {
                    let outcome = run.await.unwrap_or_else(|e| {
                        tracing::warn!(entity_id = %entity_id, error = %e, "Bulk item failed");
                        EntityOutcome::Failed {
                            error: e.to_string(),
                        }
                    });
                    EntityResult { entity_id, outcome }
                }
            })
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;
        let report = BulkReport::new(results);
        tracing::info!(
            total = report.results.len(),
            succeeded = report.succeeded,
            failed = report.failed,
            "Bulk operation finished"
        );
        report
    }

    /// Onboard every freelancer onto the same platforms.
    pub async fn bulk_onboard(&self, entity_ids: &[EntityId], platform_ids: &[PlatformId]) -> BulkReport {
        let engine = &self.engine;
        self.for_each(entity_ids, |entity_id| async move {
            let progress = engine.onboard(entity_id, platform_ids).await?;
            Ok::<_, WorkflowError>(EntityOutcome::Onboarded { progress })
        })
        .await
    }

    /// Mark freelancers `inactive`. Platform associations are not touched.
    pub async fn bulk_deactivate_entities(&self, entity_ids: &[EntityId]) -> BulkReport {
        self.set_status(entity_ids, FreelancerStatus::Inactive).await
    }

    /// Mark freelancers `active` again.
    pub async fn bulk_reactivate_entities(&self, entity_ids: &[EntityId]) -> BulkReport {
        self.set_status(entity_ids, FreelancerStatus::Active).await
    }

    async fn set_status(&self, entity_ids: &[EntityId], status: FreelancerStatus) -> BulkReport {
        let engine = &self.engine;
        self.for_each(entity_ids, |entity_id| async move {
            let freelancer = engine.set_entity_status(entity_id, status).await?;
            Ok::<_, WorkflowError>(EntityOutcome::StatusChanged {
                status: freelancer.status,
            })
        })
        .await
    }
}
