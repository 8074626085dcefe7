use gigsync_core::error::CoreError;
use gigsync_core::platform::ProvisionError;
use gigsync_core::types::{EntityId, PlatformId};
use gigsync_db::StoreError;

/// Errors that abort a workflow operation.
///
/// Per-platform provisioning failures are not errors at this level; they
/// are recorded on the association and in the batch progress.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The store failed; the operation stopped because the outcome of the
    /// last write is unknown.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("freelancer {0} not found")]
    EntityNotFound(EntityId),

    /// Remote account deletion failed; the association is still `active`.
    #[error("failed to deactivate {platform}: {source}")]
    Deactivation {
        platform: PlatformId,
        #[source]
        source: ProvisionError,
    },

    /// The batch was cancelled. Everything finished before cancellation was
    /// persisted.
    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
