//! Freelancer platform provisioning workflow.
//!
//! - [`ConfigurationStore`]: per-organization enable flag and config blob.
//! - [`ConnectionTester`]: read-only validation of a configuration.
//! - [`AssociationStore`]: per-(freelancer, platform) lifecycle rows.
//! - [`WorkflowEngine`]: onboarding, deactivation, toggling, profile sync.
//! - [`BulkCoordinator`]: the same operations over many freelancers.

pub mod association_store;
pub mod bulk;
pub mod config;
pub mod config_store;
pub mod engine;
pub mod error;
pub mod tester;

pub use association_store::AssociationStore;
pub use bulk::{BulkCoordinator, BulkReport, EntityOutcome, EntityResult};
pub use config::WorkflowConfig;
pub use config_store::ConfigurationStore;
pub use engine::{SyncReport, ToggleOutcome, WorkflowEngine};
pub use error::{WorkflowError, WorkflowResult};
pub use tester::ConnectionTester;
