//! Status propagation for the provisioning workflow.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`StatusEvent`]: the event envelope (progress, association and
//!   configuration changes).
//! - [`StatusSynchronizer`]: status cache fed by local writes and the
//!   store's change feed, merged by timestamp.

pub mod bus;
pub mod synchronizer;

pub use bus::{event_types, EventBus, StatusEvent};
pub use synchronizer::{Merge, StatusSynchronizer};
