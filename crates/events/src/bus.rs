//! In-process status bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] fans [`StatusEvent`]s out to long-lived observers (HTTP
//! streams, caches, tests). It is shared via `Arc<EventBus>`.

use chrono::{DateTime, Utc};
use gigsync_core::progress::OnboardingProgress;
use gigsync_core::types::{EntityId, OrgId, PlatformId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event names published by the workflow and the synchronizer.
pub mod event_types {
    pub const ONBOARDING_PROGRESS: &str = "onboarding.progress";
    pub const ASSOCIATION_UPDATED: &str = "association.updated";
    pub const ASSOCIATION_REMOVED: &str = "association.removed";
    pub const CONFIGURATION_UPDATED: &str = "configuration.updated";
    pub const CONFIGURATION_REMOVED: &str = "configuration.removed";
}

// ---------------------------------------------------------------------------
// StatusEvent
// ---------------------------------------------------------------------------

/// A status change observers may care about.
///
/// Constructed via [`StatusEvent::new`] and narrowed with
/// [`for_org`](StatusEvent::for_org), [`for_entity`](StatusEvent::for_entity),
/// [`on_platform`](StatusEvent::on_platform) and
/// [`with_payload`](StatusEvent::with_payload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// Dot-separated event name, e.g. `"association.updated"`.
    pub event_type: String,

    pub organization_id: Option<OrgId>,

    /// The freelancer the event is about, if any.
    pub entity_id: Option<EntityId>,

    pub platform_id: Option<PlatformId>,

    /// Event-specific data, usually the changed row or progress snapshot.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl StatusEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            organization_id: None,
            entity_id: None,
            platform_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn for_org(mut self, organization_id: OrgId) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    pub fn for_entity(mut self, entity_id: EntityId) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    pub fn on_platform(mut self, platform_id: impl Into<PlatformId>) -> Self {
        self.platform_id = Some(platform_id.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// An `onboarding.progress` event carrying the full snapshot.
    pub fn progress(progress: &OnboardingProgress) -> Self {
        let event = Self::new(event_types::ONBOARDING_PROGRESS).for_entity(progress.entity_id);
        match serde_json::to_value(progress) {
            Ok(payload) => event.with_payload(payload),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode progress snapshot");
                event
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out bus.
///
/// ```rust
/// use gigsync_events::bus::{EventBus, StatusEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(StatusEvent::new("association.updated"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<StatusEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// Slow receivers observe `RecvError::Lagged` once the buffer wraps.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers; dropped if there are none.
    pub fn publish(&self, event: StatusEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
