//! Status cache kept current from two directions.
//!
//! Local writes made through the workflow are recorded immediately
//! ([`StatusSynchronizer::record_association`],
//! [`StatusSynchronizer::record_configuration`]). Writes made elsewhere
//! arrive through the store's change feed and are merged by
//! [`StatusSynchronizer::apply_change`]. Both paths go through the same
//! merge: an incoming row replaces the cached one only if its `updated_at`
//! is not older, and an identical row is a no-op. A notification echoing a
//! local write therefore never publishes twice, and a stale notification
//! never regresses a newer local update.
//!
//! When the change feed lags, the affected scope is reloaded from the store.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use gigsync_core::types::{EntityId, OrgId, PlatformId, Timestamp};
use gigsync_db::models::{FreelancerPlatformAssociation, PlatformConfiguration};
use gigsync_db::{
    ChangeEvent, ChangeKind, ChangeScope, Filter, Notification, RecordStore, StoreError,
    Subscription, Table,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bus::{event_types, EventBus, StatusEvent};

/// Outcome of merging one row into the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    /// The cache changed and observers were notified.
    Applied,
    /// The cache already held exactly this row.
    Unchanged,
    /// The cache holds a newer version; the incoming row was dropped.
    Stale,
    /// Not a row this cache tracks.
    Ignored,
}

trait Versioned: Clone + PartialEq + Serialize {
    fn version(&self) -> Timestamp;
}

impl Versioned for FreelancerPlatformAssociation {
    fn version(&self) -> Timestamp {
        self.updated_at
    }
}

impl Versioned for PlatformConfiguration {
    fn version(&self) -> Timestamp {
        self.updated_at
    }
}

fn merge<K: Eq + Hash, T: Versioned>(cache: &mut HashMap<K, T>, key: K, incoming: &T) -> Merge {
    match cache.get(&key) {
        Some(current) if current == incoming => Merge::Unchanged,
        Some(current) if incoming.version() < current.version() => Merge::Stale,
        _ => {
            cache.insert(key, incoming.clone());
            Merge::Applied
        }
    }
}

/// Remove `key` unless the cache already holds something newer than the
/// deleted row (a re-insert that overtook the delete notification).
fn evict<K: Eq + Hash, T: Versioned>(cache: &mut HashMap<K, T>, key: &K, deleted: &T) -> Merge {
    match cache.get(key) {
        None => Merge::Unchanged,
        Some(current) if current.version() > deleted.version() => Merge::Stale,
        Some(_) => {
            cache.remove(key);
            Merge::Applied
        }
    }
}

fn in_scope<T: Serialize>(filter: &Filter, row: &T) -> bool {
    serde_json::to_value(row).is_ok_and(|value| filter.matches(&value))
}

fn decode_rows<T: DeserializeOwned>(table: Table, rows: Vec<serde_json::Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(table = %table, error = %e, "Skipping undecodable row");
                None
            }
        })
        .collect()
}

fn association_event(event_type: &str, row: &FreelancerPlatformAssociation) -> StatusEvent {
    StatusEvent::new(event_type)
        .for_org(row.organization_id)
        .for_entity(row.freelancer_id)
        .on_platform(row.platform_id.clone())
        .with_payload(serde_json::to_value(row).unwrap_or_default())
}

fn configuration_event(event_type: &str, row: &PlatformConfiguration) -> StatusEvent {
    StatusEvent::new(event_type)
        .for_org(row.organization_id)
        .on_platform(row.platform_id.clone())
        .with_payload(serde_json::json!({
            "enabled": row.enabled,
            "configured": row.is_configured(),
            "updated_at": row.updated_at,
        }))
}

type AssociationKey = (EntityId, PlatformId);
type ConfigurationKey = (OrgId, PlatformId);

/// In-memory view of association and configuration status.
pub struct StatusSynchronizer {
    store: Arc<dyn RecordStore>,
    bus: Arc<EventBus>,
    associations: RwLock<HashMap<AssociationKey, FreelancerPlatformAssociation>>,
    configurations: RwLock<HashMap<ConfigurationKey, PlatformConfiguration>>,
}

impl StatusSynchronizer {
    pub fn new(store: Arc<dyn RecordStore>, bus: Arc<EventBus>) -> Self {
        Self {
            store,
            bus,
            associations: RwLock::new(HashMap::new()),
            configurations: RwLock::new(HashMap::new()),
        }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    // -- local (optimistic) writes ------------------------------------------

    /// Record an association this process just wrote.
    pub async fn record_association(&self, row: &FreelancerPlatformAssociation) -> Merge {
        let key = (row.freelancer_id, row.platform_id.clone());
        let outcome = merge(&mut *self.associations.write().await, key, row);
        if outcome == Merge::Applied {
            self.bus
                .publish(association_event(event_types::ASSOCIATION_UPDATED, row));
        }
        outcome
    }

    /// Record a configuration this process just wrote.
    pub async fn record_configuration(&self, row: &PlatformConfiguration) -> Merge {
        let key = (row.organization_id, row.platform_id.clone());
        let outcome = merge(&mut *self.configurations.write().await, key, row);
        if outcome == Merge::Applied {
            self.bus
                .publish(configuration_event(event_types::CONFIGURATION_UPDATED, row));
        }
        outcome
    }

    /// Record that this process deleted a configuration.
    pub async fn forget_configuration(&self, row: &PlatformConfiguration) -> Merge {
        let key = (row.organization_id, row.platform_id.clone());
        let outcome = evict(&mut *self.configurations.write().await, &key, row);
        if outcome == Merge::Applied {
            self.bus
                .publish(configuration_event(event_types::CONFIGURATION_REMOVED, row));
        }
        outcome
    }

    // -- inbound change feed ------------------------------------------------

    /// Merge one committed change from the store's feed.
    pub async fn apply_change(&self, event: &ChangeEvent) -> Merge {
        match event.table {
            Table::FreelancerPlatforms => {
                let Some(row) = self.decode::<FreelancerPlatformAssociation>(event) else {
                    return Merge::Ignored;
                };
                let key = (row.freelancer_id, row.platform_id.clone());
                match event.kind {
                    ChangeKind::Delete => {
                        let outcome = evict(&mut *self.associations.write().await, &key, &row);
                        if outcome == Merge::Applied {
                            self.bus
                                .publish(association_event(event_types::ASSOCIATION_REMOVED, &row));
                        }
                        outcome
                    }
                    ChangeKind::Insert | ChangeKind::Update => self.record_association(&row).await,
                }
            }
            Table::PlatformConfigurations => {
                let Some(row) = self.decode::<PlatformConfiguration>(event) else {
                    return Merge::Ignored;
                };
                match event.kind {
                    ChangeKind::Delete => self.forget_configuration(&row).await,
                    ChangeKind::Insert | ChangeKind::Update => {
                        self.record_configuration(&row).await
                    }
                }
            }
            Table::Freelancers => Merge::Ignored,
        }
    }

    fn decode<T: DeserializeOwned>(&self, event: &ChangeEvent) -> Option<T> {
        match serde_json::from_value(event.row.clone()) {
            Ok(row) => Some(row),
            Err(e) => {
                tracing::warn!(table = %event.table, error = %e, "Ignoring undecodable change");
                None
            }
        }
    }

    /// Reload every cached row covered by `scope` from the store.
    ///
    /// Rows no longer in the store are evicted; rows the store returns are
    /// merged with the usual timestamp rule. Returns how many rows were read.
    pub async fn resync(&self, scope: &ChangeScope) -> Result<usize, StoreError> {
        let wants = |table: Table| scope.table.map_or(true, |t| t == table);
        let mut reloaded = 0;

        if wants(Table::FreelancerPlatforms) {
            let rows = self
                .store
                .select(Table::FreelancerPlatforms, &scope.filter)
                .await?;
            reloaded += rows.len();
            let fresh: Vec<FreelancerPlatformAssociation> =
                decode_rows(Table::FreelancerPlatforms, rows);

            let removed: Vec<FreelancerPlatformAssociation> = {
                let mut cache = self.associations.write().await;
                let gone: Vec<AssociationKey> = cache
                    .iter()
                    .filter(|(key, cached)| {
                        in_scope(&scope.filter, *cached)
                            && !fresh
                                .iter()
                                .any(|f| f.freelancer_id == key.0 && f.platform_id == key.1)
                    })
                    .map(|(key, _)| key.clone())
                    .collect();
                gone.iter().filter_map(|key| cache.remove(key)).collect()
            };
            for row in &removed {
                self.bus
                    .publish(association_event(event_types::ASSOCIATION_REMOVED, row));
            }
            for row in &fresh {
                self.record_association(row).await;
            }
        }

        if wants(Table::PlatformConfigurations) {
            let rows = self
                .store
                .select(Table::PlatformConfigurations, &scope.filter)
                .await?;
            reloaded += rows.len();
            let fresh: Vec<PlatformConfiguration> =
                decode_rows(Table::PlatformConfigurations, rows);

            let removed: Vec<PlatformConfiguration> = {
                let mut cache = self.configurations.write().await;
                let gone: Vec<ConfigurationKey> = cache
                    .iter()
                    .filter(|(key, cached)| {
                        in_scope(&scope.filter, *cached)
                            && !fresh
                                .iter()
                                .any(|f| f.organization_id == key.0 && f.platform_id == key.1)
                    })
                    .map(|(key, _)| key.clone())
                    .collect();
                gone.iter().filter_map(|key| cache.remove(key)).collect()
            };
            for row in &removed {
                self.bus
                    .publish(configuration_event(event_types::CONFIGURATION_REMOVED, row));
            }
            for row in &fresh {
                self.record_configuration(row).await;
            }
        }

        tracing::info!(reloaded, "Status cache resynchronized");
        Ok(reloaded)
    }

    // -- reads --------------------------------------------------------------

    pub async fn association(
        &self,
        entity_id: EntityId,
        platform_id: &str,
    ) -> Option<FreelancerPlatformAssociation> {
        self.associations
            .read()
            .await
            .get(&(entity_id, platform_id.to_string()))
            .cloned()
    }

    /// Cached associations of one freelancer, ordered by platform id.
    pub async fn associations_for_entity(
        &self,
        entity_id: EntityId,
    ) -> Vec<FreelancerPlatformAssociation> {
        let mut rows: Vec<_> = self
            .associations
            .read()
            .await
            .values()
            .filter(|a| a.freelancer_id == entity_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.platform_id.cmp(&b.platform_id));
        rows
    }

    pub async fn configuration(
        &self,
        organization_id: OrgId,
        platform_id: &str,
    ) -> Option<PlatformConfiguration> {
        self.configurations
            .read()
            .await
            .get(&(organization_id, platform_id.to_string()))
            .cloned()
    }

    /// Cached configurations of one organization, ordered by platform id.
    pub async fn configurations_for_org(&self, organization_id: OrgId) -> Vec<PlatformConfiguration> {
        let mut rows: Vec<_> = self
            .configurations
            .read()
            .await
            .values()
            .filter(|c| c.organization_id == organization_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.platform_id.cmp(&b.platform_id));
        rows
    }

    // -- background loop ----------------------------------------------------

    /// Consume `subscription` until it closes or `cancel` fires.
    pub async fn run(self: Arc<Self>, mut subscription: Subscription, cancel: CancellationToken) {
        tracing::info!(scope = ?subscription.scope(), "Status synchronizer started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Status synchronizer cancelled");
                    break;
                }
                next = subscription.recv() => match next {
                    Some(Notification::Change(event)) => {
                        let outcome = self.apply_change(&event).await;
                        tracing::debug!(table = %event.table, ?outcome, "Change merged");
                    }
                    Some(Notification::Resync { skipped }) => {
                        tracing::warn!(skipped, "Change feed lagged, reloading status cache");
                        let scope = subscription.scope().clone();
                        if let Err(e) = self.resync(&scope).await {
                            tracing::error!(error = %e, "Status cache resync failed");
                        }
                    }
                    None => {
                        tracing::info!("Change feed closed, status synchronizer stopping");
                        break;
                    }
                },
            }
        }
    }

    /// Subscribe to `scope` now and run the merge loop on a background task.
    ///
    /// The subscription is taken before this returns, so no change committed
    /// afterwards is missed.
    pub fn spawn(self: &Arc<Self>, scope: ChangeScope, cancel: CancellationToken) -> JoinHandle<()> {
        let subscription = self.store.subscribe(scope);
        tokio::spawn(Arc::clone(self).run(subscription, cancel))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
