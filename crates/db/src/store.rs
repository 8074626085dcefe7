//! The generic record-store contract.
//!
//! Rows travel as JSON objects (`serde_json::Value`). Each operation acts on
//! one table with an AND-ed equality [`Filter`] and is atomic on its own;
//! nothing here assumes multi-statement transactions.

use async_trait::async_trait;
use gigsync_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// The tables the workflow persists to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Freelancers,
    PlatformConfigurations,
    FreelancerPlatforms,
}

impl Table {
    pub const ALL: [Table; 3] = [
        Table::Freelancers,
        Table::PlatformConfigurations,
        Table::FreelancerPlatforms,
    ];

    /// SQL table name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Freelancers => "freelancers",
            Self::PlatformConfigurations => "platform_configurations",
            Self::FreelancerPlatforms => "freelancer_platforms",
        }
    }

    /// Columns forming the table's unique key.
    pub fn key_columns(self) -> &'static [&'static str] {
        match self {
            Self::Freelancers => &["id"],
            Self::PlatformConfigurations => &["organization_id", "platform_id"],
            Self::FreelancerPlatforms => &["freelancer_id", "platform_id"],
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Conjunction of `column = value` conditions. An empty filter matches
/// every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a `column = value` condition.
    pub fn eq(mut self, column: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.conditions.push((column.to_string(), value));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether `row` satisfies every condition. A missing column compares
    /// equal to `null`.
    pub fn matches(&self, row: &Value) -> bool {
        self.conditions.iter().all(|(column, expected)| {
            row.get(column).unwrap_or(&Value::Null) == expected
        })
    }

    /// Filter selecting exactly the row whose key columns equal `row`'s.
    pub fn by_key(table: Table, row: &Value) -> Self {
        table
            .key_columns()
            .iter()
            .fold(Filter::all(), |filter, column| {
                filter.eq(column, row.get(*column).cloned().unwrap_or(Value::Null))
            })
    }
}

// ---------------------------------------------------------------------------
// Change events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A committed row change. For deletes `row` is the row as it was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    pub row: Value,
    pub observed_at: Timestamp,
}

impl ChangeEvent {
    pub fn new(table: Table, kind: ChangeKind, row: Value) -> Self {
        Self {
            table,
            kind,
            row,
            observed_at: chrono::Utc::now(),
        }
    }
}

/// Which changes a subscriber wants: optionally one table, plus an equality
/// filter on the changed row (typically `organization_id = X`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeScope {
    pub table: Option<Table>,
    pub filter: Filter,
}

impl ChangeScope {
    pub fn everything() -> Self {
        Self::default()
    }

    /// Every table, rows of one organization.
    pub fn organization(organization_id: gigsync_core::types::OrgId) -> Self {
        Self {
            table: None,
            filter: Filter::all().eq("organization_id", organization_id),
        }
    }

    /// Narrow the scope to one table.
    pub fn in_table(mut self, table: Table) -> Self {
        self.table = Some(table);
        self
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        self.table.map_or(true, |t| t == event.table) && self.filter.matches(&event.row)
    }
}

/// What a subscriber receives.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Change(ChangeEvent),
    /// The subscriber fell behind and `skipped` events were lost; any state
    /// derived from the stream must be reloaded from the store.
    Resync { skipped: u64 },
}

/// A scoped view over a store's change feed.
pub struct Subscription {
    receiver: broadcast::Receiver<ChangeEvent>,
    scope: ChangeScope,
}

impl Subscription {
    pub fn new(receiver: broadcast::Receiver<ChangeEvent>, scope: ChangeScope) -> Self {
        Self { receiver, scope }
    }

    pub fn scope(&self) -> &ChangeScope {
        &self.scope
    }

    /// Wait for the next in-scope notification. `None` once the store has
    /// shut down.
    pub async fn recv(&mut self) -> Option<Notification> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.scope.matches(&event) => {
                    return Some(Notification::Change(event));
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Change subscription lagged");
                    return Some(Notification::Resync { skipped });
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("duplicate key in {table}: {key}")]
    Conflict { table: &'static str, key: String },

    #[error("failed to encode {table} row: {source}")]
    Encode {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode {table} row: {source}")]
    Decode {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

// ---------------------------------------------------------------------------
// RecordStore
// ---------------------------------------------------------------------------

/// Generic table store with change subscriptions.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Rows matching `filter`, in insertion order.
    async fn select(&self, table: Table, filter: &Filter) -> Result<Vec<Value>, StoreError>;

    /// Insert a full row. Fails with [`StoreError::Conflict`] if a row with
    /// the same key already exists.
    async fn insert(&self, table: Table, row: Value) -> Result<Value, StoreError>;

    /// Merge `patch` into every matching row, returning the updated rows.
    async fn update(
        &self,
        table: Table,
        filter: &Filter,
        patch: Value,
    ) -> Result<Vec<Value>, StoreError>;

    /// Delete every matching row, returning how many were removed.
    async fn delete(&self, table: Table, filter: &Filter) -> Result<u64, StoreError>;

    /// Subscribe to committed changes within `scope`.
    fn subscribe(&self, scope: ChangeScope) -> Subscription;

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn select_one(&self, table: Table, filter: &Filter) -> Result<Option<Value>, StoreError> {
        Ok(self.select(table, filter).await?.into_iter().next())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
