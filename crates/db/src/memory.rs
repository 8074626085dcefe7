//! In-process [`RecordStore`].
//!
//! All tables sit behind one `RwLock`, so every operation is atomic and the
//! change feed is published in commit order (events are sent while the
//! write lock is held).

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};

use crate::store::{
    ChangeEvent, ChangeKind, ChangeScope, Filter, RecordStore, StoreError, Subscription, Table,
};

/// Buffer capacity for the change feed.
const CHANGE_CHANNEL_CAPACITY: usize = 1024;

pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<Value>>>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(CHANGE_CHANNEL_CAPACITY)
    }

    /// Create a store whose change feed buffers `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(capacity);
        Self {
            tables: RwLock::new(HashMap::new()),
            changes,
        }
    }

    /// Total rows in `table`.
    pub async fn count(&self, table: Table) -> usize {
        self.tables.read().await.get(&table).map_or(0, Vec::len)
    }

    fn publish(&self, table: Table, kind: ChangeKind, row: &Value) {
        // Zero receivers is fine.
        let _ = self.changes.send(ChangeEvent::new(table, kind, row.clone()));
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn require_object<'a>(
    what: &str,
    value: &'a Value,
) -> Result<&'a serde_json::Map<String, Value>, StoreError> {
    value
        .as_object()
        .ok_or_else(|| StoreError::InvalidQuery(format!("{what} must be a JSON object")))
}

fn key_description(table: Table, row: &Value) -> String {
    table
        .key_columns()
        .iter()
        .map(|column| format!("{column}={}", row.get(*column).unwrap_or(&Value::Null)))
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, table: Table, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table)
            .map(|rows| rows.iter().filter(|row| filter.matches(row)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, StoreError> {
        require_object("Inserted row", &row)?;

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table).or_default();

        let key = Filter::by_key(table, &row);
        if rows.iter().any(|existing| key.matches(existing)) {
            return Err(StoreError::Conflict {
                table: table.name(),
                key: key_description(table, &row),
            });
        }

        rows.push(row.clone());
        self.publish(table, ChangeKind::Insert, &row);
        Ok(row)
    }

    async fn update(
        &self,
        table: Table,
        filter: &Filter,
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let patch = require_object("Update patch", &patch)?;
        if let Some(column) = table.key_columns().iter().find(|c| patch.contains_key(**c)) {
            return Err(StoreError::InvalidQuery(format!(
                "Key column '{column}' cannot be updated"
            )));
        }

        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&table) else {
            return Ok(Vec::new());
        };

        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|row| filter.matches(row)) {
            if let Some(fields) = row.as_object_mut() {
                for (column, value) in patch {
                    fields.insert(column.clone(), value.clone());
                }
            }
            self.publish(table, ChangeKind::Update, row);
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&table) else {
            return Ok(0);
        };

        let (removed, kept): (Vec<Value>, Vec<Value>) =
            rows.drain(..).partition(|row| filter.matches(row));
        *rows = kept;

        for row in &removed {
            self.publish(table, ChangeKind::Delete, row);
        }
        Ok(removed.len() as u64)
    }

    fn subscribe(&self, scope: ChangeScope) -> Subscription {
        Subscription::new(self.changes.subscribe(), scope)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
