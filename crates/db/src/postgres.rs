//! PostgreSQL-backed [`RecordStore`].
//!
//! Rows are exchanged as `jsonb`: selects return `to_jsonb(t)`, inserts and
//! updates go through `jsonb_populate_record`, so the typed columns in
//! `migrations/` stay the source of truth. Change events come from the
//! `gigsync_notify_change` trigger via `LISTEN`/`NOTIFY`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use sqlx::postgres::{PgListener, PgPool};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::store::{
    ChangeEvent, ChangeKind, ChangeScope, Filter, RecordStore, StoreError, Subscription, Table,
};

/// Channel name used by the change-notification trigger.
pub const CHANGE_CHANNEL: &str = "gigsync_changes";

/// Buffer capacity for the change feed.
const CHANGE_CHANNEL_CAPACITY: usize = 1024;

/// Delay before retrying after a listener error.
const LISTENER_RETRY_DELAY: Duration = Duration::from_secs(1);

pub struct PgStore {
    pool: PgPool,
    changes: broadcast::Sender<ChangeEvent>,
    cancel: CancellationToken,
}

/// Payload emitted by the notification trigger.
#[derive(Debug, Deserialize)]
struct ChangePayload {
    table: String,
    op: ChangeKind,
    row: Value,
}

impl PgStore {
    /// Wrap an existing pool and start forwarding `NOTIFY` events.
    pub async fn start(pool: PgPool) -> Result<Self, StoreError> {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let mut listener = PgListener::connect_with(&pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        tokio::spawn(forward_notifications(
            listener,
            changes.clone(),
            cancel.clone(),
        ));

        tracing::info!(channel = CHANGE_CHANNEL, "Postgres change listener started");

        Ok(Self {
            pool,
            changes,
            cancel,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Stop the notification listener.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for PgStore {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn forward_notifications(
    mut listener: PgListener,
    changes: broadcast::Sender<ChangeEvent>,
    cancel: CancellationToken,
) {
    loop {
        let notification = tokio::select! {
            _ = cancel.cancelled() => break,
            received = listener.recv() => received,
        };

        match notification {
            Ok(notification) => match decode_payload(notification.payload()) {
                Some(event) => {
                    let _ = changes.send(event);
                }
                None => {
                    tracing::warn!(payload = notification.payload(), "Ignoring malformed change payload");
                }
            },
            Err(e) => {
                tracing::error!(error = %e, "Postgres change listener error");
                tokio::time::sleep(LISTENER_RETRY_DELAY).await;
            }
        }
    }
    tracing::info!("Postgres change listener stopped");
}

fn decode_payload(payload: &str) -> Option<ChangeEvent> {
    let parsed: ChangePayload = serde_json::from_str(payload).ok()?;
    let table = Table::from_name(&parsed.table)?;
    Some(ChangeEvent::new(table, parsed.op, parsed.row))
}

// ---------------------------------------------------------------------------
// SQL building
// ---------------------------------------------------------------------------

/// Column names come from callers, so only plain lowercase identifiers are
/// spliced into SQL.
fn validate_identifier(name: &str) -> Result<&str, StoreError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(name)
    } else {
        Err(StoreError::InvalidQuery(format!("Invalid column name '{name}'")))
    }
}

/// Text form of a filter value, compared against `column::text`.
fn filter_text(value: &Value) -> Result<Option<String>, StoreError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Array(_) | Value::Object(_) => Err(StoreError::InvalidQuery(
            "Filter values must be scalars".to_string(),
        )),
    }
}

/// Build a `WHERE` clause for `filter`, numbering parameters from
/// `first_param`. Returns the clause and the values to bind, in order.
fn where_clause(filter: &Filter, first_param: usize) -> Result<(String, Vec<String>), StoreError> {
    if filter.is_empty() {
        return Ok((String::new(), Vec::new()));
    }

    let mut predicates = Vec::new();
    let mut binds = Vec::new();
    for (column, value) in filter.conditions() {
        let column = validate_identifier(column)?;
        match filter_text(value)? {
            None => predicates.push(format!("t.{column} IS NULL")),
            Some(text) => {
                binds.push(text);
                predicates.push(format!(
                    "t.{column}::text = ${}",
                    first_param + binds.len() - 1
                ));
            }
        }
    }
    Ok((format!(" WHERE {}", predicates.join(" AND ")), binds))
}

fn select_sql(table: Table, filter: &Filter) -> Result<(String, Vec<String>), StoreError> {
    let (clause, binds) = where_clause(filter, 1)?;
    Ok((
        format!(
            "SELECT to_jsonb(t) FROM {} AS t{clause} ORDER BY t.created_at",
            table.name()
        ),
        binds,
    ))
}

fn insert_sql(table: Table) -> String {
    let name = table.name();
    format!(
        "INSERT INTO {name} AS t \
         SELECT * FROM jsonb_populate_record(NULL::{name}, $1) \
         RETURNING to_jsonb(t)"
    )
}

fn update_sql(
    table: Table,
    filter: &Filter,
    patch: &serde_json::Map<String, Value>,
) -> Result<(String, Vec<String>), StoreError> {
    if patch.is_empty() {
        return Err(StoreError::InvalidQuery("Update patch is empty".to_string()));
    }
    let columns = patch
        .keys()
        .map(|c| validate_identifier(c))
        .collect::<Result<Vec<_>, _>>()?
        .join(", ");
    let (clause, binds) = where_clause(filter, 2)?;
    let name = table.name();
    Ok((
        format!(
            "UPDATE {name} AS t SET ({columns}) = \
             (SELECT {columns} FROM jsonb_populate_record(NULL::{name}, $1))\
             {clause} RETURNING to_jsonb(t)"
        ),
        binds,
    ))
}

fn delete_sql(table: Table, filter: &Filter) -> Result<(String, Vec<String>), StoreError> {
    let (clause, binds) = where_clause(filter, 1)?;
    Ok((format!("DELETE FROM {} AS t{clause}", table.name()), binds))
}

/// Map unique-constraint violations to [`StoreError::Conflict`].
fn classify(table: Table, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        // PostgreSQL unique constraint violation: error code 23505
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::Conflict {
                table: table.name(),
                key: db_err.constraint().unwrap_or("unknown").to_string(),
            };
        }
    }
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Database(other),
    }
}

// ---------------------------------------------------------------------------
// RecordStore
// ---------------------------------------------------------------------------

#[async_trait]
impl RecordStore for PgStore {
    async fn select(&self, table: Table, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let (sql, binds) = select_sql(table, filter)?;
        let mut query = sqlx::query_scalar::<_, Value>(&sql);
        for bind in binds {
            query = query.bind(bind);
        }
        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify(table, e))
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, StoreError> {
        if !row.is_object() {
            return Err(StoreError::InvalidQuery(
                "Inserted row must be a JSON object".to_string(),
            ));
        }
        sqlx::query_scalar::<_, Value>(&insert_sql(table))
            .bind(&row)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(table, e))
    }

    async fn update(
        &self,
        table: Table,
        filter: &Filter,
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let fields = patch.as_object().ok_or_else(|| {
            StoreError::InvalidQuery("Update patch must be a JSON object".to_string())
        })?;
        if let Some(column) = table.key_columns().iter().find(|c| fields.contains_key(**c)) {
            return Err(StoreError::InvalidQuery(format!(
                "Key column '{column}' cannot be updated"
            )));
        }

        let (sql, binds) = update_sql(table, filter, fields)?;
        let mut query = sqlx::query_scalar::<_, Value>(&sql).bind(&patch);
        for bind in binds {
            query = query.bind(bind);
        }
        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify(table, e))
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<u64, StoreError> {
        let (sql, binds) = delete_sql(table, filter)?;
        let mut query = sqlx::query(&sql);
        for bind in binds {
            query = query.bind(bind);
        }
        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| classify(table, e))?;
        Ok(result.rows_affected())
    }

    fn subscribe(&self, scope: ChangeScope) -> Subscription {
        Subscription::new(self.changes.subscribe(), scope)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
