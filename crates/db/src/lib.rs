//! Persistence boundary for the provisioning workflow.
//!
//! The workflow only talks to a [`RecordStore`]: filtered select, insert,
//! update-by-filter, delete-by-filter and change subscriptions scoped by
//! table and an equality filter. Two backends implement it:
//!
//! - [`MemoryStore`]: in-process tables, used by tests and the default
//!   server configuration.
//! - [`PgStore`]: PostgreSQL via sqlx, with change notifications delivered
//!   through `LISTEN`/`NOTIFY` triggers (see `migrations/`).
//!
//! Typed access goes through the [`repositories`].

pub mod memory;
pub mod models;
pub mod postgres;
pub mod repositories;
pub mod store;

use sqlx::postgres::PgPoolOptions;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{
    ChangeEvent, ChangeKind, ChangeScope, Filter, Notification, RecordStore, StoreError,
    Subscription, Table,
};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Run a trivial query to verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
