//! Typed repositories over a [`RecordStore`].
//!
//! Each repository is a unit struct whose methods take the store as their
//! first argument, so callers decide which backend (and which `Arc`) to use.

mod association_repo;
mod freelancer_repo;
mod platform_config_repo;

pub use association_repo::AssociationRepo;
pub use freelancer_repo::FreelancerRepo;
pub use platform_config_repo::PlatformConfigRepo;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::store::{StoreError, Table};

pub(crate) fn encode<T: Serialize>(table: Table, value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|source| StoreError::Encode {
        table: table.name(),
        source,
    })
}

pub(crate) fn decode<T: DeserializeOwned>(table: Table, row: Value) -> Result<T, StoreError> {
    serde_json::from_value(row).map_err(|source| StoreError::Decode {
        table: table.name(),
        source,
    })
}

pub(crate) fn decode_all<T: DeserializeOwned>(
    table: Table,
    rows: Vec<Value>,
) -> Result<Vec<T>, StoreError> {
    rows.into_iter().map(|row| decode(table, row)).collect()
}
