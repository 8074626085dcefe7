/// Freelancer (entity) identifier.
pub type EntityId = uuid::Uuid;

/// Organization identifier. Configurations and freelancers are scoped to one.
pub type OrgId = uuid::Uuid;

/// Stable platform identifier, e.g. `"amove"` or `"fiverr"`.
pub type PlatformId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Opaque per-platform credential / endpoint map.
pub type ConfigBlob = serde_json::Map<String, serde_json::Value>;
