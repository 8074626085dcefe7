//! Amove stand-in: file transfer workspaces.

use std::sync::Arc;

use async_trait::async_trait;
use gigsync_core::platform::{
    PlatformCategory, PlatformError, PlatformMetadata, PlatformModule, PlatformSession,
};
use gigsync_core::types::ConfigBlob;

use crate::remote::MockRemote;
use crate::session::{self, Namespace};

pub const PLATFORM_ID: &str = "amove";

const NAMESPACE: Namespace = Namespace {
    platform: PLATFORM_ID,
    id_prefix: "amv",
    domain: "amove.io",
};

const REQUIRED: &[&str] = &["api_key", "workspace_id"];

pub struct AmoveModule {
    metadata: PlatformMetadata,
    remote: Arc<MockRemote>,
}

impl AmoveModule {
    pub fn new(remote: Arc<MockRemote>) -> Self {
        Self {
            metadata: PlatformMetadata {
                id: PLATFORM_ID.to_string(),
                display_name: "Amove".to_string(),
                category: PlatformCategory::FileTransfer,
                requires_auth: true,
                description: "Shared workspaces for large media deliveries".to_string(),
            },
            remote,
        }
    }
}

#[async_trait]
impl PlatformModule for AmoveModule {
    fn metadata(&self) -> &PlatformMetadata {
        &self.metadata
    }

    fn required_config_fields(&self) -> &[&'static str] {
        REQUIRED
    }

    async fn initialize(
        &self,
        config: &ConfigBlob,
    ) -> Result<Box<dyn PlatformSession>, PlatformError> {
        // Workspace ids are slugs.
        if let Some(workspace) = config.get("workspace_id").and_then(|v| v.as_str()) {
            if workspace.contains(char::is_whitespace) {
                return Err(PlatformError::InvalidConfig(format!(
                    "workspace_id '{workspace}' must not contain whitespace"
                )));
            }
        }
        session::open(NAMESPACE, &self.remote, REQUIRED, config)
    }
}
