//! Fiverr stand-in: gig marketplace with OAuth client credentials.

use std::sync::Arc;

use async_trait::async_trait;
use gigsync_core::platform::{
    PlatformCategory, PlatformError, PlatformMetadata, PlatformModule, PlatformSession,
};
use gigsync_core::types::ConfigBlob;

use crate::remote::MockRemote;
use crate::session::{self, Namespace};

pub const PLATFORM_ID: &str = "fiverr";

const NAMESPACE: Namespace = Namespace {
    platform: PLATFORM_ID,
    id_prefix: "fvr",
    domain: "fiverr.com",
};

const REQUIRED: &[&str] = &["client_id", "client_secret"];

const MIN_SECRET_LEN: usize = 8;

pub struct FiverrModule {
    metadata: PlatformMetadata,
    remote: Arc<MockRemote>,
}

impl FiverrModule {
    pub fn new(remote: Arc<MockRemote>) -> Self {
        Self {
            metadata: PlatformMetadata {
                id: PLATFORM_ID.to_string(),
                display_name: "Fiverr".to_string(),
                category: PlatformCategory::Marketplace,
                requires_auth: true,
                description: "Freelance services marketplace".to_string(),
            },
            remote,
        }
    }
}

#[async_trait]
impl PlatformModule for FiverrModule {
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
        let secret_len = config
            .get("client_secret")
            .and_then(|v| v.as_str())
            .map_or(0, str::len);
        if secret_len > 0 && secret_len < MIN_SECRET_LEN {
            return Err(PlatformError::Unauthorized(
                "client_secret is too short".to_string(),
            ));
        }
        session::open(NAMESPACE, &self.remote, REQUIRED, config)
    }
}
