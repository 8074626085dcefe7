//! Upwork stand-in: marketplace accounts scoped to an agency organization.

use std::sync::Arc;

use async_trait::async_trait;
use gigsync_core::platform::{
    PlatformCategory, PlatformError, PlatformMetadata, PlatformModule, PlatformSession,
};
use gigsync_core::types::ConfigBlob;

use crate::remote::MockRemote;
use crate::session::{self, Namespace};

pub const PLATFORM_ID: &str = "upwork";

const NAMESPACE: Namespace = Namespace {
    platform: PLATFORM_ID,
    id_prefix: "upw",
    domain: "upwork.com",
};

const REQUIRED: &[&str] = &["client_id", "client_secret", "organization_ref"];

pub struct UpworkModule {
    metadata: PlatformMetadata,
    remote: Arc<MockRemote>,
}

impl UpworkModule {
    pub fn new(remote: Arc<MockRemote>) -> Self {
        Self {
            metadata: PlatformMetadata {
                id: PLATFORM_ID.to_string(),
                display_name: "Upwork".to_string(),
                category: PlatformCategory::Marketplace,
                requires_auth: true,
                description: "Agency-managed freelancer profiles".to_string(),
            },
            remote,
        }
    }
}

#[async_trait]
impl PlatformModule for UpworkModule {
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
        // Agency references look like "org_<digits>".
        if let Some(reference) = config.get("organization_ref").and_then(|v| v.as_str()) {
            let valid = reference
                .strip_prefix("org_")
                .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()));
            if !valid {
                return Err(PlatformError::InvalidConfig(format!(
                    "organization_ref '{reference}' is not of the form org_<digits>"
                )));
            }
        }
        session::open(NAMESPACE, &self.remote, REQUIRED, config)
    }
}
