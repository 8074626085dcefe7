//! Connection testing for platform configurations.
//!
//! A test runs shape validation, `initialize` and `test_connection` in that
//! order and stops at the first failure. It never writes to the store, so a
//! draft configuration can be checked before it is saved.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use gigsync_core::config_shape;
use gigsync_core::platform::{PlatformError, PlatformModule, ProvisionError};
use gigsync_core::registry::PlatformRegistry;
use gigsync_core::types::{ConfigBlob, OrgId};

use crate::config_store::ConfigurationStore;
use crate::error::WorkflowResult;

/// Run one remote call with a time limit; running out reports
/// [`PlatformError::Timeout`].
pub(crate) async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, PlatformError>>,
) -> Result<T, PlatformError> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(PlatformError::Timeout))
}

/// Offline checks a configuration must pass before any remote call.
pub(crate) fn preflight(module: &dyn PlatformModule, config: &ConfigBlob) -> Result<(), ProvisionError> {
    if config_shape::is_blank(config) {
        return Err(ProvisionError::NotConfigured);
    }
    if !module.validate_config(config) {
        let mut missing =
            config_shape::missing_required_fields(config, module.required_config_fields());
        if missing.is_empty() {
            missing = module
                .required_config_fields()
                .iter()
                .map(|field| field.to_string())
                .collect();
        }
        return Err(ProvisionError::InvalidConfig(missing));
    }
    Ok(())
}

pub struct ConnectionTester {
    registry: Arc<PlatformRegistry>,
    configs: Arc<ConfigurationStore>,
    timeout: Duration,
}

impl ConnectionTester {
    pub fn new(
        registry: Arc<PlatformRegistry>,
        configs: Arc<ConfigurationStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            configs,
            timeout,
        }
    }

    /// Test `config` against `module`.
    pub async fn test(
        &self,
        module: &dyn PlatformModule,
        config: &ConfigBlob,
    ) -> Result<(), ProvisionError> {
        preflight(module, config)?;
        let session = bounded(self.timeout, module.initialize(config)).await?;
        bounded(self.timeout, session.test_connection()).await?;
        tracing::debug!(platform_id = module.id(), "Connection test passed");
        Ok(())
    }

    /// Test an unsaved configuration for a registered platform.
    pub async fn test_draft(
        &self,
        platform_id: &str,
        config: &ConfigBlob,
    ) -> Result<(), ProvisionError> {
        let module = self
            .registry
            .get(platform_id)
            .ok_or(ProvisionError::ModuleNotFound)?;
        self.test(module.as_ref(), config).await
    }

    /// Test the configuration currently saved for `(organization, platform)`.
    ///
    /// Disabled configurations are tested too. The outer error is a store
    /// failure; the inner result is the test outcome.
    pub async fn test_stored(
        &self,
        organization_id: OrgId,
        platform_id: &str,
    ) -> WorkflowResult<Result<(), ProvisionError>> {
        let Some(module) = self.registry.get(platform_id) else {
            return Ok(Err(ProvisionError::ModuleNotFound));
        };
        let Some(configuration) = self.configs.get(organization_id, platform_id).await? else {
            return Ok(Err(ProvisionError::NotConfigured));
        };
        Ok(self.test(module.as_ref(), &configuration.config).await)
    }
}
