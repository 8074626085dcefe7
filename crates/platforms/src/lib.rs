//! Stand-in platform modules.
//!
//! `amove`, `fiverr` and `upwork` implement the full
//! [`PlatformModule`](gigsync_core::platform::PlatformModule) contract over a
//! [`MockRemote`] directory instead of real HTTP APIs. They check
//! configuration the way the real integrations would and can be steered into
//! failure paths with the `mock_*` config keys described in [`session`].

pub mod amove;
pub mod fiverr;
pub mod remote;
pub mod session;
pub mod upwork;

use std::sync::Arc;

use gigsync_core::error::CoreError;
use gigsync_core::registry::PlatformRegistry;

pub use amove::AmoveModule;
pub use fiverr::FiverrModule;
pub use remote::MockRemote;
pub use upwork::UpworkModule;

/// Registry with every built-in module, all backed by `remote`.
pub fn default_registry(remote: Arc<MockRemote>) -> Result<PlatformRegistry, CoreError> {
    PlatformRegistry::new()
        .with(Arc::new(AmoveModule::new(Arc::clone(&remote))))?
        .with(Arc::new(FiverrModule::new(Arc::clone(&remote))))?
        .with(Arc::new(UpworkModule::new(remote)))
}
