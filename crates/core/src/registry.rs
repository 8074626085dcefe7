//! Registry of known platform modules.
//!
//! Built once at startup, then shared as `Arc<PlatformRegistry>`. There is no
//! interior mutability: registration needs `&mut self`, so once the registry
//! is behind an `Arc` it is read-only and safe for any number of readers.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::CoreError;
use crate::platform::{PlatformMetadata, PlatformModule};

#[derive(Default)]
pub struct PlatformRegistry {
    modules: HashMap<String, Arc<dyn PlatformModule>>,
    /// Registration order, for stable listings.
    order: Vec<String>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module. Two modules with the same id is a build error, not a
    /// silent override.
    pub fn register(&mut self, module: Arc<dyn PlatformModule>) -> Result<(), CoreError> {
        let id = module.id().to_string();
        if self.modules.contains_key(&id) {
            return Err(CoreError::Conflict(format!(
                "Platform module '{id}' is already registered"
            )));
        }
        self.order.push(id.clone());
        self.modules.insert(id, module);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, module: Arc<dyn PlatformModule>) -> Result<Self, CoreError> {
        self.register(module)?;
        Ok(self)
    }

    /// Look up a module. Unknown ids are a normal outcome, e.g. a platform
    /// removed from the build that configuration still references.
    pub fn get(&self, id: &str) -> Option<Arc<dyn PlatformModule>> {
        self.modules.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    /// All modules in registration order.
    pub fn all(&self) -> Vec<Arc<dyn PlatformModule>> {
        self.order
            .iter()
            .filter_map(|id| self.modules.get(id).cloned())
            .collect()
    }

    pub fn metadata(&self) -> Vec<PlatformMetadata> {
        self.all().iter().map(|m| m.metadata().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
