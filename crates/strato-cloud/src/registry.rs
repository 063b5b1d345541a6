//! Provider registry
//!
//! Concrete bindings register under their provider identifier; SDK
//! consumers look them up by name and talk through the trait object.

use crate::error::{CloudError, Result};
use crate::provider::CloudProvider;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of cloud providers keyed by provider identifier
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn CloudProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own `name()`
    pub fn register(&mut self, provider: Arc<dyn CloudProvider>) {
        let name = provider.name().to_string();
        if self.providers.insert(name.clone(), provider).is_some() {
            tracing::warn!("Replacing already-registered provider: {}", name);
        }
    }

    /// Look up a provider by identifier
    pub fn get(&self, name: &str) -> Result<Arc<dyn CloudProvider>> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| CloudError::ProviderNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Registered provider identifiers, sorted for stable output
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<dyn CloudProvider>)> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}
