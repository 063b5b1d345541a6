//! Cloud provider trait definition

use crate::action::{ApplyResult, Plan};
use crate::error::Result;
use crate::state::ProviderState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cloud provider abstraction trait
///
/// Every concrete binding (GCE, and whatever comes next) implements this
/// trait to expose a uniform control-plane surface.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Returns the provider identifier (e.g., "gce")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    /// Check if the provider is properly configured and authenticated
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Get the current state of all resources managed by this provider
    async fn get_state(&self) -> Result<ProviderState>;

    /// Calculate the diff between desired and current state
    async fn plan(&self, desired: &ResourceSet) -> Result<Plan>;

    /// Apply the planned actions
    async fn apply(&self, plan: &Plan) -> Result<ApplyResult>;

    /// Destroy a specific resource
    async fn destroy(&self, resource_id: &str) -> Result<()>;

    /// Destroy all resources managed by this provider
    async fn destroy_all(&self) -> Result<ApplyResult>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account/project information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}

/// Set of resources to be managed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceSet {
    /// Resources indexed by type and ID
    pub resources: HashMap<String, ResourceConfig>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, resource: ResourceConfig) {
        let key = format!("{}:{}", resource.resource_type, resource.id);
        self.resources.insert(key, resource);
    }

    pub fn get(&self, resource_type: &str, id: &str) -> Option<&ResourceConfig> {
        let key = format!("{}:{}", resource_type, id);
        self.resources.get(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceConfig> {
        self.resources.values()
    }

    pub fn by_type(&self, resource_type: &str) -> Vec<&ResourceConfig> {
        self.resources
            .values()
            .filter(|r| r.resource_type == resource_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Configuration for a cloud resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource type (e.g., "firewall", "instance")
    pub resource_type: String,

    /// Resource identifier
    pub id: String,

    /// Provider identifier
    pub provider: String,

    /// Resource-specific configuration
    pub config: serde_json::Value,
}

impl ResourceConfig {
    pub fn new(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        provider: impl Into<String>,
        config: serde_json::Value,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            provider: provider.into(),
            config,
        }
    }

    /// Get the full resource key (type:id)
    pub fn key(&self) -> String {
        format!("{}:{}", self.resource_type, self.id)
    }

    /// Get a configuration value as a specific type
    pub fn get_config<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.config
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Deserialize the whole configuration into a typed value
    pub fn parse_config<T: serde::de::DeserializeOwned>(&self) -> crate::error::Result<T> {
        serde_json::from_value(self.config.clone()).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_set_keys() {
        let mut set = ResourceSet::new();
        set.add(ResourceConfig::new(
            "firewall",
            "allow-ssh",
            "gce",
            serde_json::json!({"protocol": "tcp"}),
        ));

        assert_eq!(set.len(), 1);
        assert!(set.get("firewall", "allow-ssh").is_some());
        assert!(set.get("instance", "allow-ssh").is_none());
        assert_eq!(set.by_type("firewall").len(), 1);
    }

    #[test]
    fn test_typed_config_access() {
        let resource = ResourceConfig::new(
            "firewall",
            "allow-web",
            "gce",
            serde_json::json!({"priority": 900, "tags": ["web"]}),
        );

        assert_eq!(resource.get_config::<u32>("priority"), Some(900));
        assert_eq!(
            resource.get_config::<Vec<String>>("tags"),
            Some(vec!["web".to_string()])
        );
        assert_eq!(resource.get_config::<u32>("missing"), None);
        assert_eq!(resource.key(), "firewall:allow-web");
    }
}
