//! Live resource state snapshots
//!
//! Providers report their current view of the world as a `ProviderState`
//! snapshot. Nothing here is persisted: the control plane is the source
//! of truth and each snapshot is fetched fresh.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// State for a single provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderState {
    /// Resources managed by this provider
    pub resources: HashMap<String, ResourceState>,
}

impl ProviderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: String, state: ResourceState) {
        self.resources.insert(id, state);
    }

    pub fn get(&self, id: &str) -> Option<&ResourceState> {
        self.resources.get(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<ResourceState> {
        self.resources.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResourceState)> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// State of a single resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    /// Provider-specific resource ID
    pub id: String,

    /// Resource type
    pub resource_type: String,

    /// Current status
    pub status: ResourceStatus,

    /// Resource attributes (IP, URL, etc.)
    pub attributes: HashMap<String, serde_json::Value>,

    /// When the snapshot entry was created
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ResourceState {
    pub fn new(id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            status: ResourceStatus::Unknown,
            attributes: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.attributes.insert(key.into(), value);
        self.updated_at = Utc::now();
    }

    pub fn get_attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Status of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Resource is being created
    Creating,
    /// Resource is running/active
    Active,
    /// Resource is stopped
    Stopped,
    /// Resource is being deleted
    Deleting,
    /// Resource has been deleted
    Deleted,
    /// Resource is in error state
    Error,
    /// Status is unknown
    Unknown,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Creating => write!(f, "creating"),
            ResourceStatus::Active => write!(f, "active"),
            ResourceStatus::Stopped => write!(f, "stopped"),
            ResourceStatus::Deleting => write!(f, "deleting"),
            ResourceStatus::Deleted => write!(f, "deleted"),
            ResourceStatus::Error => write!(f, "error"),
            ResourceStatus::Unknown => write!(f, "unknown"),
        }
    }
}
