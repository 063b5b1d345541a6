//! Google Compute Engine provider for strato
//!
//! This crate implements the CloudProvider trait for GCE firewall rules,
//! talking directly to the Compute REST API with a bearer token.
//!
//! # Requirements
//!
//! - `GCE_ACCESS_TOKEN` and `GCE_PROJECT` environment variables
//!
//! # Example
//!
//! ```ignore
//! use strato_cloud::CloudProvider;
//! use strato_cloud_gce::{GceConfig, GceProvider};
//!
//! let provider = GceProvider::new(GceConfig::from_env()?);
//!
//! let auth = provider.check_auth().await?;
//! if !auth.authenticated {
//!     panic!("Not authenticated: {:?}", auth.error);
//! }
//!
//! let state = provider.get_state().await?;
//! ```

pub mod api;
pub mod error;
pub mod firewall;
pub mod provider;

// Re-exports
pub use api::{ComputeApi, Firewall, GceConfig};
pub use error::{GceError, Result};
pub use firewall::{rule_from_wire, rule_to_wire};
pub use provider::GceProvider;
