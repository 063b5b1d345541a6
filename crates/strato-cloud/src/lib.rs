//! strato Cloud Provider Abstraction
//!
//! This crate provides the provider-neutral core of the strato SDK:
//! a trait every cloud binding implements, a registry to look bindings up
//! by provider identifier, and the plan/apply types shared across them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 SDK consumer                     │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                strato-cloud                      │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │          Provider Abstraction             │   │
//! │  │  trait CloudProvider { ... }              │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │   Registry   │  │  Plan/Apply  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │  gce provider │  (strato-cloud-gce, others pluggable)
//! └───────────────┘
//! ```

pub mod action;
pub mod error;
pub mod provider;
pub mod registry;
pub mod retry;
pub mod state;

// Re-exports
pub use action::{Action, ActionType, ApplyResult, Plan, PlanSummary};
pub use error::{CloudError, Result};
pub use provider::{AuthStatus, CloudProvider, ResourceConfig, ResourceSet};
pub use registry::ProviderRegistry;
pub use retry::{poll_until, RetryConfig};
pub use state::{ProviderState, ResourceState, ResourceStatus};
