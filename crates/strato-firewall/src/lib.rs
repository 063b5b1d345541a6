//! Firewall rule domain model for strato
//!
//! This crate provides the provider-neutral firewall rule type and the
//! port-range compaction used when serializing rules into provider wire
//! formats that accept compact range strings ("22", "1000-1002") rather
//! than enumerated ports.

pub mod error;
pub mod ports;
pub mod rule;

// Re-exports
pub use error::{FirewallError, Result};
pub use ports::{compact_ports, expand_ports, parse_port_spec, PortSpec};
pub use rule::{Direction, FirewallRule, Protocol};
