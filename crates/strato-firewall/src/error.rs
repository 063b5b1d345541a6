//! Firewall model error types

use thiserror::Error;

/// Firewall model errors
#[derive(Error, Debug)]
pub enum FirewallError {
    #[error("Invalid port number: {0}")]
    InvalidPort(String),

    #[error("Invalid port range '{spec}': start {start} is greater than end {end}")]
    InvertedRange { spec: String, start: u16, end: u16 },

    #[error("Invalid port spec: {0}")]
    InvalidSpec(String),

    #[error("Unknown protocol: {0}")]
    UnknownProtocol(String),
}

pub type Result<T> = std::result::Result<T, FirewallError>;
