//! GCE provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GceError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("GCE API error {code}: {message}")]
    Api { code: u16, message: String },

    #[error("Firewall not found: {0}")]
    FirewallNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Firewall model error: {0}")]
    Firewall(#[from] strato_firewall::FirewallError),

    #[error("Cloud error: {0}")]
    Cloud(#[from] strato_cloud::CloudError),
}

impl GceError {
    /// Whether this is an authentication/authorization failure
    pub fn is_auth_error(&self) -> bool {
        matches!(self, GceError::Api { code: 401 | 403, .. })
    }
}

pub type Result<T> = std::result::Result<T, GceError>;
