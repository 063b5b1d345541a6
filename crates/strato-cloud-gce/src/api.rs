//! Compute Engine firewall API client
//!
//! Direct REST implementation over `compute/v1` with Bearer token
//! authentication.

use crate::error::{GceError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strato_cloud::{poll_until, CloudError, RetryConfig};

const COMPUTE_API_BASE: &str = "https://compute.googleapis.com/compute/v1";

/// Configuration for the Compute API client
#[derive(Debug, Clone)]
pub struct GceConfig {
    pub access_token: String,
    pub project: String,
}

impl GceConfig {
    /// Create GceConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let access_token = std::env::var("GCE_ACCESS_TOKEN")
            .map_err(|_| GceError::MissingEnvVar("GCE_ACCESS_TOKEN".to_string()))?;
        let project = std::env::var("GCE_PROJECT")
            .map_err(|_| GceError::MissingEnvVar("GCE_PROJECT".to_string()))?;

        Ok(Self {
            access_token,
            project,
        })
    }
}

/// Compute Engine API client
pub struct ComputeApi {
    client: reqwest::Client,
    access_token: String,
    project: String,
}

impl ComputeApi {
    pub fn new(config: GceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: config.access_token,
            project: config.project,
        }
    }

    /// The project this client operates on
    pub fn project(&self) -> &str {
        &self.project
    }

    fn firewalls_url(&self) -> String {
        format!(
            "{}/projects/{}/global/firewalls",
            COMPUTE_API_BASE, self.project
        )
    }

    /// List all firewall rules in the project, following pagination
    pub async fn list_firewalls(&self) -> Result<Vec<Firewall>> {
        let mut firewalls = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(self.firewalls_url())
                .bearer_auth(&self.access_token);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token)]);
            }

            tracing::debug!("Listing firewalls for project {}", self.project);
            let response = request.send().await?;
            let page: FirewallList = decode_response(response).await?;

            firewalls.extend(page.items);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(firewalls)
    }

    /// Get a firewall rule by name, None if it does not exist
    pub async fn get_firewall(&self, name: &str) -> Result<Option<Firewall>> {
        let url = format!("{}/{}", self.firewalls_url(), name);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        match decode_response(response).await {
            Ok(firewall) => Ok(Some(firewall)),
            Err(GceError::Api { code: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a firewall rule
    pub async fn insert_firewall(&self, firewall: &Firewall) -> Result<Operation> {
        tracing::info!("Creating firewall rule: {}", firewall.name);

        let response = self
            .client
            .post(self.firewalls_url())
            .bearer_auth(&self.access_token)
            .json(firewall)
            .send()
            .await?;

        decode_response(response).await
    }

    /// Update an existing firewall rule in place
    pub async fn patch_firewall(&self, name: &str, firewall: &Firewall) -> Result<Operation> {
        tracing::info!("Patching firewall rule: {}", name);
        let url = format!("{}/{}", self.firewalls_url(), name);

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.access_token)
            .json(firewall)
            .send()
            .await?;

        decode_response(response).await
    }

    /// Delete a firewall rule
    pub async fn delete_firewall(&self, name: &str) -> Result<Operation> {
        tracing::info!("Deleting firewall rule: {}", name);
        let url = format!("{}/{}", self.firewalls_url(), name);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        decode_response(response).await
    }

    /// Get a global operation by name
    pub async fn get_operation(&self, name: &str) -> Result<Operation> {
        let url = format!(
            "{}/projects/{}/global/operations/{}",
            COMPUTE_API_BASE, self.project, name
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        decode_response(response).await
    }

    /// Poll a global operation until the control plane reports it DONE
    pub async fn wait_for_operation(&self, name: &str, retry: &RetryConfig) -> Result<()> {
        poll_until(retry, &format!("operation {}", name), || async move {
            let op = self
                .get_operation(name)
                .await
                .map_err(|e| CloudError::ApiError(e.to_string()))?;
            Ok(op.is_done())
        })
        .await?;
        Ok(())
    }
}

/// Decode a Compute API response, mapping the error envelope
async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);

    Err(GceError::Api {
        code: status.as_u16(),
        message,
    })
}

// ============ Wire types ============

/// A firewall rule as the Compute API represents it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Firewall {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    /// "INGRESS" or "EGRESS"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,

    #[serde(
        rename = "sourceRanges",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub source_ranges: Vec<String>,

    #[serde(rename = "targetTags", default, skip_serializing_if = "Vec::is_empty")]
    pub target_tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<Allowed>,

    #[serde(rename = "creationTimestamp", skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

/// One allowed traffic entry of a firewall rule
///
/// `ports` is absent (not an empty list) when the protocol is not
/// port-restricted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allowed {
    #[serde(rename = "IPProtocol")]
    pub ip_protocol: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<String>>,
}

/// One page of a firewall list response
#[derive(Debug, Deserialize)]
struct FirewallList {
    #[serde(default)]
    items: Vec<Firewall>,

    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

/// A long-running Compute operation handle
#[derive(Debug, Clone, Deserialize)]
pub struct Operation {
    pub id: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
}

impl Operation {
    pub fn is_done(&self) -> bool {
        self.status.as_deref() == Some("DONE")
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: i32,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_firewall_list_parses() {
        let payload = r#"{
            "kind": "compute#firewallList",
            "items": [
                {
                    "id": "8495234868569821",
                    "creationTimestamp": "2025-11-04T08:12:33.001-08:00",
                    "name": "allow-ssh",
                    "network": "projects/acme/global/networks/default",
                    "direction": "INGRESS",
                    "priority": 1000,
                    "sourceRanges": ["0.0.0.0/0"],
                    "targetTags": ["bastion"],
                    "allowed": [
                        {"IPProtocol": "tcp", "ports": ["22"]},
                        {"IPProtocol": "icmp"}
                    ]
                }
            ],
            "nextPageToken": "CjYKLD"
        }"#;

        let list: FirewallList = serde_json::from_str(payload).unwrap();
        assert_eq!(list.next_page_token.as_deref(), Some("CjYKLD"));
        assert_eq!(list.items.len(), 1);

        let fw = &list.items[0];
        assert_eq!(fw.name, "allow-ssh");
        assert_eq!(fw.direction.as_deref(), Some("INGRESS"));
        assert_eq!(fw.priority, Some(1000));
        assert_eq!(fw.source_ranges, ["0.0.0.0/0"]);
        assert_eq!(fw.target_tags, ["bastion"]);
        assert_eq!(
            fw.allowed,
            vec![
                Allowed {
                    ip_protocol: "tcp".to_string(),
                    ports: Some(vec!["22".to_string()]),
                },
                Allowed {
                    ip_protocol: "icmp".to_string(),
                    ports: None,
                },
            ]
        );
    }

    #[test]
    fn test_empty_list_page_parses() {
        let list: FirewallList =
            serde_json::from_str(r#"{"kind": "compute#firewallList"}"#).unwrap();
        assert!(list.items.is_empty());
        assert!(list.next_page_token.is_none());
    }

    #[test]
    fn test_allowed_ports_omitted_when_absent() {
        let allowed = Allowed {
            ip_protocol: "icmp".to_string(),
            ports: None,
        };
        assert_eq!(
            serde_json::to_value(&allowed).unwrap(),
            serde_json::json!({"IPProtocol": "icmp"})
        );
    }

    #[test]
    fn test_error_envelope_parses() {
        let payload = r#"{
            "error": {
                "code": 404,
                "message": "The resource 'allow-ssh' was not found",
                "errors": [{"message": "not found", "domain": "global", "reason": "notFound"}]
            }
        }"#;

        let envelope: ErrorEnvelope = serde_json::from_str(payload).unwrap();
        assert_eq!(
            envelope.error.message,
            "The resource 'allow-ssh' was not found"
        );
    }

    #[test]
    fn test_operation_status() {
        let op: Operation =
            serde_json::from_str(r#"{"id": "42", "name": "operation-42", "status": "DONE"}"#)
                .unwrap();
        assert!(op.is_done());

        let op: Operation = serde_json::from_str(r#"{"status": "RUNNING"}"#).unwrap();
        assert!(!op.is_done());
    }
}
