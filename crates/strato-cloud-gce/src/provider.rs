//! GCE provider implementation

use crate::api::{ComputeApi, Firewall, GceConfig};
use crate::error::Result;
use crate::firewall::{normalize_ports, rule_from_wire, rule_to_wire};
use async_trait::async_trait;
use std::collections::HashMap;
use strato_cloud::{
    Action, ActionType, ApplyResult, AuthStatus, CloudError, CloudProvider, Plan, ProviderState,
    ResourceConfig, ResourceSet, ResourceState, ResourceStatus, RetryConfig,
};
use strato_firewall::FirewallRule;

const RESOURCE_TYPE_FIREWALL: &str = "firewall";

/// Google Compute Engine provider
pub struct GceProvider {
    api: ComputeApi,
    network: Option<String>,
    retry: RetryConfig,
}

impl GceProvider {
    pub fn new(config: GceConfig) -> Self {
        Self {
            api: ComputeApi::new(config),
            network: None,
            retry: RetryConfig::default(),
        }
    }

    /// Scope created firewalls to a specific network
    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    /// Override the operation polling configuration
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Block until `operation` completes, if it has a pollable name
    async fn await_operation(&self, operation: &crate::api::Operation) -> Result<()> {
        if let Some(ref name) = operation.name {
            if !operation.is_done() {
                self.api.wait_for_operation(name, &self.retry).await?;
            }
        }
        Ok(())
    }

    /// Parse a desired firewall out of a ResourceConfig, with port tokens
    /// normalized for comparison against live rules
    fn desired_rule(&self, resource: &ResourceConfig) -> Result<FirewallRule> {
        let mut rule: FirewallRule = resource.parse_config()?;
        if rule.name.is_empty() {
            rule.name = resource.id.clone();
        }
        rule.ports = normalize_ports(rule.ports.as_deref())?;
        Ok(rule)
    }

    /// Fetch live firewalls keyed by name, as domain rules
    async fn live_rules(&self) -> Result<HashMap<String, FirewallRule>> {
        let firewalls = self.api.list_firewalls().await?;
        let mut rules = HashMap::new();
        for firewall in &firewalls {
            match rule_from_wire(firewall) {
                Ok(rule) => {
                    rules.insert(rule.name.clone(), rule);
                }
                Err(e) => {
                    // deny-only or otherwise unmodellable rules are left alone
                    tracing::warn!("Skipping firewall {}: {}", firewall.name, e);
                }
            }
        }
        Ok(rules)
    }

    fn wire_rule(&self, rule: &FirewallRule) -> Firewall {
        rule_to_wire(rule, self.network.as_deref())
    }
}

fn api_error(e: crate::error::GceError) -> CloudError {
    CloudError::ApiError(e.to_string())
}

#[async_trait]
impl CloudProvider for GceProvider {
    fn name(&self) -> &str {
        "gce"
    }

    fn display_name(&self) -> &str {
        "Google Compute Engine"
    }

    async fn check_auth(&self) -> strato_cloud::Result<AuthStatus> {
        match self.api.list_firewalls().await {
            Ok(_) => Ok(AuthStatus::ok(self.api.project())),
            Err(e) if e.is_auth_error() => Ok(AuthStatus::failed(e.to_string())),
            Err(e) => Err(api_error(e)),
        }
    }

    async fn get_state(&self) -> strato_cloud::Result<ProviderState> {
        let mut state = ProviderState::new();

        let firewalls = self.api.list_firewalls().await.map_err(api_error)?;

        for firewall in firewalls {
            let id = firewall.id.clone().unwrap_or_else(|| firewall.name.clone());
            let mut resource =
                ResourceState::new(id, RESOURCE_TYPE_FIREWALL).with_status(ResourceStatus::Active);

            if let Some(allowed) = firewall.allowed.first() {
                resource.set_attribute("protocol", serde_json::json!(allowed.ip_protocol));
                if let Some(ref ports) = allowed.ports {
                    resource.set_attribute("ports", serde_json::json!(ports));
                }
            }
            if let Some(ref direction) = firewall.direction {
                resource.set_attribute("direction", serde_json::json!(direction));
            }
            if let Some(priority) = firewall.priority {
                resource.set_attribute("priority", serde_json::json!(priority));
            }

            state.add(firewall.name.clone(), resource);
        }

        Ok(state)
    }

    async fn plan(&self, desired: &ResourceSet) -> strato_cloud::Result<Plan> {
        let live = self.live_rules().await.map_err(api_error)?;
        let mut actions = Vec::new();

        for resource in desired.by_type(RESOURCE_TYPE_FIREWALL) {
            let rule = self
                .desired_rule(resource)
                .map_err(|e| CloudError::InvalidConfig(e.to_string()))?;

            let action = match live.get(&rule.name) {
                None => Action::new(
                    ActionType::Create,
                    RESOURCE_TYPE_FIREWALL,
                    rule.name.clone(),
                    format!("Create firewall rule {}", rule.name),
                )
                .with_detail("rule", serde_json::to_value(&rule)?),
                Some(existing) if existing != &rule => Action::new(
                    ActionType::Update,
                    RESOURCE_TYPE_FIREWALL,
                    rule.name.clone(),
                    format!("Update firewall rule {}", rule.name),
                )
                .with_detail("rule", serde_json::to_value(&rule)?),
                Some(_) => Action::new(
                    ActionType::NoOp,
                    RESOURCE_TYPE_FIREWALL,
                    rule.name.clone(),
                    format!("Firewall rule {} is up to date", rule.name),
                ),
            };
            actions.push(action);
        }

        for name in live.keys() {
            if desired.get(RESOURCE_TYPE_FIREWALL, name).is_none() {
                // untracked rules are reported, never auto-deleted
                tracing::debug!(
                    "Firewall {} exists but is not in desired state (will not auto-delete)",
                    name
                );
            }
        }

        Ok(Plan::new(actions))
    }

    async fn apply(&self, plan: &Plan) -> strato_cloud::Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        for action in &plan.actions {
            match action.action_type {
                ActionType::Create | ActionType::Update => {
                    let rule: FirewallRule = match action.details.get("rule") {
                        Some(value) => serde_json::from_value(value.clone())?,
                        None => {
                            result.add_failure(
                                action.id.clone(),
                                format!("Action {} carries no rule payload", action.id),
                            );
                            continue;
                        }
                    };
                    let wire = self.wire_rule(&rule);

                    let outcome = if action.action_type == ActionType::Create {
                        self.api.insert_firewall(&wire).await
                    } else {
                        self.api.patch_firewall(&rule.name, &wire).await
                    };

                    match outcome {
                        Ok(op) => match self.await_operation(&op).await {
                            Ok(()) => result.add_success(
                                action.id.clone(),
                                format!("Firewall rule {} {}d", rule.name, action.action_type),
                            ),
                            Err(e) => result.add_failure(action.id.clone(), e.to_string()),
                        },
                        Err(e) => result.add_failure(action.id.clone(), e.to_string()),
                    }
                }
                ActionType::Delete => {
                    match self.api.delete_firewall(&action.resource_id).await {
                        Ok(op) => match self.await_operation(&op).await {
                            Ok(()) => result.add_success(
                                action.id.clone(),
                                format!("Firewall rule {} deleted", action.resource_id),
                            ),
                            Err(e) => result.add_failure(action.id.clone(), e.to_string()),
                        },
                        Err(e) => result.add_failure(action.id.clone(), e.to_string()),
                    }
                }
                ActionType::NoOp => {
                    // Nothing to do
                }
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    async fn destroy(&self, resource_id: &str) -> strato_cloud::Result<()> {
        let existing = self
            .api
            .get_firewall(resource_id)
            .await
            .map_err(api_error)?;

        if existing.is_none() {
            return Err(CloudError::ResourceNotFound(resource_id.to_string()));
        }

        let op = self
            .api
            .delete_firewall(resource_id)
            .await
            .map_err(api_error)?;
        self.await_operation(&op).await.map_err(api_error)?;
        Ok(())
    }

    async fn destroy_all(&self) -> strato_cloud::Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        let firewalls = self.api.list_firewalls().await.map_err(api_error)?;

        for firewall in firewalls {
            match self.api.delete_firewall(&firewall.name).await {
                Ok(_) => result.add_success(
                    format!("delete-{}", firewall.name),
                    format!("Firewall rule {} deleted", firewall.name),
                ),
                Err(e) => result.add_failure(format!("delete-{}", firewall.name), e.to_string()),
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strato_firewall::Protocol;

    fn provider() -> GceProvider {
        GceProvider::new(GceConfig {
            access_token: "test-token".to_string(),
            project: "acme".to_string(),
        })
        .with_network("global/networks/default")
    }

    #[test]
    fn test_desired_rule_takes_name_from_resource_id() {
        let resource = ResourceConfig::new(
            RESOURCE_TYPE_FIREWALL,
            "allow-ssh",
            "gce",
            serde_json::json!({
                "name": "",
                "protocol": "tcp",
                "ports": ["22"]
            }),
        );

        let rule = provider().desired_rule(&resource).unwrap();
        assert_eq!(rule.name, "allow-ssh");
        assert_eq!(rule.protocol, Protocol::Tcp);
        assert_eq!(rule.ports, Some(vec!["22".to_string()]));
    }

    #[test]
    fn test_desired_rule_normalizes_port_tokens() {
        let resource = ResourceConfig::new(
            RESOURCE_TYPE_FIREWALL,
            "allow-db",
            "gce",
            serde_json::json!({
                "name": "allow-db",
                "protocol": "tcp",
                "ports": ["5432", "5433", "5434"]
            }),
        );

        let rule = provider().desired_rule(&resource).unwrap();
        assert_eq!(rule.ports, Some(vec!["5432-5434".to_string()]));
    }

    #[test]
    fn test_wire_rule_carries_configured_network() {
        let rule = FirewallRule::allow("allow-ssh", Protocol::Tcp, [22]);
        let wire = provider().wire_rule(&rule);
        assert_eq!(wire.network.as_deref(), Some("global/networks/default"));
    }

    #[tokio::test]
    async fn test_apply_rejects_action_without_rule_payload() {
        let plan = Plan::new(vec![Action::new(
            ActionType::Create,
            RESOURCE_TYPE_FIREWALL,
            "allow-ssh",
            "Create firewall rule allow-ssh",
        )]);

        let result = provider().apply(&plan).await.unwrap();
        assert!(!result.is_success());
        assert_eq!(result.failed.len(), 1);
    }

    #[tokio::test]
    async fn test_apply_noop_plan_touches_nothing() {
        let plan = Plan::new(vec![Action::new(
            ActionType::NoOp,
            RESOURCE_TYPE_FIREWALL,
            "allow-ssh",
            "Firewall rule allow-ssh is up to date",
        )]);

        let result = provider().apply(&plan).await.unwrap();
        assert!(result.is_success());
        assert!(result.succeeded.is_empty());
        assert!(result.failed.is_empty());
    }
}
