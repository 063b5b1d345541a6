//! Conversion between the provider-neutral rule model and the GCE wire
//! shape

use crate::api::{Allowed, Firewall};
use crate::error::{GceError, Result};
use strato_firewall::{compact_ports, expand_ports, Direction, FirewallRule, Protocol};

/// Render a domain rule as the Compute API firewall shape
///
/// Port tokens pass through as-is (they are already compacted by the
/// domain model); the `ports` field is omitted for unrestricted rules and
/// for protocols that carry no ports.
pub fn rule_to_wire(rule: &FirewallRule, network: Option<&str>) -> Firewall {
    let ports = if rule.protocol.has_ports() {
        rule.ports.clone()
    } else {
        None
    };

    Firewall {
        name: rule.name.clone(),
        id: None,
        description: None,
        network: network.map(|n| n.to_string()),
        direction: Some(wire_direction(rule.direction).to_string()),
        priority: rule.priority,
        source_ranges: rule.source_ranges.clone(),
        target_tags: rule.target_tags.clone(),
        allowed: vec![Allowed {
            ip_protocol: rule.protocol.as_str().to_string(),
            ports,
        }],
        creation_timestamp: None,
        disabled: None,
    }
}

/// Read a Compute API firewall back into the domain model
///
/// Port tokens are normalized (expanded and re-compacted) so that rules
/// describing the same port set compare equal regardless of how the
/// control plane spelled them.
///
/// The domain rule models exactly one allowed entry. A wire rule with
/// several entries must not read back as a truncated single-protocol
/// rule (plan diffs would then miss the dropped entries), so it is
/// rejected as unmodellable.
pub fn rule_from_wire(firewall: &Firewall) -> Result<FirewallRule> {
    let allowed = match firewall.allowed.as_slice() {
        [allowed] => allowed,
        [] => {
            return Err(GceError::InvalidConfig(format!(
                "Firewall {} has no allowed entries",
                firewall.name
            )));
        }
        entries => {
            return Err(GceError::InvalidConfig(format!(
                "Firewall {} has {} allowed entries",
                firewall.name,
                entries.len()
            )));
        }
    };

    let protocol = Protocol::parse(&allowed.ip_protocol)?;
    let direction = parse_direction(firewall.direction.as_deref())?;

    let mut rule = FirewallRule::new(firewall.name.clone(), direction, protocol);
    rule.ports = normalize_ports(allowed.ports.as_deref())?;
    rule.source_ranges = firewall.source_ranges.clone();
    rule.target_tags = firewall.target_tags.clone();
    rule.priority = firewall.priority;
    Ok(rule)
}

/// Re-compact a token list into canonical form; absent stays absent
pub fn normalize_ports(tokens: Option<&[String]>) -> Result<Option<Vec<String>>> {
    match tokens {
        None => Ok(None),
        Some(tokens) => {
            let ports = expand_ports(tokens)?;
            Ok(compact_ports(ports))
        }
    }
}

fn wire_direction(direction: Direction) -> &'static str {
    match direction {
        Direction::Ingress => "INGRESS",
        Direction::Egress => "EGRESS",
    }
}

fn parse_direction(s: Option<&str>) -> Result<Direction> {
    match s {
        // the API defaults omitted direction to ingress
        None | Some("INGRESS") => Ok(Direction::Ingress),
        Some("EGRESS") => Ok(Direction::Egress),
        Some(other) => Err(GceError::InvalidConfig(format!(
            "Unknown firewall direction: {}",
            other
        ))),
    }
}
