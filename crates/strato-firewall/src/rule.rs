//! Provider-neutral firewall rule model

use crate::error::{FirewallError, Result};
use crate::ports::compact_ports;
use serde::{Deserialize, Serialize};

/// Protocol matched by a firewall rule
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
    Icmp,
    All,
}

impl Protocol {
    /// Parse a protocol name as providers spell it
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            "icmp" => Ok(Protocol::Icmp),
            "all" => Ok(Protocol::All),
            other => Err(FirewallError::UnknownProtocol(other.to_string())),
        }
    }

    /// Wire spelling of the protocol
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Icmp => "icmp",
            Self::All => "all",
        }
    }

    /// Whether the protocol carries port numbers at all
    pub fn has_ports(&self) -> bool {
        matches!(self, Self::Tcp | Self::Udp)
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Traffic direction a rule applies to
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ingress,
    Egress,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingress => "ingress",
            Self::Egress => "egress",
        }
    }
}

/// A firewall rule, independent of any provider wire format
///
/// `ports: None` means the rule is not port-restricted. Provider
/// serializers omit the field entirely in that case rather than sending
/// an empty list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FirewallRule {
    /// Rule name, unique within its provider scope
    pub name: String,

    /// Traffic direction
    #[serde(default)]
    pub direction: Direction,

    /// Matched protocol
    #[serde(default)]
    pub protocol: Protocol,

    /// Compact port range tokens ("22", "1000-1002"), absent when the
    /// rule matches all ports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<String>>,

    /// CIDR source ranges the rule applies to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_ranges: Vec<String>,

    /// Instance tags the rule targets
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_tags: Vec<String>,

    /// Rule priority, lower wins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

impl FirewallRule {
    /// Create a rule with no port restriction
    pub fn new(name: impl Into<String>, direction: Direction, protocol: Protocol) -> Self {
        Self {
            name: name.into(),
            direction,
            protocol,
            ports: None,
            source_ranges: Vec::new(),
            target_tags: Vec::new(),
            priority: None,
        }
    }

    /// Create an ingress allow rule restricted to the given ports
    ///
    /// The port collection is compacted into range tokens; an empty
    /// collection leaves the rule unrestricted.
    pub fn allow(
        name: impl Into<String>,
        protocol: Protocol,
        ports: impl IntoIterator<Item = u16>,
    ) -> Self {
        Self {
            ports: compact_ports(ports),
            ..Self::new(name, Direction::Ingress, protocol)
        }
    }

    pub fn with_ports(mut self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.ports = compact_ports(ports);
        self
    }

    pub fn with_source_range(mut self, cidr: impl Into<String>) -> Self {
        self.source_ranges.push(cidr.into());
        self
    }

    pub fn with_target_tag(mut self, tag: impl Into<String>) -> Self {
        self.target_tags.push(tag.into());
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Whether the rule restricts traffic to specific ports
    pub fn is_port_restricted(&self) -> bool {
        self.ports.is_some()
    }
}
