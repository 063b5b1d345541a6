//! Port-range compaction
//!
//! Several provider wire formats (GCE firewalls among them) take port
//! restrictions as a list of compact range strings. This module converts
//! between sets of port numbers and that representation.

use crate::error::{FirewallError, Result};
use std::collections::BTreeSet;

/// A single parsed port spec token: either one port or an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSpec {
    Single(u16),
    Range(u16, u16),
}

impl PortSpec {
    /// First port covered by this spec
    pub fn start(&self) -> u16 {
        match self {
            PortSpec::Single(p) => *p,
            PortSpec::Range(start, _) => *start,
        }
    }

    /// Last port covered by this spec
    pub fn end(&self) -> u16 {
        match self {
            PortSpec::Single(p) => *p,
            PortSpec::Range(_, end) => *end,
        }
    }
}

impl std::fmt::Display for PortSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortSpec::Single(p) => write!(f, "{}", p),
            PortSpec::Range(start, end) => write!(f, "{}-{}", start, end),
        }
    }
}

/// Compact a collection of ports into the minimal ordered list of range
/// tokens.
///
/// Duplicates and ordering in the input are immaterial. Maximal runs of
/// consecutive ports become one `"A-B"` token; isolated ports become a
/// bare `"N"` token (never a degenerate `"N-N"`). Tokens come out in
/// ascending order of their start port.
///
/// Empty input yields `None`, matching the wire convention where "no port
/// restriction" is expressed by omitting the field entirely rather than
/// sending an empty list.
///
/// ```
/// use strato_firewall::compact_ports;
///
/// let tokens = compact_ports([3, 1, 5, 2, 1002, 17, 1001, 22, 80, 1000]).unwrap();
/// assert_eq!(tokens, ["1-3", "5", "17", "22", "80", "1000-1002"]);
/// assert_eq!(compact_ports([]), None);
/// ```
pub fn compact_ports(ports: impl IntoIterator<Item = u16>) -> Option<Vec<String>> {
    let unique: BTreeSet<u16> = ports.into_iter().collect();

    let mut iter = unique.into_iter();
    let first = iter.next()?;

    let mut tokens = Vec::new();
    let mut start = first;
    let mut end = first;

    for port in iter {
        // checked_add keeps a run ending at u16::MAX from wrapping
        if Some(port) == end.checked_add(1) {
            end = port;
        } else {
            tokens.push(render_run(start, end));
            start = port;
            end = port;
        }
    }
    tokens.push(render_run(start, end));

    Some(tokens)
}

fn render_run(start: u16, end: u16) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{}-{}", start, end)
    }
}

/// Expand range tokens back into the set of ports they cover.
///
/// This is the inverse of [`compact_ports`], used when reading provider
/// responses back into port sets.
pub fn expand_ports<I, S>(specs: I) -> Result<BTreeSet<u16>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut ports = BTreeSet::new();
    for spec in specs {
        match parse_port_spec(spec.as_ref())? {
            PortSpec::Single(p) => {
                ports.insert(p);
            }
            PortSpec::Range(start, end) => {
                ports.extend(start..=end);
            }
        }
    }
    Ok(ports)
}

/// Parse a single port spec token ("22" or "1000-1002").
///
/// Whitespace around the token is tolerated; an inverted range such as
/// "80-22" is rejected.
pub fn parse_port_spec(spec: &str) -> Result<PortSpec> {
    let trimmed = spec.trim();
    if trimmed.is_empty() {
        return Err(FirewallError::InvalidSpec(spec.to_string()));
    }

    match trimmed.split_once('-') {
        None => {
            let port = parse_port(trimmed)?;
            Ok(PortSpec::Single(port))
        }
        Some((start_str, end_str)) => {
            let start = parse_port(start_str)?;
            let end = parse_port(end_str)?;
            if start > end {
                return Err(FirewallError::InvertedRange {
                    spec: trimmed.to_string(),
                    start,
                    end,
                });
            }
            if start == end {
                return Ok(PortSpec::Single(start));
            }
            Ok(PortSpec::Range(start, end))
        }
    }
}

fn parse_port(s: &str) -> Result<u16> {
    s.trim()
        .parse::<u16>()
        .map_err(|_| FirewallError::InvalidPort(s.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_port() {
        assert_eq!(compact_ports([22]), Some(vec!["22".to_string()]));
    }

    #[test]
    fn test_consecutive_run() {
        assert_eq!(compact_ports([1, 2, 3, 4]), Some(vec!["1-4".to_string()]));
    }

    #[test]
    fn test_mixed_unsorted() {
        let tokens = compact_ports([3, 1, 5, 2, 1002, 17, 1001, 22, 80, 1000]).unwrap();
        assert_eq!(tokens, ["1-3", "5", "17", "22", "80", "1000-1002"]);
    }

    #[test]
    fn test_trailing_singleton() {
        let tokens = compact_ports([1, 2, 3, 4, 7]).unwrap();
        assert_eq!(tokens, ["1-4", "7"]);
    }

    #[test]
    fn test_empty_input_is_absent() {
        assert_eq!(compact_ports([]), None);
    }

    #[test]
    fn test_duplicates_collapse() {
        let tokens = compact_ports([80, 80, 443, 80]).unwrap();
        assert_eq!(tokens, ["80", "443"]);
    }

    #[test]
    fn test_run_at_port_max() {
        let tokens = compact_ports([65534, 65535]).unwrap();
        assert_eq!(tokens, ["65534-65535"]);
        assert_eq!(compact_ports([65535]), Some(vec!["65535".to_string()]));
    }

    #[test]
    fn test_port_zero() {
        let tokens = compact_ports([0, 1, 2, 9]).unwrap();
        assert_eq!(tokens, ["0-2", "9"]);
    }

    #[test]
    fn test_roundtrip_covers_input_exactly() {
        let input: BTreeSet<u16> = [3u16, 1, 5, 2, 1002, 17, 1001, 22, 80, 1000]
            .into_iter()
            .collect();
        let tokens = compact_ports(input.iter().copied()).unwrap();
        assert_eq!(expand_ports(&tokens).unwrap(), input);
    }

    #[test]
    fn test_no_degenerate_ranges_and_minimality() {
        let inputs: Vec<Vec<u16>> = vec![
            vec![22],
            vec![1, 2, 3, 4],
            vec![1, 2, 3, 4, 7],
            vec![3, 1, 5, 2, 1002, 17, 1001, 22, 80, 1000],
            vec![0, 65535],
            (100..=200).collect(),
        ];

        for input in inputs {
            let tokens = compact_ports(input.clone()).unwrap();
            let specs: Vec<PortSpec> = tokens
                .iter()
                .map(|t| parse_port_spec(t).unwrap())
                .collect();

            for (token, spec) in tokens.iter().zip(&specs) {
                // singleton runs must render as "N", not "N-N"
                if token.contains('-') {
                    assert!(
                        matches!(spec, PortSpec::Range(start, end) if start < end),
                        "degenerate range token {} in {:?}",
                        token,
                        tokens
                    );
                }
            }

            for pair in specs.windows(2) {
                // ascending order of start values
                assert!(pair[0].start() < pair[1].start());
                // adjacent tokens must not be mergeable
                assert!(u32::from(pair[0].end()) + 1 < u32::from(pair[1].start()));
            }
        }
    }

    #[test]
    fn test_parse_single() {
        assert_eq!(parse_port_spec("22").unwrap(), PortSpec::Single(22));
        assert_eq!(parse_port_spec(" 443 ").unwrap(), PortSpec::Single(443));
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(
            parse_port_spec("1000-1002").unwrap(),
            PortSpec::Range(1000, 1002)
        );
    }

    #[test]
    fn test_parse_degenerate_range_collapses() {
        assert_eq!(parse_port_spec("80-80").unwrap(), PortSpec::Single(80));
    }

    #[test]
    fn test_parse_rejects_inverted_range() {
        assert!(matches!(
            parse_port_spec("80-22"),
            Err(FirewallError::InvertedRange { start: 80, end: 22, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_port_spec("").is_err());
        assert!(parse_port_spec("http").is_err());
        assert!(parse_port_spec("70000").is_err());
        assert!(parse_port_spec("22-").is_err());
    }

    #[test]
    fn test_expand_ports() {
        let ports = expand_ports(["1-3", "80"]).unwrap();
        assert_eq!(ports, [1u16, 2, 3, 80].into_iter().collect());
    }
}
