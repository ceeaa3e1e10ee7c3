//! Configured targets and port list parsing

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// A configured host identifier with its optional port list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Host name or literal IP exactly as configured
    pub raw: String,
    /// Ports to probe, in configured order
    pub ports: Vec<u16>,
}

impl Target {
    pub fn new<S: Into<String>>(raw: S, ports: Vec<u16>) -> Self {
        Self { raw: raw.into(), ports }
    }

    /// Build a target from the two text columns of an input record
    pub fn from_fields(host: &str, ports: Option<&str>) -> Option<Self> {
        let host = host.trim();
        if host.is_empty() {
            return None;
        }
        let ports = ports.map(parse_ports).unwrap_or_default();
        Some(Self::new(host, ports))
    }

    pub fn has_ports(&self) -> bool {
        !self.ports.is_empty()
    }

    /// The literal IP this target names, if any
    pub fn literal_ip(&self) -> Option<IpAddr> {
        let raw = self.raw.trim_start_matches('[').trim_end_matches(']');
        raw.parse().ok()
    }

    /// Reject host fields that are neither an IP nor a host name
    pub fn validate(&self) -> Result<()> {
        if self.literal_ip().is_some() || is_valid_hostname(&self.raw) {
            Ok(())
        } else {
            Err(AppError::input(format!("Malformed target '{}'", self.raw)))
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ports.is_empty() {
            write!(f, "{}", self.raw)
        } else {
            let ports: Vec<String> = self.ports.iter().map(|p| p.to_string()).collect();
            write!(f, "{};{}", self.raw, ports.join(","))
        }
    }
}

/// Parse a comma-separated port list, dropping every token that is not a
/// port number in 1..=65535. Order and repeated ports are kept, so every
/// listed port is checked.
pub fn parse_ports(field: &str) -> Vec<u16> {
    let mut ports = Vec::new();
    for token in field.split(',') {
        let token = token.trim();
        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        match token.parse::<u16>() {
            Ok(port) if port != 0 => ports.push(port),
            _ => {}
        }
    }
    ports
}

/// RFC 1123 host name check (labels of letters, digits and hyphens)
pub fn is_valid_hostname(host: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    if host.is_empty() || host.len() > 253 {
        return false;
    }

    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_ports_filters_invalid_tokens() {
        assert_eq!(parse_ports("80,abc"), vec![80]);
        assert_eq!(parse_ports("80, 443 ,8080"), vec![80, 443, 8080]);
        assert_eq!(parse_ports("-1,0,70000,22"), vec![22]);
        assert_eq!(parse_ports("443,443,80"), vec![443, 443, 80]);
        assert!(parse_ports("").is_empty());
    }

    #[test]
    fn test_from_fields() {
        let target = Target::from_fields("example.com", Some("80,443")).unwrap();
        assert_eq!(target.raw, "example.com");
        assert_eq!(target.ports, vec![80, 443]);

        let target = Target::from_fields(" 10.0.0.5 ", Some("")).unwrap();
        assert_eq!(target.raw, "10.0.0.5");
        assert!(!target.has_ports());

        assert!(Target::from_fields("", Some("80")).is_none());
        assert!(Target::from_fields("   ", None).is_none());
    }

    #[test]
    fn test_literal_ip_detection() {
        assert!(Target::new("10.0.0.5", vec![]).literal_ip().is_some());
        assert!(Target::new("::1", vec![]).literal_ip().is_some());
        assert!(Target::new("[2001:db8::1]", vec![]).literal_ip().is_some());
        assert!(Target::new("example.com", vec![]).literal_ip().is_none());
    }

    #[test]
    fn test_validate() {
        assert!(Target::new("example.com", vec![80]).validate().is_ok());
        assert!(Target::new("localhost", vec![]).validate().is_ok());
        assert!(Target::new("192.168.1.1", vec![]).validate().is_ok());

        let err = Target::new("bad host!", vec![]).validate().unwrap_err();
        assert_eq!(err.category(), "INPUT");
        assert!(Target::new("-leading.example", vec![]).validate().is_err());
        assert!(Target::new("a..b", vec![]).validate().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Target::new("example.com", vec![80, 443]).to_string(), "example.com;80,443");
        assert_eq!(Target::new("10.0.0.5", vec![]).to_string(), "10.0.0.5");
    }

    proptest! {
        #[test]
        fn parse_ports_never_lets_invalid_tokens_through(tokens in prop::collection::vec("[a-z0-9-]{0,6}", 0..8)) {
            let field = tokens.join(",");
            for port in parse_ports(&field) {
                prop_assert!(port >= 1);
                let text = port.to_string();
                prop_assert!(tokens.iter().any(|t| t.trim() == text || t.trim().trim_start_matches('0') == text));
            }
        }
    }
}
