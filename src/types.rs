//! Type definitions and aliases

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// DNS configuration variants supported by the resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DnsConfig {
    /// Use system default DNS resolution
    System,
    /// Use custom DNS servers
    Custom { servers: Vec<IpAddr> },
}

impl DnsConfig {
    /// Get a human-readable name for this DNS configuration
    pub fn name(&self) -> String {
        match self {
            DnsConfig::System => "system".to_string(),
            DnsConfig::Custom { servers } => {
                if servers.len() == 1 {
                    format!("custom ({})", servers[0])
                } else {
                    format!("custom ({} servers)", servers.len())
                }
            }
        }
    }
}

/// Which probes run for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProbePolicy {
    /// TCP connect + HTTP GET per port, ICMP when no ports are configured
    #[default]
    Standard,
    /// ICMP only, configured ports are ignored
    Icmp,
    /// HTTP GET only, without a port suffix when no ports are configured
    Http,
}

impl fmt::Display for ProbePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Standard => "standard",
            Self::Icmp => "icmp",
            Self::Http => "http",
        };
        f.write_str(name)
    }
}

impl FromStr for ProbePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "tcp+http" | "default" => Ok(Self::Standard),
            "icmp" | "ping" => Ok(Self::Icmp),
            "http" | "http-only" => Ok(Self::Http),
            other => Err(AppError::parse(format!(
                "Invalid probe policy '{}' (expected standard, icmp or http)",
                other
            ))),
        }
    }
}

/// Output rendering of probe results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Fixed-width, pipe-delimited lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(AppError::parse(format!(
                "Invalid output format '{}' (expected text or json)",
                other
            ))),
        }
    }
}

/// Reachability status of a single probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProbeStatus {
    Opened,
    Closed,
    Unknown,
    TimedOut,
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Opened => "Opened",
            Self::Closed => "Closed",
            Self::Unknown => "Unknown",
            Self::TimedOut => "TimedOut",
        };
        f.write_str(label)
    }
}

impl FromStr for ProbeStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Opened" => Ok(Self::Opened),
            "Closed" => Ok(Self::Closed),
            "Unknown" => Ok(Self::Unknown),
            "TimedOut" => Ok(Self::TimedOut),
            other => Err(AppError::parse(format!("Invalid probe status: {}", other))),
        }
    }
}

/// Probe method that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMethod {
    Tcp,
    Http,
    Icmp,
}

impl fmt::Display for ProbeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => f.write_str("tcp"),
            Self::Http => f.write_str("http"),
            Self::Icmp => f.write_str("icmp"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_policy_parsing() {
        assert_eq!("standard".parse::<ProbePolicy>().unwrap(), ProbePolicy::Standard);
        assert_eq!("ICMP".parse::<ProbePolicy>().unwrap(), ProbePolicy::Icmp);
        assert_eq!(" http-only ".parse::<ProbePolicy>().unwrap(), ProbePolicy::Http);
        assert!("udp".parse::<ProbePolicy>().is_err());
        assert_eq!(ProbePolicy::default(), ProbePolicy::Standard);
    }

    #[test]
    fn test_probe_status_display_parse() {
        for status in [ProbeStatus::Opened, ProbeStatus::Closed, ProbeStatus::Unknown, ProbeStatus::TimedOut] {
            assert_eq!(status.to_string().parse::<ProbeStatus>().unwrap(), status);
        }
        assert!("???".parse::<ProbeStatus>().is_err());
    }

    #[test]
    fn test_dns_config_name() {
        assert_eq!(DnsConfig::System.name(), "system");
        let single = DnsConfig::Custom { servers: vec!["8.8.8.8".parse().unwrap()] };
        assert_eq!(single.name(), "custom (8.8.8.8)");
        let multi = DnsConfig::Custom {
            servers: vec!["8.8.8.8".parse().unwrap(), "1.1.1.1".parse().unwrap()],
        };
        assert_eq!(multi.name(), "custom (2 servers)");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("Text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
