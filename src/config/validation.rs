//! Configuration validation utilities and rules

use crate::{
    error::{AppError, Result},
    models::Config,
    types::ProbePolicy,
};
use std::net::IpAddr;

/// Well-known public resolvers
const KNOWN_PUBLIC_DNS: &[IpAddr] = &[
    IpAddr::V4(std::net::Ipv4Addr::new(8, 8, 8, 8)),         // Google DNS
    IpAddr::V4(std::net::Ipv4Addr::new(8, 8, 4, 4)),         // Google DNS
    IpAddr::V4(std::net::Ipv4Addr::new(1, 1, 1, 1)),         // Cloudflare DNS
    IpAddr::V4(std::net::Ipv4Addr::new(1, 0, 0, 1)),         // Cloudflare DNS
    IpAddr::V4(std::net::Ipv4Addr::new(208, 67, 222, 222)),  // OpenDNS
    IpAddr::V4(std::net::Ipv4Addr::new(208, 67, 220, 220)),  // OpenDNS
    IpAddr::V4(std::net::Ipv4Addr::new(9, 9, 9, 9)),         // Quad9 DNS
    IpAddr::V4(std::net::Ipv4Addr::new(149, 112, 112, 112)), // Quad9 DNS
    IpAddr::V6(std::net::Ipv6Addr::new(0x2001, 0x4860, 0x4860, 0, 0, 0, 0, 0x8888)),
    IpAddr::V6(std::net::Ipv6Addr::new(0x2001, 0x4860, 0x4860, 0, 0, 0, 0, 0x8844)),
    IpAddr::V6(std::net::Ipv6Addr::new(0x2606, 0x4700, 0x4700, 0, 0, 0, 0, 0x1111)),
    IpAddr::V6(std::net::Ipv6Addr::new(0x2606, 0x4700, 0x4700, 0, 0, 0, 0, 0x1001)),
    IpAddr::V6(std::net::Ipv6Addr::new(0x2620, 0xfe, 0, 0, 0, 0, 0, 0xfe)),
];

/// Configuration validator with advisory rules on top of `Config::validate`
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration with comprehensive checks
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(Self::validate_input_file(config));
        warnings.extend(Self::validate_dns_servers(&config.dns_servers)?);
        warnings.extend(Self::validate_timing_settings(config));

        Ok(warnings)
    }

    fn validate_input_file(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        match config.input_file.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("txt") => {}
            _ => warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "Input file '{}' has no .csv extension; it is still read as semicolon-delimited",
                    config.input_file.display()
                ),
            )),
        }

        warnings
    }

    /// Validate DNS servers with reachability hints
    fn validate_dns_servers(servers: &[String]) -> Result<Vec<ValidationWarning>> {
        let mut warnings = Vec::new();

        for server in servers {
            let ip = server
                .parse::<IpAddr>()
                .map_err(|e| AppError::config(format!("Invalid DNS server IP '{}': {}", server, e)))?;

            if Self::is_known_public_dns(&ip) {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("Using well-known public DNS server: {}", ip),
                ));
            }

            if ip.is_loopback() {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("DNS server {} is loopback address (localhost)", ip),
                ));
            } else if let IpAddr::V4(ipv4) = ip {
                if ipv4.is_private() {
                    warnings.push(ValidationWarning::new(
                        ValidationLevel::Warning,
                        format!("DNS server {} is in private IP range, ensure it's accessible", ip),
                    ));
                }
            }
        }

        Ok(warnings)
    }

    /// Timeouts and pacing that will likely produce misleading results
    fn validate_timing_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.tcp_timeout_ms < 100 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "TCP timeout of {}ms may report distant hosts as unreachable",
                    config.tcp_timeout_ms
                ),
            ));
        }

        if config.http_timeout_ms < 500 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "HTTP timeout of {}ms may be too short for TLS handshakes",
                    config.http_timeout_ms
                ),
            ));
        } else if config.http_timeout_ms > 30_000 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "Long HTTP timeout of {}ms will slow down failure detection",
                    config.http_timeout_ms
                ),
            ));
        }

        if config.interval_seconds == 0 && config.iterations == 0 {
            let level = if config.probe_policy == ProbePolicy::Icmp {
                ValidationLevel::Warning
            } else {
                ValidationLevel::Info
            };
            warnings.push(ValidationWarning::new(
                level,
                format!(
                    "No interval between iterations; {} probes will run back to back until interrupted",
                    config.probe_policy
                ),
            ));
        }

        warnings
    }

    /// Check if IP is a known public DNS server
    pub fn is_known_public_dns(ip: &IpAddr) -> bool {
        KNOWN_PUBLIC_DNS.contains(ip)
    }
}

/// Validation warning levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
    Error,
}

impl ValidationLevel {
    /// Get display string for level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }

    /// Get color for terminal display
    pub fn color(&self) -> colored::Color {
        match self {
            Self::Info => colored::Color::Blue,
            Self::Warning => colored::Color::Yellow,
            Self::Error => colored::Color::Red,
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        if use_color {
            use colored::Colorize;
            format!(
                "[{}] {}",
                self.level.as_str().color(self.level.color()).bold(),
                self.message
            )
        } else {
            format!("[{}] {}", self.level.as_str(), self.message)
        }
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}
