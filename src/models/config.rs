//! Configuration data model and validation

use crate::types::{AppError, DnsConfig, OutputFormat, ProbePolicy, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Semicolon-delimited target list
    #[serde(default = "default_input_file")]
    pub input_file: PathBuf,

    /// Which probes run per target
    #[serde(default)]
    pub probe_policy: ProbePolicy,

    /// TCP connect timeout in milliseconds
    #[serde(default = "default_tcp_timeout_ms")]
    pub tcp_timeout_ms: u64,

    /// HTTP GET timeout in milliseconds
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    /// Upper bound for one ping subprocess
    #[serde(default = "default_ping_timeout_secs")]
    pub ping_timeout_seconds: u64,

    /// Echo requests per ping invocation
    #[serde(default = "default_ping_count")]
    pub ping_count: u32,

    /// Pause between loop iterations (0 runs back to back)
    #[serde(default)]
    pub interval_seconds: u64,

    /// Number of loop iterations (0 runs until interrupted)
    #[serde(default)]
    pub iterations: u64,

    /// Targets checked at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// DNS server IP addresses; empty uses the system resolver
    #[serde(default)]
    pub dns_servers: Vec<String>,

    /// Connect to loopback targets without any HTTP proxy
    #[serde(default = "default_bypass_proxy")]
    pub bypass_proxy_for_loopback: bool,

    /// Rendering of probe results
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_file: default_input_file(),
            probe_policy: ProbePolicy::default(),
            tcp_timeout_ms: default_tcp_timeout_ms(),
            http_timeout_ms: default_http_timeout_ms(),
            ping_timeout_seconds: default_ping_timeout_secs(),
            ping_count: default_ping_count(),
            interval_seconds: 0,
            iterations: 0,
            concurrency: default_concurrency(),
            dns_servers: Vec::new(),
            bypass_proxy_for_loopback: default_bypass_proxy(),
            output_format: OutputFormat::default(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tcp_timeout(&self) -> Duration {
        Duration::from_millis(self.tcp_timeout_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_seconds)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.input_file.as_os_str().is_empty() {
            return Err(AppError::config("Input file path cannot be empty"));
        }

        for dns_server in &self.dns_servers {
            if dns_server.is_empty() {
                return Err(AppError::config("DNS server cannot be empty"));
            }
            if IpAddr::from_str(dns_server).is_err() {
                return Err(AppError::config(format!("Invalid DNS server IP address: {}", dns_server)));
            }
        }

        if self.tcp_timeout_ms == 0 || self.tcp_timeout_ms > 60_000 {
            return Err(AppError::config("TCP timeout must be between 1 and 60000 ms"));
        }

        if self.http_timeout_ms == 0 || self.http_timeout_ms > 300_000 {
            return Err(AppError::config("HTTP timeout must be between 1 and 300000 ms"));
        }

        if self.ping_timeout_seconds == 0 || self.ping_timeout_seconds > 60 {
            return Err(AppError::config("Ping timeout must be between 1 and 60 seconds"));
        }

        if self.ping_count == 0 || self.ping_count > 10 {
            return Err(AppError::config("Ping count must be between 1 and 10"));
        }

        if self.concurrency == 0 || self.concurrency > 256 {
            return Err(AppError::config("Concurrency must be between 1 and 256"));
        }

        if self.interval_seconds > 86_400 {
            return Err(AppError::config("Interval cannot exceed one day"));
        }

        Ok(())
    }

    /// Build the resolver configuration from the DNS server list
    pub fn dns_config(&self) -> Result<DnsConfig> {
        if self.dns_servers.is_empty() {
            return Ok(DnsConfig::System);
        }

        let mut servers = Vec::with_capacity(self.dns_servers.len());
        for dns_server in &self.dns_servers {
            let ip = IpAddr::from_str(dns_server).map_err(|e| {
                AppError::dns_resolution(format!("Failed to parse DNS server {}: {}", dns_server, e))
            })?;
            servers.push(ip);
        }
        Ok(DnsConfig::Custom { servers })
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(input_file) = std::env::var("INPUT_FILE") {
            self.input_file = PathBuf::from(input_file.trim());
        }

        if let Ok(policy) = std::env::var("PROBE_POLICY") {
            self.probe_policy = policy.parse()
                .map_err(|e| AppError::config(format!("Invalid PROBE_POLICY value '{}': {}", policy, e)))?;
        }

        if let Ok(timeout) = std::env::var("TCP_TIMEOUT_MS") {
            self.tcp_timeout_ms = timeout.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid TCP_TIMEOUT_MS value '{}': {}", timeout, e)))?;
        }

        if let Ok(timeout) = std::env::var("HTTP_TIMEOUT_MS") {
            self.http_timeout_ms = timeout.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid HTTP_TIMEOUT_MS value '{}': {}", timeout, e)))?;
        }

        if let Ok(timeout) = std::env::var("PING_TIMEOUT_SECONDS") {
            self.ping_timeout_seconds = timeout.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid PING_TIMEOUT_SECONDS value '{}': {}", timeout, e)))?;
        }

        if let Ok(interval) = std::env::var("INTERVAL_SECONDS") {
            self.interval_seconds = interval.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid INTERVAL_SECONDS value '{}': {}", interval, e)))?;
        }

        if let Ok(iterations) = std::env::var("ITERATIONS") {
            self.iterations = iterations.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ITERATIONS value '{}': {}", iterations, e)))?;
        }

        if let Ok(concurrency) = std::env::var("CONCURRENCY") {
            self.concurrency = concurrency.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid CONCURRENCY value '{}': {}", concurrency, e)))?;
        }

        if let Ok(dns_servers) = std::env::var("DNS_SERVERS") {
            self.dns_servers = split_list(&dns_servers);
        }

        if let Ok(bypass) = std::env::var("BYPASS_PROXY_FOR_LOOPBACK") {
            self.bypass_proxy_for_loopback = bypass.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid BYPASS_PROXY_FOR_LOOPBACK value '{}': {}", bypass, e)))?;
        }

        if let Ok(format) = std::env::var("OUTPUT_FORMAT") {
            self.output_format = format.parse()
                .map_err(|e| AppError::config(format!("Invalid OUTPUT_FORMAT value '{}': {}", format, e)))?;
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }
}

pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Default value functions for serde
fn default_input_file() -> PathBuf {
    PathBuf::from(crate::defaults::DEFAULT_INPUT_FILE)
}

fn default_tcp_timeout_ms() -> u64 {
    crate::defaults::DEFAULT_TCP_TIMEOUT.as_millis() as u64
}

fn default_http_timeout_ms() -> u64 {
    crate::defaults::DEFAULT_HTTP_TIMEOUT.as_millis() as u64
}

fn default_ping_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_PING_TIMEOUT.as_secs()
}

fn default_ping_count() -> u32 {
    crate::defaults::DEFAULT_PING_COUNT
}

fn default_concurrency() -> usize {
    crate::defaults::default_concurrency()
}

fn default_bypass_proxy() -> bool {
    true
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
