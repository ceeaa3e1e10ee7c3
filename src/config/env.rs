//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use crate::types::{OutputFormat, ProbePolicy};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        if Path::new(".env").exists() {
            dotenv::from_filename(".env")
                .map_err(|e| AppError::config(format!("Failed to load .env file: {}", e)))?;

            if debug {
                eprintln!("Loaded configuration from .env file");
            }
        } else if debug {
            eprintln!("No .env file found, using defaults and CLI arguments");
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# Reachability Notifier Configuration
#
# Values specified here are used as defaults and can be overridden by
# environment variables or command-line arguments.

# Target list (semicolon-delimited, columns: target;ports)
# INPUT_FILE=input.csv

# Probe policy: standard, icmp or http
# PROBE_POLICY=standard

# TCP connect timeout in milliseconds
# TCP_TIMEOUT_MS=300

# HTTP request timeout in milliseconds
# HTTP_TIMEOUT_MS=2000

# Upper bound for one ping in seconds
# PING_TIMEOUT_SECONDS=5

# Pause between iterations in seconds (0 runs back to back)
# INTERVAL_SECONDS=0

# Number of iterations (0 runs until interrupted)
# ITERATIONS=0

# Targets checked at the same time
# CONCURRENCY=8

# Custom DNS servers (comma-separated IP addresses, empty uses the system resolver)
# DNS_SERVERS=8.8.8.8,1.1.1.1

# Probe loopback targets without HTTP proxies (true/false)
# BYPASS_PROXY_FOR_LOOPBACK=true

# Output format: text or json
# OUTPUT_FORMAT=text

# Enable colored output (true/false)
# ENABLE_COLOR=true

# Example configurations for different scenarios:
#
# Watching a handful of web services once a minute:
# PROBE_POLICY=http
# INTERVAL_SECONDS=60
#
# Ping sweep through a corporate resolver:
# PROBE_POLICY=icmp
# DNS_SERVERS=10.0.0.53
"#
        .to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        let content = Self::create_example_env_content();
        std::fs::write(path, content)
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))?;

        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "INPUT_FILE" => {
                if value.is_empty() {
                    return Err(AppError::config("INPUT_FILE cannot be empty"));
                }
            }
            "PROBE_POLICY" => {
                value
                    .parse::<ProbePolicy>()
                    .map_err(|e| AppError::config(format!("Invalid PROBE_POLICY value '{}': {}", value, e)))?;
            }
            "TCP_TIMEOUT_MS" => Self::validate_range(key, value, 1, 60_000)?,
            "HTTP_TIMEOUT_MS" => Self::validate_range(key, value, 1, 300_000)?,
            "PING_TIMEOUT_SECONDS" => Self::validate_range(key, value, 1, 60)?,
            "INTERVAL_SECONDS" => Self::validate_range(key, value, 0, 86_400)?,
            "ITERATIONS" => Self::validate_range(key, value, 0, u64::MAX)?,
            "CONCURRENCY" => Self::validate_range(key, value, 1, 256)?,
            "DNS_SERVERS" => {
                for server in value.split(',') {
                    let server = server.trim();
                    if !server.is_empty() {
                        server
                            .parse::<std::net::IpAddr>()
                            .map_err(|e| AppError::config(format!("Invalid DNS_SERVERS entry '{}': {}", server, e)))?;
                    }
                }
            }
            "BYPASS_PROXY_FOR_LOOPBACK" | "ENABLE_COLOR" => {
                value
                    .parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
            }
            "OUTPUT_FORMAT" => {
                value
                    .parse::<OutputFormat>()
                    .map_err(|e| AppError::config(format!("Invalid OUTPUT_FORMAT value '{}': {}", value, e)))?;
            }
            _ => {
                // Unknown environment variable, ignore
            }
        }

        Ok(())
    }

    fn validate_range(key: &str, value: &str, min: u64, max: u64) -> Result<()> {
        let parsed: u64 = value
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
        if parsed < min || parsed > max {
            return Err(AppError::config(format!(
                "{} must be between {} and {}, got: {}",
                key, min, max, parsed
            )));
        }
        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("INPUT_FILE", "Semicolon-delimited target list", "input.csv"),
            ("PROBE_POLICY", "Probes per target (standard, icmp, http)", "standard"),
            ("TCP_TIMEOUT_MS", "TCP connect timeout in ms (1-60000)", "300"),
            ("HTTP_TIMEOUT_MS", "HTTP request timeout in ms (1-300000)", "2000"),
            ("PING_TIMEOUT_SECONDS", "Ping timeout in seconds (1-60)", "5"),
            ("INTERVAL_SECONDS", "Pause between iterations (0-86400)", "30"),
            ("ITERATIONS", "Iterations to run, 0 for no limit", "0"),
            ("CONCURRENCY", "Targets checked at once (1-256)", "8"),
            ("DNS_SERVERS", "Comma-separated list of DNS server IPs", "8.8.8.8,1.1.1.1"),
            ("BYPASS_PROXY_FOR_LOOPBACK", "Skip HTTP proxies for loopback targets", "true"),
            ("OUTPUT_FORMAT", "Result rendering (text, json)", "text"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<26} {}\n", var, description));
            help.push_str(&format!("  {:<26} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(var_name, _, _)| {
                let value = std::env::var(var_name).ok()?;
                Self::validate_env_var(var_name, &value)
                    .err()
                    .map(|e| format!("Warning: {}", e))
            })
            .collect()
    }

    /// Check if .env file exists and validate its contents
    pub fn check_env_file(path: &Path) -> Result<Option<Vec<String>>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read .env file: {}", e)))?;

        let mut warnings = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                if let Err(e) = Self::validate_env_var(key.trim(), value) {
                    warnings.push(format!("Line '{}': {}", line, e));
                }
            }
        }

        Ok(Some(warnings))
    }
}
