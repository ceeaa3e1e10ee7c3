//! Command-line interface

use crate::types::{OutputFormat, ProbePolicy};
use clap::Parser;
use std::path::PathBuf;

/// Reachability Notifier - periodically checks that hosts and services answer
#[derive(Parser, Debug, Clone)]
#[command(name = "reachability-notifier")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Semicolon-delimited target list (columns: target;ports)
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Probe policy: standard (TCP+HTTP on ports, ping otherwise), icmp or http
    #[arg(short, long, value_name = "POLICY")]
    pub policy: Option<ProbePolicy>,

    /// TCP connect timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub tcp_timeout: Option<u64>,

    /// HTTP request timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub http_timeout: Option<u64>,

    /// Upper bound for one ping, e.g. 5, 5s or 1m
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub ping_timeout: Option<u64>,

    /// Echo requests sent per ping
    #[arg(long, value_name = "N")]
    pub ping_count: Option<u32>,

    /// Pause between iterations, e.g. 30, 30s or 5m
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub interval: Option<u64>,

    /// Stop after this many iterations (0 runs until interrupted)
    #[arg(short = 'n', long, value_name = "N")]
    pub iterations: Option<u64>,

    /// Number of targets checked at the same time
    #[arg(short = 'j', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Custom DNS servers (comma-separated)
    #[arg(long)]
    pub dns_servers: Option<String>,

    /// Send loopback HTTP probes through configured proxies too
    #[arg(long)]
    pub no_proxy_bypass: bool,

    /// Output format: text or json
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Force colored output
    #[arg(long)]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Write an example .env file to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub write_env_example: Option<PathBuf>,

    /// Describe the supported environment variables and exit
    #[arg(long)]
    pub env_help: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts
    pub fn validate(&self) -> Result<(), String> {
        if self.color && self.no_color {
            return Err("Cannot specify both --color and --no-color".to_string());
        }

        if let Some(0) = self.concurrency {
            return Err("--concurrency must be at least 1".to_string());
        }

        if let Some(0) = self.ping_count {
            return Err("--ping-count must be at least 1".to_string());
        }

        Ok(())
    }

    /// Color preference given on the command line, if any
    pub fn color_override(&self) -> Option<bool> {
        if self.color {
            Some(true)
        } else if self.no_color {
            Some(false)
        } else {
            None
        }
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        self.color_override().unwrap_or_else(supports_color)
    }

    /// True when the invocation only prints help-like output
    pub fn is_utility_mode(&self) -> bool {
        self.env_help || self.write_env_example.is_some()
    }
}

/// Parse a duration given as plain seconds or with an s/m/h suffix
fn parse_duration(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let (digits, multiplier) = if let Some(v) = s.strip_suffix('s') {
        (v, 1)
    } else if let Some(v) = s.strip_suffix('m') {
        (v, 60)
    } else if let Some(v) = s.strip_suffix('h') {
        (v, 3600)
    } else {
        (s, 1)
    };

    digits
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("Invalid duration: '{}'", s))?
        .checked_mul(multiplier)
        .ok_or_else(|| format!("Duration too large: '{}'", s))
}

/// Detect whether the terminal supports colors
fn supports_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    #[cfg(unix)]
    {
        std::env::var("TERM").map(|term| term != "dumb").unwrap_or(true)
    }
    #[cfg(not(unix))]
    {
        false
    }
}
