//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::{env::EnvManager, Config},
    error::Result,
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        EnvManager::load_env_file(self.cli.debug)?;
        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if let Some(ref input) = cli.input {
            config.input_file = input.clone();
        }
        if let Some(policy) = cli.policy {
            config.probe_policy = policy;
        }
        if let Some(ms) = cli.tcp_timeout {
            config.tcp_timeout_ms = ms;
        }
        if let Some(ms) = cli.http_timeout {
            config.http_timeout_ms = ms;
        }
        if let Some(secs) = cli.ping_timeout {
            config.ping_timeout_seconds = secs;
        }
        if let Some(count) = cli.ping_count {
            config.ping_count = count;
        }
        if let Some(secs) = cli.interval {
            config.interval_seconds = secs;
        }
        if let Some(iterations) = cli.iterations {
            config.iterations = iterations;
        }
        if let Some(concurrency) = cli.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(ref servers) = cli.dns_servers {
            config.dns_servers = crate::models::config::split_list(servers);
        }
        if cli.no_proxy_bypass {
            config.bypass_proxy_for_loopback = false;
        }
        if let Some(format) = cli.format {
            config.output_format = format;
        }

        // An explicit flag wins; otherwise color also needs a capable terminal
        config.enable_color = match cli.color_override() {
            Some(enabled) => enabled,
            None => config.enable_color && cli.use_colors(),
        };

        // These are CLI-only
        config.verbose = cli.verbose;
        config.debug = cli.debug;

        if config.debug {
            eprintln!("Applied CLI overrides to configuration");
            eprintln!("{}", display_config_summary(config));
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let dns = if config.dns_servers.is_empty() {
        "system".to_string()
    } else {
        config.dns_servers.join(", ")
    };
    let iterations = if config.iterations == 0 {
        "unlimited".to_string()
    } else {
        config.iterations.to_string()
    };

    [
        format!("Input File: {}", config.input_file.display()),
        format!("Probe Policy: {}", config.probe_policy),
        format!("TCP Timeout: {}ms", config.tcp_timeout_ms),
        format!("HTTP Timeout: {}ms", config.http_timeout_ms),
        format!("Ping: {} echo(s), {}s timeout", config.ping_count, config.ping_timeout_seconds),
        format!("Interval: {}s", config.interval_seconds),
        format!("Iterations: {}", iterations),
        format!("Concurrency: {}", config.concurrency),
        format!("DNS Servers: {}", dns),
        format!("Loopback Proxy Bypass: {}", config.bypass_proxy_for_loopback),
        format!("Output Format: {}", config.output_format),
        format!("Color Output: {}", config.enable_color),
        format!("Verbose: {}", config.verbose),
        format!("Debug: {}", config.debug),
    ]
    .join("\n")
}
