//! Reachability Notifier
//!
//! Periodically checks that a list of hosts and services answers. Host
//! names are resolved first, then every address is probed with TCP
//! connects and HTTP requests on the configured ports, or pinged when no
//! ports are given. Each result is printed as one fixed-width line.

pub mod app;
pub mod cli;
pub mod config;
pub mod dns;
pub mod error;
pub mod input;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod output;
pub mod probe;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Config, IterationSummary, ProbeResult, Target, TargetKind, TargetReport};
pub use monitor::{Monitor, MonitorSettings, TargetChecker};
pub use output::{OutputFormatter, OutputFormatterFactory, PlainFormatter, Reporter};
pub use types::{OutputFormat, ProbeMethod, ProbePolicy, ProbeStatus};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_INPUT_FILE: &str = "input.csv";
    pub const DEFAULT_DELIMITER: u8 = b';';
    pub const DEFAULT_TCP_TIMEOUT: Duration = Duration::from_millis(300);
    pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(2);
    pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_PING_COUNT: u32 = 1;
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    /// Concurrent target checks, scaled to the machine
    pub fn default_concurrency() -> usize {
        (num_cpus::get() * 2).clamp(4, 50)
    }
}
