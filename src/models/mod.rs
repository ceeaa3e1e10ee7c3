//! Data models and structures for the reachability notifier

pub mod config;
pub mod result;
pub mod target;

// Re-export main model types
pub use config::Config;
pub use result::{IterationSummary, ProbeResult, TargetKind, TargetReport, NO_PORT};
pub use target::{parse_ports, Target};
