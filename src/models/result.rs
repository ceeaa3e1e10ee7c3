//! Probe results and per-iteration reports

use crate::types::{ProbeMethod, ProbeStatus};
use crate::models::Target;
use chrono::{DateTime, Local, SubsecRound};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Port value shown when a probe has no port
pub const NO_PORT: i32 = -1;

/// Outcome of one probe attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Local time, microsecond precision
    pub timestamp: DateTime<Local>,
    /// Configured target string
    pub displayed_name: String,
    pub address: String,
    /// Round-trip time, rounded to two decimals
    pub latency_ms: f64,
    /// Probed port, or -1 for ICMP and portless probes
    pub port: i32,
    pub status: ProbeStatus,
    pub method: ProbeMethod,
}

impl ProbeResult {
    pub fn new(
        displayed_name: impl Into<String>,
        address: IpAddr,
        latency: Duration,
        port: Option<u16>,
        status: ProbeStatus,
        method: ProbeMethod,
    ) -> Self {
        Self {
            timestamp: Local::now().trunc_subsecs(6),
            displayed_name: displayed_name.into(),
            address: address.to_string(),
            latency_ms: round_ms(latency.as_secs_f64() * 1000.0),
            port: port.map(i32::from).unwrap_or(NO_PORT),
            status,
            method,
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.status == ProbeStatus::Opened
    }
}

/// Round to two decimal places
pub fn round_ms(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// How a target was classified for this iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "addresses", rename_all = "snake_case")]
pub enum TargetKind {
    /// The target string is an IP address
    LiteralIp(IpAddr),
    /// The target string resolved to these addresses
    Hostname(Vec<IpAddr>),
}

impl TargetKind {
    pub fn addresses(&self) -> Vec<IpAddr> {
        match self {
            Self::LiteralIp(ip) => vec![*ip],
            Self::Hostname(ips) => ips.clone(),
        }
    }

    pub fn is_literal_ip(&self) -> bool {
        matches!(self, Self::LiteralIp(_))
    }
}

/// Everything one target produced in one iteration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetReport {
    pub target: Target,
    pub kind: TargetKind,
    pub results: Vec<ProbeResult>,
}

impl TargetReport {
    pub fn new(target: Target, kind: TargetKind) -> Self {
        Self { target, kind, results: Vec::new() }
    }
}

/// Counters for one pass over all targets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IterationSummary {
    pub iteration: u64,
    pub targets_checked: usize,
    pub targets_failed: usize,
    pub probes: usize,
    pub opened: usize,
    pub closed: usize,
    pub unknown: usize,
    pub timed_out: usize,
    pub elapsed: Duration,
}

impl IterationSummary {
    pub fn new(iteration: u64) -> Self {
        Self { iteration, ..Self::default() }
    }

    pub fn record_report(&mut self, report: &TargetReport) {
        self.targets_checked += 1;
        for result in &report.results {
            self.record_status(result.status);
        }
    }

    pub fn record_failure(&mut self) {
        self.targets_failed += 1;
    }

    fn record_status(&mut self, status: ProbeStatus) {
        self.probes += 1;
        match status {
            ProbeStatus::Opened => self.opened += 1,
            ProbeStatus::Closed => self.closed += 1,
            ProbeStatus::Unknown => self.unknown += 1,
            ProbeStatus::TimedOut => self.timed_out += 1,
        }
    }
}
