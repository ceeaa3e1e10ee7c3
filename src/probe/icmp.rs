//! ICMP echo through the platform `ping` utility

use crate::error::{AppError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::{net::IpAddr, process::Stdio, sync::OnceLock, time::Duration};
use tokio::{process::Command, time::timeout};

/// Parsed answer of a successful ping
#[derive(Debug, Clone, PartialEq)]
pub struct PingReply {
    /// Name token from the first output line, usually the pinged host
    pub name: Option<String>,
    pub rtt: Duration,
}

/// Echo probe seam; a raw-socket implementation can replace the subprocess
#[async_trait]
pub trait IcmpProbe: Send + Sync {
    async fn ping(&self, address: IpAddr) -> Result<PingReply>;
}

/// Runs the system `ping` command
#[derive(Debug, Clone)]
pub struct SystemPing {
    count: u32,
    timeout: Duration,
}

impl SystemPing {
    pub fn new(count: u32, timeout: Duration) -> Self {
        Self { count: count.max(1), timeout }
    }

    fn program(address: IpAddr) -> &'static str {
        if cfg!(target_os = "macos") && address.is_ipv6() {
            "ping6"
        } else {
            "ping"
        }
    }

    /// Time allowed for the whole `ping` run: echoes go out one second apart,
    /// the last one waits up to `timeout`, plus a second of process slack
    pub fn deadline(&self) -> Duration {
        self.timeout + Duration::from_secs(u64::from(self.count.saturating_sub(1))) + Duration::from_secs(1)
    }
}

/// Command line arguments for the current platform
pub fn ping_args(address: IpAddr, count: u32, wait: Duration) -> Vec<String> {
    let count = count.to_string();
    let mut args = if cfg!(target_os = "windows") {
        vec!["-n".to_string(), count, "-w".to_string(), wait.as_millis().to_string()]
    } else if cfg!(target_os = "macos") {
        vec!["-c".to_string(), count, "-t".to_string(), wait.as_secs().max(1).to_string()]
    } else {
        vec!["-c".to_string(), count, "-W".to_string(), wait.as_secs().max(1).to_string()]
    };
    args.push(address.to_string());
    args
}

#[async_trait]
impl IcmpProbe for SystemPing {
    async fn ping(&self, address: IpAddr) -> Result<PingReply> {
        let mut command = Command::new(Self::program(address));
        command
            .args(ping_args(address, self.count, self.timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = timeout(self.deadline(), command.output())
            .await
            .map_err(|_| AppError::ping(format!("ping {} timed out", address)))?
            .map_err(|e| AppError::ping(format!("failed to run ping: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.trim();
            return Err(AppError::ping(format!(
                "ping {} exited with {}{}",
                address,
                output.status,
                if detail.is_empty() { String::new() } else { format!(": {}", detail) }
            )));
        }

        parse_ping_output(&stdout)
    }
}

fn summary_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // Linux iputils, busybox, BSD and macOS summaries
            r"(?:rtt|round-trip) min/avg/max(?:/\w+)? = [\d.]+/([\d.]+)/",
            // Windows
            r"Average = (\d+)ms",
            // Per-reply line
            r"time[=<]\s*([\d.]+)\s*ms",
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    })
}

/// Extract the host name and round-trip time from ping output
pub fn parse_ping_output(output: &str) -> Result<PingReply> {
    let name = output
        .lines()
        .find(|line| !line.trim().is_empty())
        .and_then(|line| line.split_whitespace().nth(1))
        .map(|token| token.trim_end_matches(':').to_string());

    let rtt_ms = summary_patterns()
        .iter()
        .find_map(|pattern| pattern.captures(output))
        .and_then(|captures| captures[1].parse::<f64>().ok())
        .ok_or_else(|| AppError::ping("no round-trip time in ping output"))?;

    if !rtt_ms.is_finite() || rtt_ms < 0.0 {
        return Err(AppError::ping(format!("invalid round-trip time: {}", rtt_ms)));
    }

    Ok(PingReply {
        name,
        rtt: Duration::from_secs_f64(rtt_ms / 1000.0),
    })
}
