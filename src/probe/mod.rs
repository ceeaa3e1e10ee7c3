//! Probes for a single address: TCP connect, HTTP GET and ICMP echo

pub mod http;
pub mod icmp;
pub mod tcp;

pub use http::{build_url, HttpOutcome, HttpProber};
pub use icmp::{parse_ping_output, IcmpProbe, PingReply, SystemPing};
pub use tcp::{TcpOutcome, TcpProber};

use crate::{
    error::{AppError, Result},
    models::Config,
    types::{ProbeMethod, ProbeStatus},
};
use async_trait::async_trait;
use std::{net::IpAddr, sync::Arc, time::Duration};

/// Probe operations used by the run loop
#[async_trait]
pub trait Prober: Send + Sync {
    /// Connect-probe `address:port`
    async fn tcp_connect(&self, address: IpAddr, port: u16) -> TcpOutcome;

    /// GET `host` (pinned to `address`) on `port`, or the scheme default
    async fn http_get(&self, host: &str, address: IpAddr, port: Option<u16>) -> Result<HttpOutcome>;

    /// Echo-probe `address`
    async fn icmp_ping(&self, address: IpAddr) -> Result<PingReply>;

    /// Deadline applied to HTTP requests, reported as latency on timeouts
    fn http_timeout(&self) -> Duration;
}

/// Prober that talks to the network
pub struct NetworkProber {
    tcp: TcpProber,
    http: HttpProber,
    icmp: Arc<dyn IcmpProbe>,
}

impl NetworkProber {
    pub fn new(tcp: TcpProber, http: HttpProber, icmp: Arc<dyn IcmpProbe>) -> Self {
        Self { tcp, http, icmp }
    }

    /// Build all probes from configuration, using the system `ping`
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            TcpProber::new(config.tcp_timeout()),
            HttpProber::new(config.http_timeout(), config.bypass_proxy_for_loopback)?,
            Arc::new(SystemPing::new(config.ping_count, config.ping_timeout())),
        ))
    }
}

#[async_trait]
impl Prober for NetworkProber {
    async fn tcp_connect(&self, address: IpAddr, port: u16) -> TcpOutcome {
        self.tcp.connect(address, port).await
    }

    async fn http_get(&self, host: &str, address: IpAddr, port: Option<u16>) -> Result<HttpOutcome> {
        self.http.get(host, address, port).await
    }

    async fn icmp_ping(&self, address: IpAddr) -> Result<PingReply> {
        self.icmp.ping(address).await
    }

    fn http_timeout(&self) -> Duration {
        self.http.timeout()
    }
}

/// Status and latency of a combined TCP + HTTP port probe, tagged with the
/// method the figures came from
pub fn port_probe_outcome(
    tcp: &TcpOutcome,
    http: &Result<HttpOutcome>,
    http_timeout: Duration,
) -> (ProbeStatus, Duration, ProbeMethod) {
    match http {
        Ok(outcome) => (tcp.status, outcome.latency, ProbeMethod::Http),
        Err(AppError::ConnectionTimeout(_)) => (ProbeStatus::TimedOut, http_timeout, ProbeMethod::Http),
        Err(_) if tcp.is_open() => (tcp.status, tcp.latency, ProbeMethod::Tcp),
        Err(_) => (ProbeStatus::Unknown, http_timeout, ProbeMethod::Http),
    }
}

/// Status and latency of an HTTP-only probe
pub fn http_only_outcome(http: &Result<HttpOutcome>, http_timeout: Duration) -> (ProbeStatus, Duration) {
    match http {
        Ok(outcome) => (ProbeStatus::Opened, outcome.latency),
        Err(AppError::ConnectionTimeout(_)) => (ProbeStatus::TimedOut, http_timeout),
        Err(_) => (ProbeStatus::Unknown, http_timeout),
    }
}

/// Status and latency of an echo probe
pub fn icmp_outcome(reply: &Result<PingReply>) -> (ProbeStatus, Duration) {
    match reply {
        Ok(reply) => (ProbeStatus::Opened, reply.rtt),
        Err(_) => (ProbeStatus::Unknown, Duration::ZERO),
    }
}
