//! Raw TCP connect probe

use crate::types::ProbeStatus;
use std::{
    net::{IpAddr, SocketAddr},
    time::{Duration, Instant},
};
use tokio::{net::TcpStream, time::timeout};

/// Result of one connect attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TcpOutcome {
    /// `Opened` on a completed handshake, `Closed` otherwise
    pub status: ProbeStatus,
    pub latency: Duration,
}

impl TcpOutcome {
    pub fn is_open(&self) -> bool {
        self.status == ProbeStatus::Opened
    }
}

/// TCP connect prober with a fixed deadline
#[derive(Debug, Clone)]
pub struct TcpProber {
    timeout: Duration,
}

impl TcpProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Attempt one connection. Refusal, unreachable networks and the deadline
    /// passing all count as `Closed`. The stream is dropped right away.
    pub async fn connect(&self, address: IpAddr, port: u16) -> TcpOutcome {
        let socket_addr = SocketAddr::new(address, port);
        let start = Instant::now();

        let status = match timeout(self.timeout, TcpStream::connect(socket_addr)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                ProbeStatus::Opened
            }
            Ok(Err(_)) | Err(_) => ProbeStatus::Closed,
        };

        TcpOutcome {
            status,
            latency: start.elapsed(),
        }
    }
}
