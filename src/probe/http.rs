//! HTTP GET probe

use crate::error::{AppError, Result};
use reqwest::{Client, ClientBuilder, Url};
use std::{
    net::{IpAddr, SocketAddr},
    time::{Duration, Instant},
};
use tokio::time::timeout;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Port that switches the URL scheme to https
pub const HTTPS_PORT: u16 = 443;

/// Successful HTTP exchange; any status code counts as an answer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HttpOutcome {
    pub latency: Duration,
    pub status_code: u16,
}

/// Build the probe URL for a host and optional port.
///
/// 443 gives `https://host`, no port gives `http://host`, anything else
/// `http://host:port`. IPv6 literals are bracketed.
pub fn build_url(host: &str, port: Option<u16>) -> Result<Url> {
    let host = match host.parse::<IpAddr>() {
        Ok(IpAddr::V6(v6)) => format!("[{}]", v6),
        _ => host.to_string(),
    };

    let url = match port {
        Some(HTTPS_PORT) => format!("https://{}", host),
        Some(port) => format!("http://{}:{}", host, port),
        None => format!("http://{}", host),
    };

    Url::parse(&url).map_err(AppError::from)
}

/// HTTP prober holding a proxied client and a direct one for loopback targets
pub struct HttpProber {
    client: Client,
    direct: Client,
    timeout: Duration,
    bypass_proxy_for_loopback: bool,
}

impl HttpProber {
    pub fn new(timeout: Duration, bypass_proxy_for_loopback: bool) -> Result<Self> {
        let client = Self::builder(timeout, false)
            .build()
            .map_err(|e| AppError::config(format!("Failed to create HTTP client: {}", e)))?;
        let direct = Self::builder(timeout, true)
            .build()
            .map_err(|e| AppError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            direct,
            timeout,
            bypass_proxy_for_loopback,
        })
    }

    fn builder(timeout: Duration, direct: bool) -> ClientBuilder {
        let builder = Client::builder().timeout(timeout).user_agent(USER_AGENT);
        if direct {
            builder.no_proxy()
        } else {
            builder
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn use_direct(&self, address: IpAddr) -> bool {
        self.bypass_proxy_for_loopback && address.is_loopback()
    }

    /// Issue a GET against `host` and measure the time until response headers.
    ///
    /// When `host` is a name rather than `address` itself, the connection is
    /// pinned to `address` so each resolved address is probed on its own.
    pub async fn get(&self, host: &str, address: IpAddr, port: Option<u16>) -> Result<HttpOutcome> {
        let url = build_url(host, port)?;
        let direct = self.use_direct(address);

        let pinned;
        let client = if host.parse::<IpAddr>().is_ok() {
            if direct { &self.direct } else { &self.client }
        } else {
            let socket_addr = SocketAddr::new(address, port.unwrap_or(0));
            pinned = Self::builder(self.timeout, direct)
                .resolve(host, socket_addr)
                .build()
                .map_err(|e| AppError::http_request(format!("Failed to create HTTP client: {}", e)))?;
            &pinned
        };

        let start = Instant::now();
        let response = timeout(self.timeout, client.get(url.clone()).send())
            .await
            .map_err(|_| {
                AppError::connection_timeout(format!(
                    "GET {} timed out after {}ms",
                    url,
                    self.timeout.as_millis()
                ))
            })?
            .map_err(AppError::from)?;

        Ok(HttpOutcome {
            latency: start.elapsed(),
            status_code: response.status().as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_build_url_scheme_by_port() {
        assert_eq!(build_url("example.com", Some(443)).unwrap().as_str(), "https://example.com/");
        assert_eq!(build_url("example.com", Some(80)).unwrap().as_str(), "http://example.com/");
        assert_eq!(build_url("example.com", Some(8080)).unwrap().as_str(), "http://example.com:8080/");
        assert_eq!(build_url("10.0.0.5", None).unwrap().as_str(), "http://10.0.0.5/");
    }

    #[test]
    fn test_build_url_brackets_ipv6() {
        let url = build_url("2001:db8::1", Some(8080)).unwrap();
        assert_eq!(url.host_str(), Some("[2001:db8::1]"));
        assert_eq!(url.port(), Some(8080));
    }

    #[tokio::test]
    async fn test_get_reports_status_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let addr = *server.address();
        let prober = HttpProber::new(Duration::from_secs(2), true).unwrap();
        let outcome = prober
            .get(&addr.ip().to_string(), addr.ip(), Some(addr.port()))
            .await
            .unwrap();

        assert_eq!(outcome.status_code, 503);
    }

    #[tokio::test]
    async fn test_get_pins_hostname_to_address() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let addr = *server.address();
        let prober = HttpProber::new(Duration::from_secs(2), true).unwrap();
        let outcome = prober
            .get("probe-target.invalid", addr.ip(), Some(addr.port()))
            .await
            .unwrap();

        assert_eq!(outcome.status_code, 200);
    }

    #[tokio::test]
    async fn test_get_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let addr = *server.address();
        let prober = HttpProber::new(Duration::from_millis(200), true).unwrap();
        let err = prober
            .get(&addr.ip().to_string(), addr.ip(), Some(addr.port()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ConnectionTimeout(_)));
    }

    #[tokio::test]
    async fn test_get_to_closed_port_fails() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let prober = HttpProber::new(Duration::from_secs(2), true).unwrap();
        let err = prober
            .get("127.0.0.1", "127.0.0.1".parse().unwrap(), Some(port))
            .await
            .unwrap_err();

        assert!(!matches!(err, AppError::ConnectionTimeout(_)));
    }
}
