//! DNS resolution and target classification

use crate::{
    error::{AppError, Result},
    models::TargetKind,
    types::DnsConfig,
};
use async_trait::async_trait;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use trust_dns_resolver::{
    config::{LookupIpStrategy, NameServerConfig, Protocol, ResolverConfig, ResolverOpts},
    system_conf,
    TokioAsyncResolver,
};

/// Shortest textual address kept after resolution
pub const MIN_ADDRESS_LEN: usize = 5;

/// Forward lookup seam, so the run loop can be driven by a scripted resolver
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Look up all addresses for a host name
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>>;
}

/// DNS manager backed by trust-dns, built once per configuration
pub struct DnsManager {
    resolver: TokioAsyncResolver,
    config: DnsConfig,
    system_fallback: bool,
}

impl DnsManager {
    /// Create a DNS manager for the given configuration
    pub fn new(dns_config: &DnsConfig) -> Result<Self> {
        let (resolver_config, opts, system_fallback) = Self::resolver_setup(dns_config)?;
        let resolver = TokioAsyncResolver::tokio(resolver_config, opts);

        Ok(Self {
            resolver,
            config: dns_config.clone(),
            system_fallback,
        })
    }

    /// Name servers and options for `dns_config`, plus whether the system
    /// configuration had to be replaced by defaults
    fn resolver_setup(dns_config: &DnsConfig) -> Result<(ResolverConfig, ResolverOpts, bool)> {
        let (resolver_config, opts, system_fallback) = match dns_config {
            DnsConfig::System => match system_conf::read_system_conf() {
                Ok((config, opts)) => (config, opts, false),
                Err(_) => (ResolverConfig::default(), ResolverOpts::default(), true),
            },
            DnsConfig::Custom { servers } => {
                (Self::custom_config(servers)?, ResolverOpts::default(), false)
            }
        };
        Ok((resolver_config, Self::lookup_opts(opts), system_fallback))
    }

    /// Resolver configuration for explicit name servers, UDP with TCP fallback
    fn custom_config(servers: &[IpAddr]) -> Result<ResolverConfig> {
        if servers.is_empty() {
            return Err(AppError::validation("No DNS servers provided"));
        }

        let mut config = ResolverConfig::new();
        for &server in servers {
            let socket_addr = SocketAddr::new(server, 53);
            config.add_name_server(NameServerConfig::new(socket_addr, Protocol::Udp));
            config.add_name_server(NameServerConfig::new(socket_addr, Protocol::Tcp));
        }
        Ok(config)
    }

    /// Addresses are re-resolved every iteration, so answers are never cached.
    /// A and AAAA are both queried so dual-stack hosts yield every address.
    fn lookup_opts(mut opts: ResolverOpts) -> ResolverOpts {
        opts.cache_size = 0;
        opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
        opts
    }

    /// The configuration this manager was built for
    pub fn config(&self) -> &DnsConfig {
        &self.config
    }

    /// True when the system configuration could not be read and defaults were used
    pub fn is_system_fallback(&self) -> bool {
        self.system_fallback
    }
}

#[async_trait]
impl HostResolver for DnsManager {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>> {
        let response = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| AppError::dns_resolution(format!("DNS lookup failed for {}: {}", host, e)))?;

        Ok(response.iter().collect())
    }
}

/// Classifies targets and resolves host names
#[derive(Clone)]
pub struct Resolver {
    backend: Arc<dyn HostResolver>,
}

impl Resolver {
    pub fn new(backend: Arc<dyn HostResolver>) -> Self {
        Self { backend }
    }

    /// Decide whether `target` is a literal IP or a host name.
    ///
    /// Host names are resolved as part of classification; a failed lookup is
    /// a `DnsResolution` error. Several different addresses for one name is
    /// a normal result.
    pub async fn classify(&self, target: &str) -> Result<TargetKind> {
        let literal = target.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = literal.parse::<IpAddr>() {
            return Ok(TargetKind::LiteralIp(ip));
        }

        let addresses = self.resolve(target).await?;
        Ok(TargetKind::Hostname(addresses))
    }

    /// Resolve a host name to its distinct, well-formed addresses
    pub async fn resolve(&self, hostname: &str) -> Result<Vec<IpAddr>> {
        let addresses = filter_addresses(self.backend.lookup(hostname).await?);

        if addresses.is_empty() {
            return Err(AppError::dns_resolution(format!(
                "No usable IP addresses resolved for {}",
                hostname
            )));
        }

        Ok(addresses)
    }
}

/// Drop duplicate addresses and those whose text is shorter than
/// [`MIN_ADDRESS_LEN`], keeping resolver order
pub fn filter_addresses(addresses: Vec<IpAddr>) -> Vec<IpAddr> {
    let mut kept: Vec<IpAddr> = Vec::with_capacity(addresses.len());
    for address in addresses {
        if address.to_string().len() < MIN_ADDRESS_LEN || kept.contains(&address) {
            continue;
        }
        kept.push(address);
    }
    kept
}
