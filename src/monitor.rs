//! The run loop: classify, probe and report every target, iteration after
//! iteration, until cancelled or the iteration limit is reached.

use crate::{
    dns::Resolver,
    error::{AppError, Result},
    logging::{ErrorEventLogger, MonitorLogger, NetworkLogger},
    models::{Config, IterationSummary, ProbeResult, Target, TargetKind, TargetReport},
    output::Reporter,
    probe::{http_only_outcome, icmp_outcome, port_probe_outcome, Prober},
    types::{ProbeMethod, ProbePolicy},
};
use std::{
    net::IpAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;

/// Checks one target: classification, probes and their outcomes
#[derive(Clone)]
pub struct TargetChecker {
    resolver: Resolver,
    prober: Arc<dyn Prober>,
    policy: ProbePolicy,
    dns_label: String,
    network_logger: Arc<NetworkLogger>,
}

impl TargetChecker {
    pub fn new(
        resolver: Resolver,
        prober: Arc<dyn Prober>,
        policy: ProbePolicy,
        dns_label: impl Into<String>,
        network_logger: Arc<NetworkLogger>,
    ) -> Self {
        Self {
            resolver,
            prober,
            policy,
            dns_label: dns_label.into(),
            network_logger,
        }
    }

    /// Classify `target` and run the probes its policy calls for.
    ///
    /// Malformed targets fail with an input error and unresolvable names
    /// with a resolution error; probe failures never fail the target.
    pub async fn check_target(&self, target: &Target) -> Result<TargetReport> {
        target.validate()?;

        let kind = self.classify(target).await?;
        let addresses = kind.addresses();
        let host = match &kind {
            TargetKind::LiteralIp(ip) => ip.to_string(),
            TargetKind::Hostname(_) => target.raw.clone(),
        };

        let mut report = TargetReport::new(target.clone(), kind);

        match (self.policy, target.has_ports()) {
            (ProbePolicy::Icmp, _) | (ProbePolicy::Standard, false) => {
                for &address in &addresses {
                    report.results.push(self.icmp_probe(target, address).await);
                }
            }
            (ProbePolicy::Standard, true) => {
                for &port in &target.ports {
                    for &address in &addresses {
                        report.results.push(self.port_probe(target, &host, address, port).await);
                    }
                }
            }
            (ProbePolicy::Http, true) => {
                for &port in &target.ports {
                    for &address in &addresses {
                        report.results.push(self.http_probe(target, &host, address, Some(port)).await);
                    }
                }
            }
            (ProbePolicy::Http, false) => {
                for &address in &addresses {
                    report.results.push(self.http_probe(target, &host, address, None).await);
                }
            }
        }

        for result in &report.results {
            self.network_logger.log_probe(result).await;
        }

        Ok(report)
    }

    async fn classify(&self, target: &Target) -> Result<TargetKind> {
        let start = Instant::now();
        let classified = self.resolver.classify(&target.raw).await;
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        match &classified {
            Ok(TargetKind::Hostname(addresses)) => {
                self.network_logger
                    .log_dns_resolution(&target.raw, &self.dns_label, addresses, duration_ms)
                    .await;
            }
            Ok(TargetKind::LiteralIp(_)) => {}
            Err(_) => {
                self.network_logger
                    .log_dns_resolution(&target.raw, &self.dns_label, &[], duration_ms)
                    .await;
            }
        }

        classified
    }

    async fn port_probe(&self, target: &Target, host: &str, address: IpAddr, port: u16) -> ProbeResult {
        let (tcp, http) = tokio::join!(
            self.prober.tcp_connect(address, port),
            self.prober.http_get(host, address, Some(port)),
        );

        if let Err(e) = &http {
            self.network_logger.log_probe_error("http", &address.to_string(), e).await;
        }

        let (status, latency, method) = port_probe_outcome(&tcp, &http, self.prober.http_timeout());
        ProbeResult::new(&target.raw, address, latency, Some(port), status, method)
    }

    async fn http_probe(&self, target: &Target, host: &str, address: IpAddr, port: Option<u16>) -> ProbeResult {
        let http = self.prober.http_get(host, address, port).await;
        if let Err(e) = &http {
            self.network_logger.log_probe_error("http", &address.to_string(), e).await;
        }

        let (status, latency) = http_only_outcome(&http, self.prober.http_timeout());
        ProbeResult::new(&target.raw, address, latency, port, status, ProbeMethod::Http)
    }

    async fn icmp_probe(&self, target: &Target, address: IpAddr) -> ProbeResult {
        let reply = self.prober.icmp_ping(address).await;
        if let Err(e) = &reply {
            self.network_logger.log_probe_error("icmp", &address.to_string(), e).await;
        }

        let (status, latency) = icmp_outcome(&reply);
        ProbeResult::new(&target.raw, address, latency, None, status, ProbeMethod::Icmp)
    }
}

/// Loop pacing and parallelism
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    /// Targets checked at the same time
    pub concurrency: usize,
    /// Pause between iterations
    pub interval: Duration,
    /// Iterations to run, 0 for no limit
    pub iterations: u64,
}

impl MonitorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            interval: config.interval(),
            iterations: config.iterations,
        }
    }
}

/// Repeatedly checks all targets and reports the results
pub struct Monitor {
    targets: Vec<Target>,
    checker: TargetChecker,
    reporter: Arc<Reporter>,
    settings: MonitorSettings,
    error_logger: Arc<ErrorEventLogger>,
    monitor_logger: MonitorLogger,
}

impl Monitor {
    pub fn new(
        targets: Vec<Target>,
        checker: TargetChecker,
        reporter: Arc<Reporter>,
        settings: MonitorSettings,
        error_logger: Arc<ErrorEventLogger>,
        monitor_logger: MonitorLogger,
    ) -> Self {
        Self {
            targets,
            checker,
            reporter,
            settings,
            error_logger,
            monitor_logger,
        }
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Run iterations until `cancel` fires or the iteration limit is hit.
    /// Returns the number of iterations started.
    pub async fn run(&self, cancel: CancellationToken) -> Result<u64> {
        let mut iteration = 0;

        while !cancel.is_cancelled() {
            iteration += 1;
            let summary = self.run_iteration(iteration, &cancel).await?;
            self.reporter.emit_summary(&summary)?;

            if self.settings.iterations != 0 && iteration >= self.settings.iterations {
                break;
            }

            if self.settings.interval.is_zero() {
                tokio::task::yield_now().await;
                continue;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
        }

        Ok(iteration)
    }

    /// One pass over all targets. Targets not yet started when `cancel`
    /// fires are skipped; started ones finish within their probe timeouts.
    pub async fn run_iteration(&self, iteration: u64, cancel: &CancellationToken) -> Result<IterationSummary> {
        let start = Instant::now();
        let correlation_id = self.monitor_logger.iteration_started(iteration, self.targets.len()).await;
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency));
        let mut tasks = JoinSet::new();

        for target in &self.targets {
            let permit = tokio::select! {
                _ = cancel.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => permit
                    .map_err(|e| AppError::internal(format!("Concurrency limiter closed: {}", e)))?,
            };

            let checker = self.checker.clone();
            let reporter = self.reporter.clone();
            let error_logger = self.error_logger.clone();
            let correlation_id = correlation_id.clone();
            let target = target.clone();

            tasks.spawn(async move {
                let _permit = permit;
                let outcome = checker.check_target(&target).await;
                let emitted = match &outcome {
                    Ok(report) => reporter.emit_report(report),
                    Err(e) => {
                        error_logger.log_skipped_target(&target, e, &correlation_id).await;
                        reporter.emit_target_error(&target, e)
                    }
                };
                (outcome, emitted)
            });
        }

        let mut summary = IterationSummary::new(iteration);
        let mut first_output_error = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((outcome, emitted)) => {
                    match outcome {
                        Ok(report) => summary.record_report(&report),
                        Err(_) => summary.record_failure(),
                    }
                    if let Err(e) = emitted {
                        first_output_error.get_or_insert(e);
                    }
                }
                Err(e) => {
                    summary.record_failure();
                    let error = AppError::internal(format!("Target check task failed: {}", e));
                    self.error_logger.log_error(&error, Some("run loop"), Some(&correlation_id)).await;
                }
            }
        }

        if let Some(e) = first_output_error {
            return Err(e);
        }

        summary.elapsed = start.elapsed();
        self.monitor_logger.iteration_finished(&summary, &correlation_id).await;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::tests::StaticResolver;
    use crate::output::{tests::SharedBuffer, OutputFormatterFactory};
    use crate::probe::{HttpOutcome, PingReply, TcpOutcome};
    use crate::types::ProbeStatus;
    use async_trait::async_trait;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Tcp(IpAddr, u16),
        Http(String, IpAddr, Option<u16>),
        Icmp(IpAddr),
    }

    struct MockProber {
        calls: Mutex<Vec<Call>>,
        open_ports: Vec<u16>,
        /// Open ports whose listener does not speak HTTP
        raw_ports: Vec<u16>,
        icmp_ok: bool,
    }

    impl MockProber {
        fn new(open_ports: &[u16], icmp_ok: bool) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                open_ports: open_ports.to_vec(),
                raw_ports: Vec::new(),
                icmp_ok,
            }
        }

        fn with_raw_ports(mut self, ports: &[u16]) -> Self {
            self.raw_ports = ports.to_vec();
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Prober for MockProber {
        async fn tcp_connect(&self, address: IpAddr, port: u16) -> TcpOutcome {
            self.calls.lock().unwrap().push(Call::Tcp(address, port));
            let status = if self.open_ports.contains(&port) { ProbeStatus::Opened } else { ProbeStatus::Closed };
            TcpOutcome { status, latency: Duration::from_millis(1) }
        }

        async fn http_get(&self, host: &str, address: IpAddr, port: Option<u16>) -> Result<HttpOutcome> {
            self.calls.lock().unwrap().push(Call::Http(host.to_string(), address, port));
            match port {
                Some(p) if !self.open_ports.contains(&p) => Err(AppError::http_request("connection refused")),
                Some(p) if self.raw_ports.contains(&p) => Err(AppError::http_request("invalid HTTP response")),
                _ => Ok(HttpOutcome { latency: Duration::from_millis(20), status_code: 200 }),
            }
        }

        async fn icmp_ping(&self, address: IpAddr) -> Result<PingReply> {
            self.calls.lock().unwrap().push(Call::Icmp(address));
            if self.icmp_ok {
                Ok(PingReply { name: None, rtt: Duration::from_millis(12) })
            } else {
                Err(AppError::ping("100% packet loss"))
            }
        }

        fn http_timeout(&self) -> Duration {
            Duration::from_secs(2)
        }
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn checker(resolver: Arc<StaticResolver>, prober: Arc<MockProber>, policy: ProbePolicy) -> TargetChecker {
        let config = Config::default();
        TargetChecker::new(
            Resolver::new(resolver),
            prober,
            policy,
            "system",
            Arc::new(NetworkLogger::new(&config)),
        )
    }

    fn monitor(targets: Vec<Target>, checker: TargetChecker, settings: MonitorSettings) -> (Monitor, SharedBuffer) {
        let config = Config::default();
        let buffer = SharedBuffer::default();
        let reporter = Arc::new(Reporter::new(
            OutputFormatterFactory::create_plain_formatter(),
            Box::new(buffer.clone()),
        ));
        let monitor = Monitor::new(
            targets,
            checker,
            reporter,
            settings,
            Arc::new(ErrorEventLogger::new(&config)),
            MonitorLogger::new(&config),
        );
        (monitor, buffer)
    }

    fn settings(iterations: u64) -> MonitorSettings {
        MonitorSettings { concurrency: 4, interval: Duration::ZERO, iterations }
    }

    #[tokio::test]
    async fn test_literal_ip_without_ports_pings_once() {
        let resolver = Arc::new(StaticResolver::new(&[]));
        let prober = Arc::new(MockProber::new(&[], false));
        let checker = checker(resolver.clone(), prober.clone(), ProbePolicy::Standard);

        let report = checker.check_target(&Target::new("10.0.0.5", vec![])).await.unwrap();

        assert_eq!(prober.calls(), vec![Call::Icmp(ip("10.0.0.5"))]);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].status, ProbeStatus::Unknown);
        assert_eq!(report.results[0].latency_ms, 0.0);
        assert_eq!(report.results[0].port, -1);
    }

    #[tokio::test]
    async fn test_hostname_with_ports_probes_ports_outer_addresses_inner() {
        let resolver = Arc::new(StaticResolver::new(&[("example.com", &["10.0.0.1", "10.0.0.2"])]));
        let prober = Arc::new(MockProber::new(&[80, 443], true));
        let checker = checker(resolver.clone(), prober.clone(), ProbePolicy::Standard);

        let report = checker
            .check_target(&Target::new("example.com", vec![80, 443]))
            .await
            .unwrap();

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
        let order: Vec<(String, i32)> = report.results.iter().map(|r| (r.address.clone(), r.port)).collect();
        assert_eq!(
            order,
            vec![
                ("10.0.0.1".to_string(), 80),
                ("10.0.0.2".to_string(), 80),
                ("10.0.0.1".to_string(), 443),
                ("10.0.0.2".to_string(), 443),
            ]
        );

        let calls = prober.calls();
        assert_eq!(calls.iter().filter(|c| matches!(c, Call::Tcp(..))).count(), 4);
        assert_eq!(calls.iter().filter(|c| matches!(c, Call::Http(..))).count(), 4);
        assert!(calls.iter().all(|c| !matches!(c, Call::Icmp(_))));
        assert!(calls.contains(&Call::Http("example.com".to_string(), ip("10.0.0.2"), Some(443))));
        assert!(report.results.iter().all(|r| r.displayed_name == "example.com"));
        assert!(report.results.iter().all(|r| r.status == ProbeStatus::Opened));
    }

    #[tokio::test]
    async fn test_closed_port_reports_unknown() {
        let resolver = Arc::new(StaticResolver::new(&[]));
        let prober = Arc::new(MockProber::new(&[80], true));
        let checker = checker(resolver, prober, ProbePolicy::Standard);

        let report = checker.check_target(&Target::new("10.0.0.5", vec![80, 81])).await.unwrap();
        assert_eq!(report.results[0].status, ProbeStatus::Opened);
        assert_eq!(report.results[0].latency_ms, 20.0);
        assert_eq!(report.results[1].status, ProbeStatus::Unknown);
        assert_eq!(report.results[1].latency_ms, 2000.0);
    }

    #[tokio::test]
    async fn test_open_port_without_http_reports_tcp_figures() {
        let resolver = Arc::new(StaticResolver::new(&[]));
        let prober = Arc::new(MockProber::new(&[22, 80], true).with_raw_ports(&[22]));
        let checker = checker(resolver, prober, ProbePolicy::Standard);

        let report = checker.check_target(&Target::new("10.0.0.5", vec![22, 80])).await.unwrap();
        assert_eq!(report.results[0].status, ProbeStatus::Opened);
        assert_eq!(report.results[0].latency_ms, 1.0);
        assert_eq!(report.results[0].method, ProbeMethod::Tcp);
        assert_eq!(report.results[1].latency_ms, 20.0);
        assert_eq!(report.results[1].method, ProbeMethod::Http);
    }

    #[tokio::test]
    async fn test_repeated_port_is_checked_every_time() {
        let resolver = Arc::new(StaticResolver::new(&[("example.com", &["10.0.0.1", "10.0.0.2"])]));
        let prober = Arc::new(MockProber::new(&[80], true));
        let checker = checker(resolver, prober.clone(), ProbePolicy::Standard);

        let target = Target::from_fields("example.com", Some("80,80")).unwrap();
        let report = checker.check_target(&target).await.unwrap();

        assert_eq!(report.results.len(), 4);
        assert!(report.results.iter().all(|r| r.port == 80));
        assert_eq!(prober.calls().iter().filter(|c| matches!(c, Call::Tcp(..))).count(), 4);
    }

    #[tokio::test]
    async fn test_hostname_without_ports_pings_each_address() {
        let resolver = Arc::new(StaticResolver::new(&[("example.com", &["10.0.0.1", "10.0.0.2"])]));
        let prober = Arc::new(MockProber::new(&[], true));
        let checker = checker(resolver, prober.clone(), ProbePolicy::Standard);

        let report = checker.check_target(&Target::new("example.com", vec![])).await.unwrap();
        assert_eq!(prober.calls(), vec![Call::Icmp(ip("10.0.0.1")), Call::Icmp(ip("10.0.0.2"))]);
        assert!(report.results.iter().all(|r| r.status == ProbeStatus::Opened && r.latency_ms == 12.0));
    }

    #[tokio::test]
    async fn test_icmp_policy_ignores_ports() {
        let resolver = Arc::new(StaticResolver::new(&[]));
        let prober = Arc::new(MockProber::new(&[80], true));
        let checker = checker(resolver, prober.clone(), ProbePolicy::Icmp);

        let report = checker.check_target(&Target::new("10.0.0.5", vec![80, 443])).await.unwrap();
        assert_eq!(prober.calls(), vec![Call::Icmp(ip("10.0.0.5"))]);
        assert_eq!(report.results[0].port, -1);
        assert_eq!(report.results[0].method, ProbeMethod::Icmp);
    }

    #[tokio::test]
    async fn test_http_policy_without_ports_uses_sentinel() {
        let resolver = Arc::new(StaticResolver::new(&[]));
        let prober = Arc::new(MockProber::new(&[], true));
        let checker = checker(resolver, prober.clone(), ProbePolicy::Http);

        let report = checker.check_target(&Target::new("10.0.0.5", vec![])).await.unwrap();
        assert_eq!(prober.calls(), vec![Call::Http("10.0.0.5".to_string(), ip("10.0.0.5"), None)]);
        assert_eq!(report.results[0].port, -1);
        assert_eq!(report.results[0].status, ProbeStatus::Opened);
    }

    #[tokio::test]
    async fn test_malformed_target_is_input_error_without_lookup() {
        let resolver = Arc::new(StaticResolver::new(&[]));
        let prober = Arc::new(MockProber::new(&[], true));
        let checker = checker(resolver.clone(), prober.clone(), ProbePolicy::Standard);

        let err = checker.check_target(&Target::new("not a host!", vec![80])).await.unwrap_err();
        assert!(matches!(err, AppError::Input(_)));
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
        assert!(prober.calls().is_empty());
    }

    #[tokio::test]
    async fn test_resolution_failure_does_not_stop_iteration() {
        let resolver = Arc::new(StaticResolver::new(&[("good.example", &["10.0.0.1"])]));
        let prober = Arc::new(MockProber::new(&[], true));
        let targets = vec![
            Target::new("missing.invalid", vec![80]),
            Target::new("good.example", vec![]),
            Target::new("bad host", vec![]),
        ];
        let (monitor, buffer) = monitor(targets, checker(resolver, prober.clone(), ProbePolicy::Standard), settings(1));

        let summary = monitor.run_iteration(1, &CancellationToken::new()).await.unwrap();
        assert_eq!(summary.targets_checked, 1);
        assert_eq!(summary.targets_failed, 2);
        assert_eq!(summary.opened, 1);
        assert_eq!(prober.calls(), vec![Call::Icmp(ip("10.0.0.1"))]);

        let output = buffer.contents();
        assert!(output.contains("ERROR: missing.invalid"));
        assert!(output.contains("ERROR: bad host"));
        assert!(output.contains("good.example"));
    }

    #[tokio::test]
    async fn test_run_stops_after_iteration_limit() {
        let resolver = Arc::new(StaticResolver::new(&[]));
        let prober = Arc::new(MockProber::new(&[], true));
        let targets = vec![Target::new("10.0.0.5", vec![])];
        let (monitor, buffer) = monitor(targets, checker(resolver, prober.clone(), ProbePolicy::Standard), settings(3));

        let iterations = monitor.run(CancellationToken::new()).await.unwrap();
        assert_eq!(iterations, 3);
        assert_eq!(prober.calls().len(), 3);
        assert_eq!(buffer.contents().matches("Iteration ").count(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_nothing() {
        let resolver = Arc::new(StaticResolver::new(&[]));
        let prober = Arc::new(MockProber::new(&[], true));
        let targets = vec![Target::new("10.0.0.5", vec![])];
        let (monitor, _buffer) = monitor(targets, checker(resolver, prober.clone(), ProbePolicy::Standard), settings(0));

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(monitor.run(cancel).await.unwrap(), 0);
        assert!(prober.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_interrupts_interval_sleep() {
        let resolver = Arc::new(StaticResolver::new(&[]));
        let prober = Arc::new(MockProber::new(&[], true));
        let targets = vec![Target::new("10.0.0.5", vec![])];
        let settings = MonitorSettings { concurrency: 1, interval: Duration::from_secs(3600), iterations: 0 };
        let (monitor, _buffer) = monitor(targets, checker(resolver, prober, ProbePolicy::Standard), settings);

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let iterations = tokio::time::timeout(Duration::from_secs(5), monitor.run(cancel))
            .await
            .expect("run loop ignored cancellation")
            .unwrap();
        assert_eq!(iterations, 1);
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config {
            concurrency: 0,
            interval_seconds: 5,
            iterations: 2,
            ..Default::default()
        };
        let settings = MonitorSettings::from_config(&config);
        assert_eq!(settings.concurrency, 1);
        assert_eq!(settings.interval, Duration::from_secs(5));
        assert_eq!(settings.iterations, 2);
    }
}
