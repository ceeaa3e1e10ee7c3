//! Main application orchestration and execution

use crate::{
    cli::Cli,
    config::{display_config_summary, load_config, validate_config, EnvManager, ValidationLevel},
    dns::{DnsManager, Resolver},
    error::{AppError, Result},
    input::load_targets,
    logging::LoggerFactory,
    models::Config,
    monitor::{Monitor, MonitorSettings, TargetChecker},
    output::{OutputFormatterFactory, Reporter},
    probe::NetworkProber,
};
use std::{path::Path, sync::Arc};
use tokio_util::sync::CancellationToken;

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
}

impl App {
    /// Create a new application instance with CLI configuration
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the application until the iteration limit or Ctrl-C
    pub async fn run(self) -> Result<()> {
        if self.cli.is_utility_mode() {
            return Self::run_utility(&self.cli);
        }

        let config = load_config(self.cli.clone())?;
        Self::report_config_warnings(&config)?;

        let monitor = Self::build_monitor(&config).await?;
        let cancel = CancellationToken::new();
        Self::cancel_on_ctrl_c(cancel.clone());

        monitor.run(cancel).await?;
        Ok(())
    }

    /// Print environment help or write the example `.env` file
    fn run_utility(cli: &Cli) -> Result<()> {
        if let Some(ref path) = cli.write_env_example {
            EnvManager::save_example_env_file(path)?;
            println!("Example configuration written to {}", path.display());
        } else {
            print!("{}", EnvManager::display_env_help());
        }
        Ok(())
    }

    /// Invalid values in `env_file` and in the process environment
    fn environment_warnings(env_file: &Path) -> Result<Vec<String>> {
        let mut warnings = EnvManager::check_env_file(env_file)?.unwrap_or_default();
        warnings.extend(EnvManager::validate_current_env());
        Ok(warnings)
    }

    fn report_config_warnings(config: &Config) -> Result<()> {
        if config.debug {
            eprintln!("Configuration Summary:");
            eprintln!("{}", display_config_summary(config));
            eprintln!();
        }

        for warning in validate_config(config)? {
            if warning.level != ValidationLevel::Info || config.verbose {
                eprintln!("{}", warning.format(config.enable_color));
            }
        }

        if config.verbose {
            for warning in Self::environment_warnings(Path::new(".env"))? {
                eprintln!("{}", warning);
            }
        }
        Ok(())
    }

    /// Wire resolver, prober, reporter and loggers into a monitor
    pub async fn build_monitor(config: &Config) -> Result<Monitor> {
        let loggers = LoggerFactory::new(config.clone());
        let app_logger = loggers.create_logger("app").await;

        let targets = load_targets(&config.input_file)?;
        if targets.is_empty() {
            return Err(AppError::input(format!(
                "no targets found in '{}'",
                config.input_file.display()
            )));
        }

        let dns_config = config.dns_config()?;
        let dns_manager = DnsManager::new(&dns_config)?;
        if dns_manager.is_system_fallback() {
            app_logger
                .warn("System resolver configuration unavailable, using library defaults")
                .log()
                .await;
        }
        let resolver = Resolver::new(Arc::new(dns_manager));
        let prober = Arc::new(NetworkProber::from_config(config)?);

        let checker = TargetChecker::new(
            resolver,
            prober,
            config.probe_policy,
            dns_config.name(),
            Arc::new(loggers.create_network_logger().await),
        );

        let reporter = Arc::new(Reporter::stdout(OutputFormatterFactory::create_formatter(
            config.output_format,
            config.enable_color,
        )));
        reporter.emit_banner(&format!("Reachability Notifier v{}", crate::VERSION))?;

        app_logger
            .info("Monitoring started")
            .field("targets", targets.len())
            .field("policy", config.probe_policy.to_string())
            .field("dns", dns_config.name())
            .log()
            .await;

        Ok(Monitor::new(
            targets,
            checker,
            reporter,
            MonitorSettings::from_config(config),
            Arc::new(loggers.create_error_logger().await),
            loggers.create_monitor_logger().await,
        ))
    }

    /// Cancel `token` on the first interrupt signal
    fn cancel_on_ctrl_c(token: CancellationToken) {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        });
    }
}
