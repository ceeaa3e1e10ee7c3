//! Reachability Notifier - Main CLI Application
//!
//! Periodically resolves and probes the targets of a semicolon-delimited
//! list and prints one line per probe.

use clap::Parser;
use reachability_notifier::{
    app::App,
    cli::Cli,
    error::{AppError, ErrorReporter},
    PKG_NAME, VERSION,
};
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        eprintln!("Please report this issue together with the command line used.");
        process::exit(99);
    }));

    let cli = Cli::parse();

    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        process::exit(2);
    }

    if cli.debug {
        eprintln!("{} v{}", PKG_NAME, VERSION);
        eprintln!(
            "Built {} for {}",
            env!("BUILD_TIME"),
            env!("TARGET_TRIPLE")
        );
    }

    let reporter = ErrorReporter::new(cli.use_colors(), cli.verbose);

    if let Err(e) = App::new(cli).run().await {
        reporter.report_error(&e);
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Input(_) => {
            eprintln!();
            eprintln!("Target list help:");
            eprintln!("  - Create input.csv in the working directory or pass --input <PATH>");
            eprintln!("  - The first line is a header: target;ports");
            eprintln!("  - Example row: example.com;80,443");
        }
        AppError::Config(_) | AppError::Validation(_) | AppError::Parse(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Check your .env file format (see --env-help)");
            eprintln!("  - Ensure DNS server entries are IP addresses");
            eprintln!("  - Timeouts and concurrency must be positive");
        }
        AppError::DnsResolution(_) => {
            eprintln!();
            eprintln!("DNS resolution help:");
            eprintln!("  - Try public DNS servers with --dns-servers 8.8.8.8,1.1.1.1");
            eprintln!("  - Test DNS resolution manually with 'nslookup' or 'dig'");
        }
        _ => {}
    }
}
