//! Output formatting and the serialized report sink
//!
//! Formatters turn results into text; the [`Reporter`] owns the output
//! sink and writes each target's block under one lock, so concurrent
//! targets interleave only at block granularity.

mod colored;
mod formatter;
mod json;

pub use colored::{ColorScheme, ColoredFormatter, LatencyLevel};
pub use formatter::{
    center, format_line, parse_line, OutputFormatter, PlainFormatter, ReportLine, TIMESTAMP_FORMAT,
};
pub use json::JsonFormatter;

use crate::{
    error::{AppError, Result},
    models::{IterationSummary, Target, TargetReport},
    types::OutputFormat,
};
use std::{
    io::{self, Write},
    sync::Mutex,
};

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter for the output format and color preference
    pub fn create_formatter(format: OutputFormat, enable_color: bool) -> Box<dyn OutputFormatter> {
        match format {
            OutputFormat::Json => Box::new(JsonFormatter::new()),
            OutputFormat::Text if enable_color => Box::new(ColoredFormatter::new(true)),
            OutputFormat::Text => Box::new(PlainFormatter::new()),
        }
    }

    /// Create a plain text formatter for scripts/logs
    pub fn create_plain_formatter() -> Box<dyn OutputFormatter> {
        Self::create_formatter(OutputFormat::Text, false)
    }
}

/// Writes formatted blocks to a shared sink
pub struct Reporter {
    formatter: Box<dyn OutputFormatter>,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Reporter {
    pub fn new(formatter: Box<dyn OutputFormatter>, sink: Box<dyn Write + Send>) -> Self {
        Self {
            formatter,
            sink: Mutex::new(sink),
        }
    }

    /// Reporter writing to standard output
    pub fn stdout(formatter: Box<dyn OutputFormatter>) -> Self {
        Self::new(formatter, Box::new(io::stdout()))
    }

    pub fn formatter(&self) -> &dyn OutputFormatter {
        self.formatter.as_ref()
    }

    /// Emit a title banner
    pub fn emit_banner(&self, title: &str) -> Result<()> {
        let mut block = self.formatter.format_banner(title)?;
        block.push('\n');
        self.write_block(&block)
    }

    /// Emit a target's classification and all its results as one block
    pub fn emit_report(&self, report: &TargetReport) -> Result<()> {
        let block = self.formatter.format_report(report)?;
        self.write_block(&block)
    }

    /// Emit the line for a target that could not be checked
    pub fn emit_target_error(&self, target: &Target, error: &AppError) -> Result<()> {
        let mut block = self.formatter.format_target_error(target, error)?;
        block.push('\n');
        self.write_block(&block)
    }

    /// Emit the end-of-iteration summary
    pub fn emit_summary(&self, summary: &IterationSummary) -> Result<()> {
        let mut block = self.formatter.format_summary(summary)?;
        block.push('\n');
        self.write_block(&block)
    }

    fn write_block(&self, block: &str) -> Result<()> {
        let mut sink = self
            .sink
            .lock()
            .map_err(|_| AppError::internal("Output sink lock poisoned"))?;
        sink.write_all(block.as_bytes())?;
        sink.flush()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{ProbeResult, TargetKind};
    use crate::types::{ProbeMethod, ProbeStatus};
    use std::sync::{Arc, Mutex as StdMutex};
    use std::time::Duration;

    /// In-memory sink shared with the test body
    #[derive(Clone, Default)]
    pub(crate) struct SharedBuffer(pub Arc<StdMutex<Vec<u8>>>);

    impl SharedBuffer {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn report(name: &str, ports: Vec<u16>) -> TargetReport {
        let ip = "10.0.0.5".parse().unwrap();
        let mut report = TargetReport::new(Target::new(name, ports.clone()), TargetKind::LiteralIp(ip));
        for port in ports {
            report.results.push(ProbeResult::new(
                name,
                ip,
                Duration::from_millis(5),
                Some(port),
                ProbeStatus::Opened,
                ProbeMethod::Http,
            ));
        }
        report
    }

    #[test]
    fn test_factory_selects_formatter() {
        let report = report("10.0.0.5", vec![80]);
        let json = OutputFormatterFactory::create_formatter(OutputFormat::Json, true);
        assert!(json.format_classification(&report).unwrap().starts_with('{'));

        let plain = OutputFormatterFactory::create_plain_formatter();
        let line = plain.format_result(&report.results[0]).unwrap();
        assert!(parse_line(&line).is_ok());
    }

    #[test]
    fn test_reporter_writes_report_block() {
        let buffer = SharedBuffer::default();
        let reporter = Reporter::new(OutputFormatterFactory::create_plain_formatter(), Box::new(buffer.clone()));

        reporter.emit_report(&report("10.0.0.5", vec![80, 443])).unwrap();
        let output = buffer.contents();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("10.0.0.5"));
        assert!(lines[1].contains(" 80 "));
        assert!(lines[2].contains("443"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_blocks_do_not_interleave() {
        let buffer = SharedBuffer::default();
        let reporter = Arc::new(Reporter::new(
            OutputFormatterFactory::create_plain_formatter(),
            Box::new(buffer.clone()),
        ));

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..8 {
            let reporter = reporter.clone();
            tasks.spawn(async move {
                let name = format!("target-{}", i);
                reporter.emit_report(&report(&name, vec![80, 81, 82])).unwrap();
            });
        }
        while tasks.join_next().await.is_some() {}

        let output = buffer.contents();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 32);
        for block in lines.chunks(4) {
            let name = block[0].split_whitespace().next().unwrap();
            assert!(block[1..].iter().all(|line| line.contains(name)));
        }
    }

    #[test]
    fn test_reporter_target_error_and_summary() {
        let buffer = SharedBuffer::default();
        let reporter = Reporter::new(OutputFormatterFactory::create_plain_formatter(), Box::new(buffer.clone()));

        reporter
            .emit_target_error(&Target::new("gone.invalid", vec![]), &AppError::dns_resolution("no answer"))
            .unwrap();
        reporter.emit_summary(&IterationSummary::new(1)).unwrap();

        let output = buffer.contents();
        assert!(output.contains("gone.invalid"));
        assert!(output.contains("Iteration 1"));
    }
}
