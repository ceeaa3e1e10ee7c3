//! Core formatting traits and the plain text implementation
//!
//! A result line has six `" | "`-separated columns: timestamp, configured
//! target name (20 wide), address (15 wide), latency with `ms` (7 wide),
//! port (4 wide) and status. Columns are centered and never truncated.

use crate::{
    error::{AppError, Result},
    models::{IterationSummary, ProbeResult, Target, TargetKind, TargetReport},
    types::ProbeStatus,
};
use chrono::{DateTime, Local};
use std::fmt::Write as _;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f%:z";
pub const NAME_WIDTH: usize = 20;
pub const ADDRESS_WIDTH: usize = 15;
pub const LATENCY_WIDTH: usize = 7;
pub const PORT_WIDTH: usize = 4;
pub const BANNER_WIDTH: usize = 40;

const SEPARATOR: &str = " | ";

/// Main trait for output formatting
pub trait OutputFormatter: Send + Sync {
    /// Format a start-up title banner
    fn format_banner(&self, title: &str) -> Result<String>;

    /// Format the line describing how a target was classified
    fn format_classification(&self, report: &TargetReport) -> Result<String>;

    /// Format a single probe result
    fn format_result(&self, result: &ProbeResult) -> Result<String>;

    /// Format the end-of-iteration summary
    fn format_summary(&self, summary: &IterationSummary) -> Result<String>;

    /// Format a target that could not be checked
    fn format_target_error(&self, target: &Target, error: &AppError) -> Result<String>;

    /// Format everything one target produced as a single block
    fn format_report(&self, report: &TargetReport) -> Result<String> {
        let mut block = self.format_classification(report)?;
        block.push('\n');
        for result in &report.results {
            block.push_str(&self.format_result(result)?);
            block.push('\n');
        }
        Ok(block)
    }
}

/// Center `text` in `width` columns, extra padding on the right.
/// Longer text is kept whole.
pub fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }

    let padding = width - len;
    let left_pad = padding / 2;
    let right_pad = padding - left_pad;
    format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(right_pad))
}

/// Render the latency column value
pub fn format_latency(latency_ms: f64) -> String {
    format!("{:.2}", latency_ms)
}

/// Render one result as an uncolored report line
pub fn format_line(result: &ProbeResult) -> String {
    [
        result.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        center(&result.displayed_name, NAME_WIDTH),
        center(&result.address, ADDRESS_WIDTH),
        format!("{} ms", center(&format_latency(result.latency_ms), LATENCY_WIDTH)),
        center(&result.port.to_string(), PORT_WIDTH),
        result.status.to_string(),
    ]
    .join(SEPARATOR)
}

/// The fields a report line carries
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub timestamp: DateTime<Local>,
    pub displayed_name: String,
    pub address: String,
    pub latency_ms: f64,
    pub port: i32,
    pub status: ProbeStatus,
}

impl From<&ProbeResult> for ReportLine {
    fn from(result: &ProbeResult) -> Self {
        Self {
            timestamp: result.timestamp,
            displayed_name: result.displayed_name.clone(),
            address: result.address.clone(),
            latency_ms: result.latency_ms,
            port: result.port,
            status: result.status,
        }
    }
}

/// Parse a line produced by [`format_line`] back into its fields
pub fn parse_line(line: &str) -> Result<ReportLine> {
    let fields: Vec<&str> = line.trim_end().split(SEPARATOR).map(str::trim).collect();
    if fields.len() != 6 {
        return Err(AppError::parse(format!(
            "Expected 6 columns in report line, found {}",
            fields.len()
        )));
    }

    let timestamp = DateTime::parse_from_str(fields[0], TIMESTAMP_FORMAT)
        .map_err(|e| AppError::parse(format!("Invalid timestamp '{}': {}", fields[0], e)))?
        .with_timezone(&Local);

    let latency = fields[3]
        .strip_suffix("ms")
        .map(str::trim)
        .ok_or_else(|| AppError::parse(format!("Latency column missing unit: '{}'", fields[3])))?;

    Ok(ReportLine {
        timestamp,
        displayed_name: fields[1].to_string(),
        address: fields[2].to_string(),
        latency_ms: latency
            .parse()
            .map_err(|e| AppError::parse(format!("Invalid latency '{}': {}", latency, e)))?,
        port: fields[4].parse()?,
        status: fields[5].parse()?,
    })
}

/// Classification text shared by the plain and colored formatters
pub(crate) fn describe_classification(report: &TargetReport) -> String {
    let ports = if report.target.ports.is_empty() {
        "no ports".to_string()
    } else {
        let ports: Vec<String> = report.target.ports.iter().map(u16::to_string).collect();
        format!("ports [{}]", ports.join(", "))
    };

    match &report.kind {
        TargetKind::LiteralIp(ip) => format!("{} (ip address {}, {})", report.target.raw, ip, ports),
        TargetKind::Hostname(addresses) => {
            let addresses: Vec<String> = addresses.iter().map(|a| a.to_string()).collect();
            format!(
                "{} (host name -> [{}], {})",
                report.target.raw,
                addresses.join(", "),
                ports
            )
        }
    }
}

/// Plain text formatter
#[derive(Debug, Clone, Default)]
pub struct PlainFormatter;

impl PlainFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_banner(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "-".repeat(BANNER_WIDTH);

        writeln!(output, "{}", border)
            .map_err(|e| AppError::io(format!("Failed to format banner: {}", e)))?;
        writeln!(output, "{}", center(title, BANNER_WIDTH))
            .map_err(|e| AppError::io(format!("Failed to format banner: {}", e)))?;
        write!(output, "{}", border)
            .map_err(|e| AppError::io(format!("Failed to format banner: {}", e)))?;

        Ok(output)
    }

    fn format_classification(&self, report: &TargetReport) -> Result<String> {
        Ok(describe_classification(report))
    }

    fn format_result(&self, result: &ProbeResult) -> Result<String> {
        Ok(format_line(result))
    }

    fn format_summary(&self, summary: &IterationSummary) -> Result<String> {
        Ok(format!(
            "{}\nIteration {}: {} targets checked, {} failed, {} probes ({} opened, {} closed, {} unknown, {} timed out) in {:.2}s",
            "-".repeat(BANNER_WIDTH),
            summary.iteration,
            summary.targets_checked,
            summary.targets_failed,
            summary.probes,
            summary.opened,
            summary.closed,
            summary.unknown,
            summary.timed_out,
            summary.elapsed.as_secs_f64(),
        ))
    }

    fn format_target_error(&self, target: &Target, error: &AppError) -> Result<String> {
        Ok(format!("ERROR: {}: {}", target.raw, error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProbeMethod;
    use chrono::{FixedOffset, TimeZone};
    use std::{net::IpAddr, time::Duration};

    fn result(name: &str, address: &str, ms: u64, port: Option<u16>, status: ProbeStatus) -> ProbeResult {
        ProbeResult::new(
            name,
            address.parse::<IpAddr>().unwrap(),
            Duration::from_micros(ms),
            port,
            status,
            ProbeMethod::Http,
        )
    }

    #[test]
    fn test_center_matches_column_widths() {
        assert_eq!(center("80", 4), " 80 ");
        assert_eq!(center("443", 4), "443 ");
        assert_eq!(center("-1", 4), " -1 ");
        assert_eq!(center("example.com", 20), "    example.com     ");
        assert_eq!(center("a-very-long-host-name.example", 20), "a-very-long-host-name.example");
    }

    #[test]
    fn test_format_line_layout() {
        let line = format_line(&result("example.com", "93.184.216.34", 12_345, Some(80), ProbeStatus::Opened));
        let columns: Vec<&str> = line.split(" | ").collect();

        assert_eq!(columns.len(), 6);
        assert_eq!(columns[1], "    example.com     ");
        assert_eq!(columns[2], " 93.184.216.34 ");
        assert_eq!(columns[3], " 12.35  ms");
        assert_eq!(columns[4], " 80 ");
        assert_eq!(columns[5], "Opened");
    }

    #[test]
    fn test_parse_line_recovers_fields() {
        let cases = vec![
            result("example.com", "93.184.216.34", 12_345, Some(443), ProbeStatus::Opened),
            result("10.0.0.5", "10.0.0.5", 0, None, ProbeStatus::Unknown),
            result("ipv6.example", "2001:db8::1", 2_000_000, Some(8080), ProbeStatus::TimedOut),
            result("a-very-long-host-name.example", "10.1.2.3", 999, Some(22), ProbeStatus::Closed),
        ];

        for original in &cases {
            let parsed = parse_line(&format_line(original)).unwrap();
            assert_eq!(parsed, ReportLine::from(original));
        }
    }

    #[test]
    fn test_parse_line_rejects_garbage() {
        assert!(parse_line("not a report line").is_err());
        assert!(parse_line("2024-01-01 00:00:00.000000+00:00 | a | b | 1 | 80 | Opened").is_err());
        assert!(parse_line("2024-01-01 00:00:00.000000+00:00 | a | 10.0.0.1 | 1.00 ms | 80 | Maybe").is_err());
        assert!(parse_line("2024-01-01 00:00:00.000000 | a | 10.0.0.1 | 1.00 ms | 80 | Opened").is_err());
    }

    #[test]
    fn test_timestamp_keeps_its_offset() {
        // 01:30 happens twice on 2024-11-03 in US zones; the offset tells them apart
        let first = FixedOffset::west_opt(4 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 11, 3, 1, 30, 0)
            .unwrap();
        let second = FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 11, 3, 1, 30, 0)
            .unwrap();

        for instant in [first, second] {
            let mut original = result("example.com", "10.0.0.1", 1_000, Some(80), ProbeStatus::Opened);
            original.timestamp = instant.with_timezone(&Local);
            let parsed = parse_line(&format_line(&original)).unwrap();
            assert_eq!(parsed.timestamp, instant);
        }

        let line = "2024-11-03 01:30:00.000000-05:00 | a | 10.0.0.1 | 1.00 ms | 80 | Opened";
        let parsed = parse_line(line).unwrap();
        assert_eq!(parsed.timestamp, second);
        assert_eq!(parsed.timestamp.timestamp() - first.timestamp(), 3600);
    }

    #[test]
    fn test_classification_text() {
        let ip: IpAddr = "10.0.0.5".parse().unwrap();
        let report = TargetReport::new(Target::new("10.0.0.5", vec![]), TargetKind::LiteralIp(ip));
        assert_eq!(
            PlainFormatter::new().format_classification(&report).unwrap(),
            "10.0.0.5 (ip address 10.0.0.5, no ports)"
        );

        let report = TargetReport::new(
            Target::new("example.com", vec![80, 443]),
            TargetKind::Hostname(vec!["93.184.216.34".parse().unwrap()]),
        );
        assert_eq!(
            describe_classification(&report),
            "example.com (host name -> [93.184.216.34], ports [80, 443])"
        );
    }

    #[test]
    fn test_format_report_block() {
        let ip: IpAddr = "10.0.0.5".parse().unwrap();
        let mut report = TargetReport::new(Target::new("10.0.0.5", vec![80]), TargetKind::LiteralIp(ip));
        report.results.push(result("10.0.0.5", "10.0.0.5", 1_000, Some(80), ProbeStatus::Opened));

        let block = PlainFormatter::new().format_report(&report).unwrap();
        assert_eq!(block.lines().count(), 2);
        assert!(block.ends_with("Opened\n"));
    }

    #[test]
    fn test_banner() {
        let banner = PlainFormatter::new().format_banner("Reachability Notifier").unwrap();
        let lines: Vec<&str> = banner.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), BANNER_WIDTH);
        assert_eq!(lines[1].trim(), "Reachability Notifier");
    }
}
