//! Colored formatter implementation with terminal color support
//!
//! Same column layout as the plain formatter; the status column and the
//! latency are colored, banners and classification lines are highlighted.

use super::formatter::{
    center, describe_classification, format_latency, OutputFormatter, ADDRESS_WIDTH, BANNER_WIDTH,
    LATENCY_WIDTH, NAME_WIDTH, PORT_WIDTH, TIMESTAMP_FORMAT,
};
use crate::{
    error::{AppError, Result},
    models::{IterationSummary, ProbeResult, Target, TargetReport},
    types::ProbeStatus,
};
use colored::*;
use std::fmt::Write as _;

/// Latency classification for color coding
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LatencyLevel {
    Fast,     // < 50ms
    Moderate, // 50-300ms
    Slow,     // >= 300ms
}

impl LatencyLevel {
    pub fn from_latency(latency_ms: f64) -> Self {
        if latency_ms < 50.0 {
            Self::Fast
        } else if latency_ms < 300.0 {
            Self::Moderate
        } else {
            Self::Slow
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Fast => Color::Green,
            Self::Moderate => Color::Yellow,
            Self::Slow => Color::Red,
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub opened: Color,
    pub closed: Color,
    pub unknown: Color,
    pub timed_out: Color,
    pub muted: Color,
    pub border: Color,
}

impl ColorScheme {
    pub fn status_color(&self, status: ProbeStatus) -> Color {
        match status {
            ProbeStatus::Opened => self.opened,
            ProbeStatus::Closed => self.closed,
            ProbeStatus::Unknown => self.unknown,
            ProbeStatus::TimedOut => self.timed_out,
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            opened: Color::Green,
            closed: Color::Yellow,
            unknown: Color::Red,
            timed_out: Color::Magenta,
            muted: Color::BrightBlack,
            border: Color::BrightBlack,
        }
    }
}

/// Colored formatter implementation
#[derive(Debug, Clone)]
pub struct ColoredFormatter {
    enable_color: bool,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    pub fn new(enable_color: bool) -> Self {
        Self {
            enable_color,
            color_scheme: ColorScheme::default(),
        }
    }

    pub fn with_color_scheme(mut self, color_scheme: ColorScheme) -> Self {
        self.color_scheme = color_scheme;
        self
    }

    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn bold(&self, text: &str) -> ColoredString {
        if self.enable_color {
            text.bold()
        } else {
            text.normal()
        }
    }

    fn emphasize(&self, text: &str, color: Color) -> ColoredString {
        if self.enable_color {
            text.bold().color(color)
        } else {
            text.normal()
        }
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_banner(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "-".repeat(BANNER_WIDTH);

        writeln!(output, "{}", self.colorize(&border, self.color_scheme.border))
            .map_err(|e| AppError::io(format!("Failed to format banner: {}", e)))?;
        writeln!(output, "{}", self.emphasize(&center(title, BANNER_WIDTH), self.color_scheme.header))
            .map_err(|e| AppError::io(format!("Failed to format banner: {}", e)))?;
        write!(output, "{}", self.colorize(&border, self.color_scheme.border))
            .map_err(|e| AppError::io(format!("Failed to format banner: {}", e)))?;

        Ok(output)
    }

    fn format_classification(&self, report: &TargetReport) -> Result<String> {
        Ok(self.bold(&describe_classification(report)).to_string())
    }

    fn format_result(&self, result: &ProbeResult) -> Result<String> {
        let latency = center(&format_latency(result.latency_ms), LATENCY_WIDTH);
        let latency_color = LatencyLevel::from_latency(result.latency_ms).color();
        let status = result.status.to_string();

        Ok(format!(
            "{} | {} | {} | {} ms | {} | {}",
            self.colorize(&result.timestamp.format(TIMESTAMP_FORMAT).to_string(), self.color_scheme.muted),
            center(&result.displayed_name, NAME_WIDTH),
            center(&result.address, ADDRESS_WIDTH),
            self.colorize(&latency, latency_color),
            center(&result.port.to_string(), PORT_WIDTH),
            self.emphasize(&status, self.color_scheme.status_color(result.status)),
        ))
    }

    fn format_summary(&self, summary: &IterationSummary) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "{}", self.colorize(&"-".repeat(BANNER_WIDTH), self.color_scheme.border))
            .map_err(|e| AppError::io(format!("Failed to format summary: {}", e)))?;
        write!(
            output,
            "{} {}: {} targets checked, {} failed, {} probes ({} {}, {} {}, {} {}, {} {}) in {:.2}s",
            self.bold("Iteration"),
            summary.iteration,
            summary.targets_checked,
            summary.targets_failed,
            summary.probes,
            summary.opened,
            self.colorize("opened", self.color_scheme.opened),
            summary.closed,
            self.colorize("closed", self.color_scheme.closed),
            summary.unknown,
            self.colorize("unknown", self.color_scheme.unknown),
            summary.timed_out,
            self.colorize("timed out", self.color_scheme.timed_out),
            summary.elapsed.as_secs_f64(),
        )
        .map_err(|e| AppError::io(format!("Failed to format summary: {}", e)))?;
        Ok(output)
    }

    fn format_target_error(&self, target: &Target, error: &AppError) -> Result<String> {
        Ok(format!(
            "{} {}: {}",
            self.emphasize("ERROR", self.color_scheme.unknown),
            target.raw,
            self.colorize(&error.to_string(), self.color_scheme.unknown)
        ))
    }
}
