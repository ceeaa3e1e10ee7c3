//! Line-delimited JSON output, one object per event

use super::formatter::OutputFormatter;
use crate::{
    error::{AppError, Result},
    models::{IterationSummary, ProbeResult, Target, TargetReport},
};
use serde_json::json;

#[derive(Debug, Clone, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_banner(&self, title: &str) -> Result<String> {
        Ok(json!({ "event": "start", "name": title, "version": crate::VERSION }).to_string())
    }

    fn format_classification(&self, report: &TargetReport) -> Result<String> {
        Ok(json!({
            "event": "target",
            "target": report.target.raw,
            "ports": report.target.ports,
            "classification": report.kind,
        })
        .to_string())
    }

    fn format_result(&self, result: &ProbeResult) -> Result<String> {
        let mut value = serde_json::to_value(result)?;
        value["event"] = json!("probe");
        Ok(value.to_string())
    }

    fn format_summary(&self, summary: &IterationSummary) -> Result<String> {
        let mut value = serde_json::to_value(summary)?;
        value["event"] = json!("summary");
        value["elapsed_ms"] = json!(summary.elapsed.as_secs_f64() * 1000.0);
        Ok(value.to_string())
    }

    fn format_target_error(&self, target: &Target, error: &AppError) -> Result<String> {
        Ok(json!({
            "event": "error",
            "target": target.raw,
            "category": error.category(),
            "message": error.to_string(),
        })
        .to_string())
    }
}
