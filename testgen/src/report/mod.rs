//! Human-readable and JSON reports

use crate::quality::{FixSuggestion, QualityReport, Severity};
use crate::types::{GeneratedSuite, TestSuiteSummary};

/// Renders summaries and audit results
pub struct ReportGenerator;

impl ReportGenerator {
    /// Text summary of one generation call
    pub fn suite_summary(summary: &TestSuiteSummary) -> String {
        let mut lines = Vec::new();

        lines.push("═══════════════════════════════════════════════════════════════".to_string());
        lines.push("                      GENERATED SUITE                          ".to_string());
        lines.push("═══════════════════════════════════════════════════════════════".to_string());
        lines.push(String::new());

        lines.push(format!("Total:   {} steps", summary.total_tests));
        lines.push(format!("Success: {}", summary.success_tests));
        lines.push(format!("Error:   {}", summary.error_tests));
        lines.push(format!("Edge:    {}", summary.edge_tests));
        if summary.flow_tests > 0 {
            lines.push(format!("Flow:    {}", summary.flow_tests));
        }
        lines.push(String::new());

        lines.push(format!("Endpoints ({}):", summary.endpoints.len()));
        for endpoint in &summary.endpoints {
            lines.push(format!("  {}", endpoint));
        }

        if !summary.skipped.is_empty() {
            lines.push(String::new());
            lines.push(format!("Skipped ({}):", summary.skipped.len()));
            for op in &summary.skipped {
                lines.push(format!("  {} {} - {}", op.method, op.path, op.reason));
            }
        }

        if !summary.warnings.is_empty() {
            lines.push(String::new());
            lines.push("Warnings:".to_string());
            for warning in &summary.warnings {
                lines.push(format!("  ⚠ {}", warning));
            }
        }

        lines.join("\n")
    }

    /// Text rendering of an audit, with fix suggestions when given
    pub fn quality_summary(report: &QualityReport, fixes: &[FixSuggestion]) -> String {
        let mut lines = Vec::new();

        lines.push("═══════════════════════════════════════════════════════════════".to_string());
        lines.push("                       FLOW QUALITY                            ".to_string());
        lines.push("═══════════════════════════════════════════════════════════════".to_string());
        lines.push(String::new());

        lines.push(format!("Score:    {}/100", report.score));
        lines.push(format!("Errors:   {}", report.errors));
        lines.push(format!("Warnings: {}", report.warnings));
        lines.push(format!("Infos:    {}", report.infos));

        for severity in [Severity::Error, Severity::Warning, Severity::Info] {
            let issues: Vec<_> = report.issues.iter().filter(|i| i.severity == severity).collect();
            if issues.is_empty() {
                continue;
            }
            lines.push(String::new());
            lines.push(format!("{}s:", severity));
            for found in issues {
                lines.push(format!(
                    "  [{}] {}: {}",
                    found.issue_type.as_str(),
                    found.location,
                    found.message
                ));
                lines.push(format!("      → {}", found.suggestion));
            }
        }

        if !fixes.is_empty() {
            lines.push(String::new());
            lines.push("Suggested fixes:".to_string());
            for fix in fixes {
                lines.push(format!(
                    "  {}: {} → {} ({})",
                    fix.field_path, fix.current_value, fix.suggested_value, fix.reason
                ));
            }
        }

        lines.push(String::new());
        if report.has_errors() {
            lines.push("✗ Flow has errors".to_string());
        } else {
            lines.push("✓ Flow is structurally sound".to_string());
        }

        lines.join("\n")
    }

    /// JSON report for programmatic consumption
    pub fn suite_json(suite: &GeneratedSuite) -> String {
        use serde_json::json;

        let report = json!({
            "name": suite.flow.name,
            "baseUrl": suite.flow.base_url,
            "summary": suite.summary,
        });

        serde_json::to_string_pretty(&report).unwrap_or_default()
    }

    pub fn quality_json(report: &QualityReport, fixes: &[FixSuggestion]) -> String {
        use serde_json::json;

        let report = json!({
            "report": report,
            "fixes": fixes,
        });

        serde_json::to_string_pretty(&report).unwrap_or_default()
    }
}
