//! Human-readable analysis summary for the terminal.

use crate::model::schema::{Severity, UnifiedAnalysisResult};
use colored::Colorize;
use std::fmt::Write;

/// Render a text summary of an analysis result
///
/// **Public** - used by the analyze command with `--summary`
pub fn render_summary(result: &UnifiedAnalysisResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", "Gas Analysis Summary".bold());
    let _ = writeln!(out, "Total gas used: {}", result.total_gas_used);

    if !result.gas_breakdown.is_empty() {
        let _ = writeln!(out, "\n{}", "Top categories:".bold());
        for total in result.gas_breakdown.iter().take(5) {
            let _ = writeln!(
                out,
                "  {:<14} {:>12} gas  ({:.2}%)",
                total.label, total.gas_used, total.percentage_of_total
            );
        }
    }

    if !result.contract_attribution.is_empty() {
        let _ = writeln!(out, "\n{}", "Top contracts:".bold());
        for entry in result.contract_attribution.iter().take(5) {
            let label = entry.label.as_deref().unwrap_or(&entry.address);
            let _ = writeln!(
                out,
                "  {:<24} {:>12} gas  ({:.2}%, {:.0}% success)",
                label, entry.gas_used, entry.percentage_of_total, entry.success_rate
            );
        }
    }

    if let Some(overall) = result.efficiency_metrics.first() {
        let _ = writeln!(out, "\nOverall efficiency: {:.1}/100", overall.score);
    }

    if !result.cost_analysis.is_empty() {
        let total_usd: f64 = result.cost_analysis.iter().map(|c| c.cost_usd).sum();
        let _ = writeln!(out, "Estimated cost of top consumers: ${total_usd:.4}");
    }

    if result.optimization_findings.is_empty() {
        let _ = writeln!(out, "\n{}", "No optimization findings.".green());
    } else {
        let _ = writeln!(out, "\n{}", "Optimization findings:".bold());
        for finding in &result.optimization_findings {
            let severity = severity_tag(finding.severity);
            let _ = writeln!(
                out,
                "  [{severity}] {} - save ~{} gas ({:.1}%)",
                finding.pattern_id,
                finding.potential_savings.gas_amount,
                finding.potential_savings.percentage
            );
            let _ = writeln!(out, "        {}", finding.evidence.summary);
        }
    }

    if !result.warnings.is_empty() {
        let _ = writeln!(out, "\n{}", "Warnings:".yellow().bold());
        for warning in &result.warnings {
            let _ = writeln!(out, "  {warning}");
        }
    }

    out
}

fn severity_tag(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::Low => severity.label().normal(),
        Severity::Medium => severity.label().yellow(),
        Severity::High => severity.label().red(),
        Severity::Critical => severity.label().red().bold(),
    }
}
