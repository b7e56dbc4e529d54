//! Console reporter for the final report
//!
//! Plain-text summary: grade, weighted components, per-stage status and the
//! narrative.

use anyhow::Result;
use compliance_engine::voting::{
    FEATURE_COMPLIANCE_WEIGHT, PERFORMANCE_WEIGHT, THRESHOLD_ACCURACY_WEIGHT, XAI_TRUST_WEIGHT,
};
use shared_types::{FinalReport, ReportStatus};
use std::fmt::Write;

pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn format(report: &FinalReport) -> Result<String> {
        let mut output = String::new();

        // Header
        writeln!(output)?;
        writeln!(output, "╔══════════════════════════════════════════════════════════════╗")?;
        writeln!(output, "║                  ENVIRONMENTAL AUDIT REPORT                  ║")?;
        writeln!(output, "╚══════════════════════════════════════════════════════════════╝")?;
        writeln!(output)?;

        writeln!(output, "Audit ID:  {}", report.audit_id)?;
        writeln!(output, "File:      {}", report.audited_file)?;
        writeln!(output, "Agency:    {}", report.agency)?;
        writeln!(output, "Generated: {}", report.generated_at)?;
        if let Some(sha) = &report.dataset_sha256 {
            writeln!(output, "SHA-256:   {}", sha)?;
        }
        writeln!(output)?;

        writeln!(
            output,
            "Grade: {}   Weighted score: {:.2}/100",
            report.final_grade, report.final_weighted_score
        )?;
        writeln!(output)?;

        let scores = &report.component_scores;
        writeln!(output, "Component scores:")?;
        for (name, score, weight) in [
            ("Feature compliance", scores.feature_compliance, FEATURE_COMPLIANCE_WEIGHT),
            ("Threshold accuracy", scores.threshold_accuracy, THRESHOLD_ACCURACY_WEIGHT),
            ("XAI trust", scores.xai_trust_score, XAI_TRUST_WEIGHT),
            ("Model performance", scores.performance_metrics, PERFORMANCE_WEIGHT),
        ] {
            writeln!(
                output,
                "  {:<20} {:>6.2}  (x{:.2} = {:>5.2})",
                name,
                score,
                weight,
                score * weight
            )?;
        }
        writeln!(output)?;

        Self::format_stages(&mut output, report)?;

        writeln!(output, "────────────────────────────────────────────────────────────────")?;
        writeln!(output, "Summary:")?;
        for line in report.narrative_summary.lines() {
            writeln!(output, "  {}", line)?;
        }
        writeln!(output)?;

        Ok(output)
    }

    fn format_stages(output: &mut String, report: &FinalReport) -> Result<()> {
        let validation = &report.validation_report;
        let classification = &report.classification_report;

        writeln!(output, "────────────────────────────────────────────────────────────────")?;
        writeln!(
            output,
            "Validation:      {} {}",
            symbol(validation.status),
            validation.message
        )?;
        if !validation.missing_features.is_empty() {
            let missing: Vec<&str> = validation
                .missing_features
                .iter()
                .map(String::as_str)
                .collect();
            writeln!(output, "  Missing:       {}", missing.join(", "))?;
        }
        for (column, problem) in &validation.schema_errors {
            writeln!(output, "  • {}: {}", column, problem)?;
        }

        writeln!(
            output,
            "Compliance:      {} {}",
            symbol(classification.status),
            classification.message
        )?;
        if let Some(score) = classification.compliance_score_percent {
            writeln!(output, "  Score:         {:.2}%", score)?;
        }
        for (category, count) in &classification.category_distribution {
            writeln!(output, "  • {:<14} {}", category, count)?;
        }
        for (parameter, count) in &classification.violation_counts {
            writeln!(output, "  • {:<14} {} violations", parameter, count)?;
        }

        writeln!(
            output,
            "Performance:     {} {}",
            symbol(report.performance_report.status),
            report
                .performance_report
                .accuracy
                .map(|a| format!("accuracy {:.2}", a))
                .or_else(|| report.performance_report.message.clone())
                .unwrap_or_default()
        )?;
        writeln!(
            output,
            "Explainability:  {} {}",
            symbol(report.explainability_report.status),
            report
                .explainability_report
                .message
                .as_deref()
                .unwrap_or_default()
        )?;

        Ok(())
    }
}

fn symbol(status: ReportStatus) -> &'static str {
    match status {
        ReportStatus::Success => "✓",
        ReportStatus::Failure => "✗",
        ReportStatus::Skipped => "-",
    }
}
