//! Subcommand implementations

use anyhow::Result;
use compliance_engine::regulations::ClassificationRule;
use compliance_engine::{
    AuditPipeline, DisabledNarrator, ExplainabilityReportFile, NarrativeGenerator,
    PerformanceReportFile, RegulationStore, TemplateNarrator,
};
use shared_types::FinalReport;
use std::fmt::Write;
use tracing::{info, warn};

use crate::config::{Config, NarrativeMode};
use crate::reporter::Reporter;

/// Run one audit and return the graded report.
///
/// Errors only on incomplete configuration; every pipeline failure ends up
/// inside the report.
pub fn run_audit(store: &RegulationStore, config: &Config) -> Result<FinalReport> {
    let request = config.audit_request()?;

    if store.get(&request.agency_key).is_none() {
        warn!(
            "Agency '{}' is not loaded (available: {})",
            request.agency_key,
            store.agency_keys().join(", ")
        );
    }

    let performance = PerformanceReportFile::new(config.audit.performance_report.clone());
    let explainability = ExplainabilityReportFile::new(config.audit.explainability_report.clone());
    let narrator: &dyn NarrativeGenerator = match config.output.narrative {
        NarrativeMode::Template => &TemplateNarrator,
        NarrativeMode::Disabled => &DisabledNarrator,
    };

    let pipeline = AuditPipeline::new(store, &performance, &explainability, narrator);
    Ok(pipeline.run(&request))
}

/// Render the report to the configured destination.
pub fn emit(report: &FinalReport, config: &Config) -> Result<()> {
    let reporter = Reporter::new(config.output.format);
    match &config.output.path {
        Some(path) => {
            reporter.write_to_file(report, path)?;
            info!("Report written to {}", path.display());
            Ok(())
        }
        None => reporter.report(report),
    }
}

/// One block per loaded agency listing its parameters and rule kind.
pub fn describe_agencies(store: &RegulationStore) -> Result<String> {
    let mut output = String::new();

    if store.is_empty() {
        writeln!(output, "No agencies loaded.")?;
    }

    for key in store.agency_keys() {
        let Some(set) = store.get(key) else {
            continue;
        };
        match &set.agency_name {
            Some(name) => writeln!(output, "{} ({})", key, name)?,
            None => writeln!(output, "{}", key)?,
        }
        for parameter in &set.parameters {
            let rule = match &parameter.rule {
                ClassificationRule::Category { bins } => format!("{} categories", bins.len()),
                ClassificationRule::Violation { thresholds } => {
                    let windows: Vec<&str> = thresholds
                        .iter()
                        .map(|t| t.averaging_window.label())
                        .collect();
                    format!("limits: {}", windows.join(", "))
                }
            };
            let unit = parameter.unit.as_deref().unwrap_or("-");
            writeln!(output, "  {:<8} {:<8} {}", parameter.parameter_id, unit, rule)?;
        }
    }

    for skipped in store.skipped() {
        writeln!(
            output,
            "skipped {}: {}",
            skipped.file.display(),
            skipped.reason
        )?;
    }

    Ok(output)
}
