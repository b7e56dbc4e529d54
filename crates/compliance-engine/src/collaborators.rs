//! External collaborators
//!
//! Model evaluation, explainability and narrative generation live outside
//! the audit core. The core only depends on the traits below; the provided
//! implementations either read reports produced elsewhere or run locally.

use serde::de::DeserializeOwned;
use shared_types::{
    ClassificationReport, ComponentScores, Dataset, ExplainabilityReport, Grade,
    PerformanceReport, ReportStatus, ValidationReport,
};
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{AuditError, Result};

/// Scores a model against ground truth.
///
/// Implementations own the model handle and ground-truth column; any
/// non-`SUCCESS` status contributes zero to the final grade.
pub trait PerformanceEvaluator {
    fn evaluate(&self, dataset: &Dataset, features: &[String]) -> PerformanceReport;
}

/// Produces global/local explanations for a model.
pub trait ExplainabilityInspector {
    fn inspect(&self, dataset: &Dataset, features: &[String]) -> ExplainabilityReport;
}

/// Everything a narrative generator may look at: the final report minus the
/// narrative itself.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeRequest<'a> {
    pub audited_file: &'a str,
    pub agency: &'a str,
    pub grade: Grade,
    pub weighted_score: f64,
    pub component_scores: &'a ComponentScores,
    pub validation: &'a ValidationReport,
    pub classification: &'a ClassificationReport,
    pub performance: &'a PerformanceReport,
    pub explainability: &'a ExplainabilityReport,
}

/// Turns scored findings into prose. Failures are never fatal to an audit.
pub trait NarrativeGenerator {
    fn summarize(&self, request: &NarrativeRequest<'_>) -> Result<String>;
}

fn read_report<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| AuditError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| AuditError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Performance report produced by an external evaluator and saved as JSON.
#[derive(Debug, Clone, Default)]
pub struct PerformanceReportFile {
    path: Option<PathBuf>,
}

impl PerformanceReportFile {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl PerformanceEvaluator for PerformanceReportFile {
    fn evaluate(&self, _dataset: &Dataset, _features: &[String]) -> PerformanceReport {
        let Some(path) = &self.path else {
            debug!("No performance report configured");
            return PerformanceReport::with_status(
                ReportStatus::Skipped,
                "No performance evaluator configured.",
            );
        };

        match read_report::<PerformanceReport>(path) {
            Ok(report) => report,
            Err(e) => {
                let err = AuditError::CollaboratorFailure {
                    collaborator: "performance evaluator",
                    message: e.to_string(),
                };
                warn!("{}", err);
                PerformanceReport::with_status(ReportStatus::Failure, err.to_string())
            }
        }
    }
}

/// Explainability report produced by an external inspector and saved as JSON.
#[derive(Debug, Clone, Default)]
pub struct ExplainabilityReportFile {
    path: Option<PathBuf>,
}

impl ExplainabilityReportFile {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl ExplainabilityInspector for ExplainabilityReportFile {
    fn inspect(&self, _dataset: &Dataset, _features: &[String]) -> ExplainabilityReport {
        let Some(path) = &self.path else {
            debug!("No explainability report configured");
            return ExplainabilityReport::with_status(
                ReportStatus::Skipped,
                "No explainability inspector configured.",
            );
        };

        match read_report::<ExplainabilityReport>(path) {
            Ok(report) => report,
            Err(e) => {
                let err = AuditError::CollaboratorFailure {
                    collaborator: "explainability inspector",
                    message: e.to_string(),
                };
                warn!("{}", err);
                ExplainabilityReport::with_status(ReportStatus::Failure, err.to_string())
            }
        }
    }
}

/// Used when no text-generation service is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNarrator;

impl NarrativeGenerator for DisabledNarrator {
    fn summarize(&self, _request: &NarrativeRequest<'_>) -> Result<String> {
        Err(AuditError::CollaboratorFailure {
            collaborator: "narrative generator",
            message: "no narrative service configured".to_string(),
        })
    }
}

/// Deterministic, local plain-text narrative.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrator;

impl NarrativeGenerator for TemplateNarrator {
    fn summarize(&self, request: &NarrativeRequest<'_>) -> Result<String> {
        render_template(request).map_err(|e| AuditError::CollaboratorFailure {
            collaborator: "narrative generator",
            message: e.to_string(),
        })
    }
}

fn render_template(request: &NarrativeRequest<'_>) -> std::result::Result<String, std::fmt::Error> {
    let mut out = String::new();
    let scores = request.component_scores;

    writeln!(
        out,
        "{} audited against {} received grade {} ({:.2}/100).",
        request.audited_file, request.agency, request.grade, request.weighted_score
    )?;
    writeln!(
        out,
        "Feature compliance {:.2}%, threshold accuracy {:.2}%, explainability trust {:.2}%, model performance {:.2}%.",
        scores.feature_compliance,
        scores.threshold_accuracy,
        scores.xai_trust_score,
        scores.performance_metrics
    )?;

    if !request.validation.missing_features.is_empty() {
        let missing: Vec<&str> = request
            .validation
            .missing_features
            .iter()
            .map(String::as_str)
            .collect();
        writeln!(out, "Missing regulated parameters: {}.", missing.join(", "))?;
    }
    for (column, problem) in &request.validation.schema_errors {
        writeln!(out, "Column {}: {}", column, problem)?;
    }

    if !request.classification.category_distribution.is_empty() {
        let parts: Vec<String> = request
            .classification
            .category_distribution
            .iter()
            .map(|(category, count)| format!("{} {}", category, count))
            .collect();
        writeln!(out, "Category distribution: {}.", parts.join(", "))?;
    }
    for (parameter, count) in &request.classification.violation_counts {
        writeln!(out, "{} exceeded its standard in {} rows.", parameter, count)?;
    }

    let stages = [
        ("Validation", request.validation.status, Some(request.validation.message.as_str())),
        (
            "Compliance check",
            request.classification.status,
            Some(request.classification.message.as_str()),
        ),
        ("Performance evaluation", request.performance.status, request.performance.message.as_deref()),
        (
            "Explainability inspection",
            request.explainability.status,
            request.explainability.message.as_deref(),
        ),
    ];
    for (stage, status, message) in stages {
        if !status.is_success() {
            writeln!(out, "{} {}: {}", stage, status, message.unwrap_or("no details"))?;
        }
    }

    Ok(out.trim_end().to_string())
}
