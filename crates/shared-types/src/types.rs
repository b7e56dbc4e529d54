use std::collections::{BTreeMap, BTreeSet};

/// Outcome tag carried by every stage report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Success,
    Failure,
    Skipped,
}

impl ReportStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ReportStatus::Success)
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Success => write!(f, "SUCCESS"),
            ReportStatus::Failure => write!(f, "FAILURE"),
            ReportStatus::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Result of checking a dataset's columns against an agency's parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ValidationReport {
    pub status: ReportStatus,
    pub message: String,
    pub agency: String,
    pub file_reference: String,
    pub required_features: BTreeSet<String>,
    pub present_features: BTreeSet<String>,
    pub missing_features: BTreeSet<String>,
    pub extra_features: BTreeSet<String>,
    pub schema_errors: BTreeMap<String, String>, // column -> explanation
}

impl ValidationReport {
    /// A failed report that never got as far as comparing columns.
    pub fn failure(agency: &str, file_reference: &str, message: impl Into<String>) -> Self {
        Self {
            status: ReportStatus::Failure,
            message: message.into(),
            agency: agency.to_string(),
            file_reference: file_reference.to_string(),
            required_features: BTreeSet::new(),
            present_features: BTreeSet::new(),
            missing_features: BTreeSet::new(),
            extra_features: BTreeSet::new(),
            schema_errors: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClassificationReport {
    pub status: ReportStatus,
    pub message: String,
    pub agency: String,
    /// Share of rows in a compliant category, two decimals. `None` when the
    /// agency is scored by threshold violations or the dataset is empty.
    pub compliance_score_percent: Option<f64>,
    pub category_distribution: BTreeMap<String, usize>,
    /// Rows in violation per parameter (threshold-rule agencies only).
    #[serde(default)]
    pub violation_counts: BTreeMap<String, usize>,
    #[serde(default)]
    pub checked_parameters: Vec<String>,
}

impl ClassificationReport {
    pub fn with_status(status: ReportStatus, agency: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            agency: agency.to_string(),
            compliance_score_percent: None,
            category_distribution: BTreeMap::new(),
            violation_counts: BTreeMap::new(),
            checked_parameters: Vec::new(),
        }
    }
}

/// Produced by an external model evaluator. Only `status` and `accuracy`
/// are interpreted; everything else passes through untouched.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PerformanceReport {
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl PerformanceReport {
    pub fn with_status(status: ReportStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
            accuracy: None,
            details: serde_json::Map::new(),
        }
    }
}

/// Produced by an external explainability inspector. Only `status` is read.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExplainabilityReport {
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_explanation_artifact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_explanation_sample: Option<serde_json::Value>,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl ExplainabilityReport {
    pub fn with_status(status: ReportStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
            global_explanation_artifact: None,
            local_explanation_sample: None,
            details: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ComponentScores {
    pub feature_compliance: f64,
    pub threshold_accuracy: f64,
    pub xai_trust_score: f64,
    pub performance_metrics: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The graded outcome of one audit run. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FinalReport {
    pub audit_id: String,
    pub generated_at: String, // RFC 3339
    pub audited_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_sha256: Option<String>,
    pub agency: String,
    pub final_grade: Grade,
    pub final_weighted_score: f64,
    pub component_scores: ComponentScores,
    pub validation_report: ValidationReport,
    pub classification_report: ClassificationReport,
    pub performance_report: PerformanceReport,
    pub explainability_report: ExplainabilityReport,
    pub narrative_summary: String,
}

pub fn new_audit_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339()
}
