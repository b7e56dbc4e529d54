//! Environmental compliance audit core
//!
//! Regulation store, feature validation, per-parameter compliance
//! classification and weighted voting into a single letter grade.

pub mod classifier;
pub mod collaborators;
pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod regulations;
pub mod validator;
pub mod voting;

#[cfg(test)]
mod test_support;

pub use classifier::ComplianceClassifier;
pub use collaborators::{
    DisabledNarrator, ExplainabilityInspector, ExplainabilityReportFile, NarrativeGenerator,
    NarrativeRequest, PerformanceEvaluator, PerformanceReportFile, TemplateNarrator,
};
pub use dataset::{file_sha256, load_dataset};
pub use error::{AuditError, Result};
pub use pipeline::{AuditPipeline, AuditRequest};
pub use regulations::{RegulationCache, RegulationSet, RegulationStore};
pub use validator::FeatureValidator;
pub use voting::{assign_grade, weighted_score, Aggregator, StageReports};
