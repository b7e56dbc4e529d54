//! Sequential wiring of a single audit run
//!
//! Validator, then classifier, then the external collaborators, then the
//! aggregator. Every stage hands back data, so `run` always ends in a graded
//! report.

use shared_types::{ClassificationReport, Dataset, FinalReport, ReportStatus, ValidationReport};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::classifier::ComplianceClassifier;
use crate::collaborators::{ExplainabilityInspector, NarrativeGenerator, PerformanceEvaluator};
use crate::dataset::{file_sha256, load_dataset};
use crate::error::AuditError;
use crate::regulations::RegulationStore;
use crate::validator::FeatureValidator;
use crate::voting::{Aggregator, StageReports};

#[derive(Debug, Clone)]
pub struct AuditRequest {
    pub dataset_path: PathBuf,
    pub agency_key: String,
    /// Columns the audited model was trained on. Defaults to every dataset
    /// column.
    pub model_features: Option<Vec<String>>,
}

impl AuditRequest {
    pub fn new(dataset_path: impl Into<PathBuf>, agency_key: impl Into<String>) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            agency_key: agency_key.into(),
            model_features: None,
        }
    }

    pub fn with_model_features(mut self, features: Vec<String>) -> Self {
        self.model_features = Some(features);
        self
    }
}

pub struct AuditPipeline<'a> {
    store: &'a RegulationStore,
    performance: &'a dyn PerformanceEvaluator,
    explainability: &'a dyn ExplainabilityInspector,
    narrator: &'a dyn NarrativeGenerator,
}

impl<'a> AuditPipeline<'a> {
    pub fn new(
        store: &'a RegulationStore,
        performance: &'a dyn PerformanceEvaluator,
        explainability: &'a dyn ExplainabilityInspector,
        narrator: &'a dyn NarrativeGenerator,
    ) -> Self {
        Self {
            store,
            performance,
            explainability,
            narrator,
        }
    }

    /// Load the requested dataset and audit it.
    ///
    /// A dataset that cannot be loaded is recorded as a failed validation
    /// and still produces a graded report.
    pub fn run(&self, request: &AuditRequest) -> FinalReport {
        let file_reference = request.dataset_path.display().to_string();
        info!(file = %file_reference, agency = %request.agency_key, "Starting audit");

        let dataset = match load_dataset(&request.dataset_path) {
            Ok(dataset) => dataset,
            Err(e) => {
                warn!("Could not load dataset: {}", e);
                let validation =
                    ValidationReport::failure(&request.agency_key, &file_reference, e.to_string());
                return self.finish(
                    &Dataset::default(),
                    validation,
                    None,
                    request.model_features.as_deref(),
                    None,
                );
            }
        };

        let sha = match file_sha256(&request.dataset_path) {
            Ok(sha) => Some(sha),
            Err(e) => {
                warn!("Could not hash dataset: {}", e);
                None
            }
        };

        self.audit(
            &dataset,
            &request.agency_key,
            &file_reference,
            request.model_features.as_deref(),
            sha,
        )
    }

    /// Audit an in-memory dataset.
    pub fn run_dataset(
        &self,
        dataset: &Dataset,
        agency_key: &str,
        file_reference: &str,
        model_features: Option<&[String]>,
    ) -> FinalReport {
        self.audit(dataset, agency_key, file_reference, model_features, None)
    }

    fn audit(
        &self,
        dataset: &Dataset,
        agency_key: &str,
        file_reference: &str,
        model_features: Option<&[String]>,
        dataset_sha256: Option<String>,
    ) -> FinalReport {
        let validation = FeatureValidator::new(self.store).validate(dataset, agency_key, file_reference);

        let classification = if validation.status.is_success() {
            let (report, _annotated) =
                ComplianceClassifier::new(self.store).classify(dataset, agency_key);
            Some(report)
        } else {
            None
        };

        self.finish(dataset, validation, classification, model_features, dataset_sha256)
    }

    fn finish(
        &self,
        dataset: &Dataset,
        validation: ValidationReport,
        classification: Option<ClassificationReport>,
        model_features: Option<&[String]>,
        dataset_sha256: Option<String>,
    ) -> FinalReport {
        let classification = classification.unwrap_or_else(|| {
            let reason = AuditError::UpstreamFailure {
                stage: "validation",
                status: validation.status,
                message: validation.message.clone(),
            };
            info!("Skipping compliance check: {}", reason);
            ClassificationReport::with_status(
                ReportStatus::Skipped,
                &validation.agency,
                reason.to_string(),
            )
        });

        let features: Vec<String> = match model_features {
            Some(features) => features.to_vec(),
            None => dataset.columns.clone(),
        };

        let performance = self.performance.evaluate(dataset, &features);
        let explainability = self.explainability.inspect(dataset, &features);

        let model_feature_set: BTreeSet<String> = features.into_iter().collect();
        Aggregator::new(self.narrator).aggregate(
            StageReports {
                validation,
                classification,
                performance,
                explainability,
            },
            &model_feature_set,
            dataset_sha256,
        )
    }
}
