//! Aggregation and voting
//!
//! Four component scores (each 0..=100) are combined with fixed weights into
//! a final score, which maps onto a letter grade:
//!
//! | Component          | Weight | Source                                   |
//! |--------------------|--------|------------------------------------------|
//! | feature_compliance | 0.40   | required features covered by the model   |
//! | threshold_accuracy | 0.30   | classifier compliance score              |
//! | xai_trust_score    | 0.20   | fixed, awarded once performance succeeds |
//! | performance        | 0.10   | model accuracy × 100                     |

use shared_types::{
    new_audit_id, timestamp_now, ClassificationReport, ComponentScores, ExplainabilityReport,
    FinalReport, Grade, PerformanceReport, ValidationReport,
};
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::classifier::round2;
use crate::collaborators::{NarrativeGenerator, NarrativeRequest};

pub const FEATURE_COMPLIANCE_WEIGHT: f64 = 0.40;
pub const THRESHOLD_ACCURACY_WEIGHT: f64 = 0.30;
pub const XAI_TRUST_WEIGHT: f64 = 0.20;
pub const PERFORMANCE_WEIGHT: f64 = 0.10;

/// Awarded whenever the performance evaluator succeeds. An explanation of a
/// model that was never evaluated earns nothing.
pub const XAI_TRUST_SCORE: f64 = 85.0;

pub const NARRATIVE_UNAVAILABLE: &str = "Narrative summary unavailable";

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Derive the four component scores from the stage reports, clamped to
/// 0..=100 but not rounded.
///
/// `model_features` is the set of columns the model was trained on; features
/// it lacks count against compliance even when the dataset carries them.
pub fn raw_component_scores(
    validation: &ValidationReport,
    classification: &ClassificationReport,
    performance: &PerformanceReport,
    model_features: &BTreeSet<String>,
) -> ComponentScores {
    let required = &validation.required_features;
    let feature_compliance = if required.is_empty() {
        0.0
    } else {
        let covered = required.intersection(model_features).count();
        covered as f64 / required.len() as f64 * 100.0
    };

    let threshold_accuracy = if classification.status.is_success() {
        classification.compliance_score_percent.unwrap_or(0.0)
    } else {
        0.0
    };

    let (xai_trust_score, performance_metrics) = if performance.status.is_success() {
        (XAI_TRUST_SCORE, performance.accuracy.unwrap_or(0.0) * 100.0)
    } else {
        (0.0, 0.0)
    };

    ComponentScores {
        feature_compliance: clamp_percent(feature_compliance),
        threshold_accuracy: clamp_percent(threshold_accuracy),
        xai_trust_score: clamp_percent(xai_trust_score),
        performance_metrics: clamp_percent(performance_metrics),
    }
}

/// Component scores as reported, rounded to two decimals.
pub fn component_scores(
    validation: &ValidationReport,
    classification: &ClassificationReport,
    performance: &PerformanceReport,
    model_features: &BTreeSet<String>,
) -> ComponentScores {
    rounded(&raw_component_scores(
        validation,
        classification,
        performance,
        model_features,
    ))
}

fn rounded(scores: &ComponentScores) -> ComponentScores {
    ComponentScores {
        feature_compliance: round2(scores.feature_compliance),
        threshold_accuracy: round2(scores.threshold_accuracy),
        xai_trust_score: round2(scores.xai_trust_score),
        performance_metrics: round2(scores.performance_metrics),
    }
}

/// Weighted total, clamped but unrounded. Grades are assigned from this.
pub fn raw_weighted_score(scores: &ComponentScores) -> f64 {
    let total = scores.feature_compliance * FEATURE_COMPLIANCE_WEIGHT
        + scores.threshold_accuracy * THRESHOLD_ACCURACY_WEIGHT
        + scores.xai_trust_score * XAI_TRUST_WEIGHT
        + scores.performance_metrics * PERFORMANCE_WEIGHT;
    clamp_percent(total)
}

pub fn weighted_score(scores: &ComponentScores) -> f64 {
    round2(raw_weighted_score(scores))
}

pub fn assign_grade(score: f64) -> Grade {
    if score >= 90.0 {
        Grade::A
    } else if score >= 80.0 {
        Grade::B
    } else if score >= 70.0 {
        Grade::C
    } else if score >= 60.0 {
        Grade::D
    } else {
        Grade::F
    }
}

/// Stage reports collected by the pipeline, ready to be voted on.
#[derive(Debug, Clone)]
pub struct StageReports {
    pub validation: ValidationReport,
    pub classification: ClassificationReport,
    pub performance: PerformanceReport,
    pub explainability: ExplainabilityReport,
}

pub struct Aggregator<'a> {
    narrator: &'a dyn NarrativeGenerator,
}

impl<'a> Aggregator<'a> {
    pub fn new(narrator: &'a dyn NarrativeGenerator) -> Self {
        Self { narrator }
    }

    /// Combine stage reports into the final, graded report.
    ///
    /// A failing narrator never fails the audit; its error is folded into
    /// `narrative_summary`.
    pub fn aggregate(
        &self,
        reports: StageReports,
        model_features: &BTreeSet<String>,
        dataset_sha256: Option<String>,
    ) -> FinalReport {
        let StageReports {
            validation,
            classification,
            performance,
            explainability,
        } = reports;

        let raw_scores =
            raw_component_scores(&validation, &classification, &performance, model_features);
        let raw_score = raw_weighted_score(&raw_scores);
        // Rounding is for the report only; 89.996 must not earn an A
        let final_grade = assign_grade(raw_score);
        let final_weighted_score = round2(raw_score);
        let component_scores = rounded(&raw_scores);

        info!(
            agency = %validation.agency,
            score = final_weighted_score,
            grade = %final_grade,
            "Audit scored"
        );

        let request = NarrativeRequest {
            audited_file: &validation.file_reference,
            agency: &validation.agency,
            grade: final_grade,
            weighted_score: final_weighted_score,
            component_scores: &component_scores,
            validation: &validation,
            classification: &classification,
            performance: &performance,
            explainability: &explainability,
        };
        let narrative_summary = match self.narrator.summarize(&request) {
            Ok(text) => text,
            Err(e) => {
                warn!("Narrative generation failed: {}", e);
                format!("{}: {}", NARRATIVE_UNAVAILABLE, e)
            }
        };

        FinalReport {
            audit_id: new_audit_id(),
            generated_at: timestamp_now(),
            audited_file: validation.file_reference.clone(),
            dataset_sha256,
            agency: validation.agency.clone(),
            final_grade,
            final_weighted_score,
            component_scores,
            validation_report: validation,
            classification_report: classification,
            performance_report: performance,
            explainability_report: explainability,
            narrative_summary,
        }
    }
}
