//! Compliance Classifier
//!
//! Applies each regulated parameter's rule to every row and appends one
//! derived column per checked parameter:
//!
//! - category rules produce `<param>_Category` (first matching bin, or
//!   `"Uncategorized"`)
//! - violation rules produce `<param>_Violation` (true when a recognised
//!   averaging window's level is exceeded)
//!
//! Columns that are not regulated parameters pass through untouched.

use shared_types::{CellValue, ClassificationReport, Dataset, ReportStatus};
use std::collections::BTreeMap;
use tracing::info;

use crate::regulations::{CategoryBin, ClassificationRule, RegulationStore, ThresholdRecord};

pub const UNCATEGORIZED: &str = "Uncategorized";

/// Categories counted as compliant when scoring.
pub const COMPLIANT_CATEGORIES: &[&str] = &["Good", "Satisfactory"];

/// First bin containing `value`, else [`UNCATEGORIZED`].
pub fn categorize(value: f64, bins: &[CategoryBin]) -> &str {
    bins.iter()
        .find(|bin| bin.contains(value))
        .map_or(UNCATEGORIZED, |bin| bin.category.as_str())
}

pub fn is_violation(value: f64, thresholds: &[ThresholdRecord]) -> bool {
    thresholds.iter().any(|t| t.is_exceeded_by(value))
}

/// Percentage of compliant categories, rounded to two decimals.
/// `None` for an empty column.
pub fn compliance_score<'a>(categories: impl IntoIterator<Item = &'a str>) -> Option<f64> {
    let mut total = 0usize;
    let mut compliant = 0usize;
    for category in categories {
        total += 1;
        if COMPLIANT_CATEGORIES.contains(&category) {
            compliant += 1;
        }
    }

    if total == 0 {
        return None;
    }
    Some(round2(compliant as f64 / total as f64 * 100.0))
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn category_column_name(parameter_id: &str) -> String {
    format!("{}_Category", parameter_id)
}

pub fn violation_column_name(parameter_id: &str) -> String {
    format!("{}_Violation", parameter_id)
}

pub struct ComplianceClassifier<'a> {
    store: &'a RegulationStore,
}

impl<'a> ComplianceClassifier<'a> {
    pub fn new(store: &'a RegulationStore) -> Self {
        Self { store }
    }

    /// Classify every regulated column of `dataset`.
    ///
    /// Returns the report together with an annotated copy of the dataset.
    /// The input is not modified.
    pub fn classify(&self, dataset: &Dataset, agency_key: &str) -> (ClassificationReport, Dataset) {
        info!(agency = agency_key, "Running compliance check");

        let Some(regulations) = self.store.get(agency_key) else {
            let report = ClassificationReport::with_status(
                ReportStatus::Failure,
                agency_key,
                format!("No regulations found for agency key '{}'.", agency_key),
            );
            return (report, dataset.clone());
        };

        let mut annotated = dataset.clone();
        let mut checked = Vec::new();
        let mut first_category_column: Option<String> = None;
        let mut violation_counts = BTreeMap::new();

        for column in &dataset.columns {
            let Some(parameter) = regulations.parameter(column) else {
                continue;
            };
            checked.push(column.clone());

            match &parameter.rule {
                ClassificationRule::Category { bins } => {
                    let derived: Vec<CellValue> = dataset
                        .column(column)
                        .map(|cell| {
                            let category = cell
                                .as_f64()
                                .map_or(UNCATEGORIZED, |value| categorize(value, bins));
                            CellValue::Text(category.to_string())
                        })
                        .collect();

                    let name = category_column_name(column);
                    if first_category_column.is_none() {
                        first_category_column = Some(name.clone());
                    }
                    annotated.add_column(name, derived);
                }
                ClassificationRule::Violation { thresholds } => {
                    let derived: Vec<bool> = dataset
                        .column(column)
                        .map(|cell| {
                            cell.as_f64()
                                .map_or(false, |value| is_violation(value, thresholds))
                        })
                        .collect();

                    violation_counts.insert(column.clone(), derived.iter().filter(|v| **v).count());
                    annotated.add_column(
                        violation_column_name(column),
                        derived.into_iter().map(CellValue::Bool).collect(),
                    );
                }
            }
        }

        let mut category_distribution = BTreeMap::new();
        let compliance_score_percent = if regulations.scores_by_category() {
            match &first_category_column {
                Some(name) => {
                    let categories: Vec<&str> = annotated
                        .column(name)
                        .map(|cell| cell.as_str().unwrap_or(UNCATEGORIZED))
                        .collect();
                    for category in &categories {
                        *category_distribution
                            .entry(category.to_string())
                            .or_insert(0usize) += 1;
                    }
                    compliance_score(categories)
                }
                // Nothing scoreable in the data: no compliant rows
                None if !dataset.is_empty() => Some(0.0),
                None => None,
            }
        } else {
            None
        };

        let message = if checked.is_empty() {
            "No regulated parameters found in dataset.".to_string()
        } else {
            format!("Checked parameters: {}", checked.join(", "))
        };

        info!(
            agency = agency_key,
            checked = checked.len(),
            score = ?compliance_score_percent,
            "Compliance check completed"
        );

        let report = ClassificationReport {
            status: ReportStatus::Success,
            message,
            agency: agency_key.to_string(),
            compliance_score_percent,
            category_distribution,
            violation_counts,
            checked_parameters: checked,
        };

        (report, annotated)
    }
}
