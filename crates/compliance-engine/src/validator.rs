//! Feature Validator
//!
//! Compares a dataset's columns with the parameters an agency regulates and
//! checks that every regulated column present in the data is numeric.

use shared_types::{Dataset, ReportStatus, ValidationReport};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use crate::regulations::RegulationStore;

/// Result of comparing dataset columns with required features.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeaturePresence {
    pub present: BTreeSet<String>,
    pub missing: BTreeSet<String>,
    pub extra: BTreeSet<String>,
}

/// Plain set algebra over column names.
pub fn check_feature_presence(
    columns: &BTreeSet<String>,
    required: &BTreeSet<String>,
) -> FeaturePresence {
    FeaturePresence {
        present: columns.intersection(required).cloned().collect(),
        missing: required.difference(columns).cloned().collect(),
        extra: columns.difference(required).cloned().collect(),
    }
}

/// Every value of every listed column must coerce to a number.
///
/// Columns absent from the dataset are ignored.
pub fn validate_schema<'a>(
    dataset: &Dataset,
    columns: impl IntoIterator<Item = &'a String>,
) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();

    for column in columns {
        if !dataset.has_column(column) {
            continue;
        }

        let mut bad_rows = dataset
            .column(column)
            .enumerate()
            .filter(|(_, cell)| cell.as_f64().is_none())
            .map(|(row, _)| row);

        if let Some(first) = bad_rows.next() {
            let count = 1 + bad_rows.count();
            errors.insert(
                column.clone(),
                format!(
                    "Contains non-numeric values ({} of {} rows, first at row {}).",
                    count,
                    dataset.len(),
                    first + 1
                ),
            );
        }
    }

    errors
}

pub struct FeatureValidator<'a> {
    store: &'a RegulationStore,
}

impl<'a> FeatureValidator<'a> {
    pub fn new(store: &'a RegulationStore) -> Self {
        Self { store }
    }

    /// Validate `dataset` against the agency's air-quality parameters.
    ///
    /// Never panics and never mutates the dataset; every problem is reported
    /// through the returned status.
    pub fn validate(
        &self,
        dataset: &Dataset,
        agency_key: &str,
        file_reference: &str,
    ) -> ValidationReport {
        info!(agency = agency_key, "Running validation on {}", file_reference);

        let Some(regulations) = self.store.get(agency_key) else {
            return ValidationReport::failure(
                agency_key,
                file_reference,
                format!("No regulations found for agency key '{}'.", agency_key),
            );
        };

        let required = regulations.parameter_ids();
        if required.is_empty() {
            return ValidationReport::failure(
                agency_key,
                file_reference,
                format!(
                    "Agency '{}' declares no air-quality parameters.",
                    agency_key
                ),
            );
        }

        let presence = check_feature_presence(&dataset.column_set(), &required);
        let schema_errors = validate_schema(dataset, &presence.present);

        let (status, message) = if !presence.missing.is_empty() {
            (
                ReportStatus::Failure,
                format!(
                    "Dataset is missing required features: {}",
                    join(&presence.missing)
                ),
            )
        } else if !schema_errors.is_empty() {
            (
                ReportStatus::Failure,
                format!(
                    "Dataset has schema errors in: {}",
                    join(schema_errors.keys())
                ),
            )
        } else {
            (
                ReportStatus::Success,
                "Dataset validation passed. Ready for compliance checking.".to_string(),
            )
        };

        info!(agency = agency_key, %status, "Validation finished");

        ValidationReport {
            status,
            message,
            agency: agency_key.to_string(),
            file_reference: file_reference.to_string(),
            required_features: required,
            present_features: presence.present,
            missing_features: presence.missing,
            extra_features: presence.extra,
            schema_errors,
        }
    }
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regulations::RegulationSet;
    use crate::test_support::{numeric_column, pm25_dataset, store};
    use pretty_assertions::assert_eq;
    use shared_types::CellValue;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_presence_set_algebra() {
        let presence = check_feature_presence(&set(&["A", "C", "D"]), &set(&["A", "B", "C"]));

        assert_eq!(presence.present, set(&["A", "C"]));
        assert_eq!(presence.missing, set(&["B"]));
        assert_eq!(presence.extra, set(&["D"]));
    }

    #[test]
    fn test_missing_feature_fails_validation() {
        let json = r#"{"standards": {"air_quality": [
            {"parameter_id": "A"}, {"parameter_id": "B"}, {"parameter_id": "C"}
        ]}}"#;
        let store = RegulationStore::from_sets(vec![RegulationSet::from_json("abc", json).unwrap()]);
        let dataset = Dataset::from_columns(vec![
            ("A", numeric_column(&[1.0])),
            ("C", numeric_column(&[2.0])),
            ("D", numeric_column(&[3.0])),
        ]);

        let report = FeatureValidator::new(&store).validate(&dataset, "abc", "abc.csv");

        assert_eq!(report.status, ReportStatus::Failure);
        assert_eq!(report.present_features, set(&["A", "C"]));
        assert_eq!(report.missing_features, set(&["B"]));
        assert_eq!(report.extra_features, set(&["D"]));
        assert!(report.message.contains('B'));
    }

    #[test]
    fn test_unknown_agency_fails() {
        let store = store();
        let report =
            FeatureValidator::new(&store).validate(&pm25_dataset(&[1.0]), "who", "air.csv");

        assert_eq!(report.status, ReportStatus::Failure);
        assert!(report.message.contains("'who'"));
        assert!(report.required_features.is_empty());
    }

    #[test]
    fn test_non_numeric_present_column_is_schema_error() {
        let store = store();
        let dataset = Dataset::from_columns(vec![
            ("PM2_5", numeric_column(&[10.0, 20.0, 30.0])),
            (
                "PM10",
                vec![
                    CellValue::Number(40.0),
                    CellValue::Text("broken sensor".into()),
                    CellValue::Null,
                ],
            ),
            ("Station", vec!["Delhi".into(), "Pune".into(), "Agra".into()]),
        ]);

        let report = FeatureValidator::new(&store).validate(&dataset, "cpcb_standards", "air.csv");

        assert_eq!(report.status, ReportStatus::Failure);
        assert_eq!(report.schema_errors.len(), 1);
        assert_eq!(
            report.schema_errors["PM10"],
            "Contains non-numeric values (2 of 3 rows, first at row 2)."
        );
        // Text in an unregulated column is never checked
        assert!(!report.schema_errors.contains_key("Station"));
    }

    #[test]
    fn test_clean_dataset_passes() {
        let store = store();
        let dataset = Dataset::from_columns(vec![
            ("PM2_5", numeric_column(&[10.0, 20.0])),
            ("PM10", vec![CellValue::Text("55".into()), CellValue::Number(60.0)]),
            ("Temperature", numeric_column(&[30.0, 31.0])),
        ]);

        let report = FeatureValidator::new(&store).validate(&dataset, "cpcb_standards", "air.csv");

        assert_eq!(report.status, ReportStatus::Success);
        assert_eq!(report.extra_features, set(&["Temperature"]));
        assert!(report.schema_errors.is_empty());
        assert_eq!(report.file_reference, "air.csv");
    }

    #[test]
    fn test_missing_takes_precedence_over_schema_errors() {
        let store = store();
        let dataset = Dataset::from_columns(vec![("PM2_5", vec![CellValue::Text("x".into())])]);

        let report = FeatureValidator::new(&store).validate(&dataset, "cpcb_standards", "air.csv");

        assert_eq!(report.status, ReportStatus::Failure);
        assert!(report.message.starts_with("Dataset is missing required features"));
        assert!(report.schema_errors.contains_key("PM2_5"));
    }
}
