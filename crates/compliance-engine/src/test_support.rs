//! Fixtures shared by unit tests

use crate::regulations::{RegulationSet, RegulationStore};
use shared_types::{CellValue, Dataset};

pub(crate) const CPCB_JSON: &str = r#"{
    "agency_name": "Central Pollution Control Board",
    "standards": {
        "air_quality": [
            {
                "parameter_id": "PM2_5",
                "unit": "ug/m3",
                "aqi_categories": [
                    {"min": 0, "max": 50, "category": "Good"},
                    {"min": 51, "max": 100, "category": "Satisfactory"},
                    {"min": 101, "max": null, "category": "Severe"}
                ]
            },
            {
                "parameter_id": "PM10",
                "unit": "ug/m3",
                "aqi_categories": [
                    {"min": 0, "max": 50, "category": "Good"},
                    {"min": 51, "max": 100, "category": "Satisfactory"},
                    {"min": 101, "max": 250, "category": "Moderate"},
                    {"min": 251, "category": "Severe"}
                ]
            }
        ]
    }
}"#;

pub(crate) const EPA_JSON: &str = r#"{
    "agency_name": "U.S. Environmental Protection Agency",
    "standards": {
        "air_quality": [
            {
                "parameter_id": "PM2_5",
                "naaqs_standards": [
                    {"averaging_time": "Annual", "level": 9.0},
                    {"averaging_time": "24 hours", "level": 35}
                ]
            },
            {
                "parameter_id": "O3",
                "naaqs_standards": [
                    {"averaging_time": "8 hours", "level": "0.070", "unit": "ppm"}
                ]
            }
        ]
    }
}"#;

pub(crate) fn store() -> RegulationStore {
    RegulationStore::from_sets(vec![
        RegulationSet::from_json("cpcb_standards", CPCB_JSON).unwrap(),
        RegulationSet::from_json("epa_standards", EPA_JSON).unwrap(),
    ])
}

pub(crate) fn numeric_column(values: &[f64]) -> Vec<CellValue> {
    values.iter().map(|v| CellValue::Number(*v)).collect()
}

/// PM2_5 readings plus an unregulated temperature column.
pub(crate) fn pm25_dataset(values: &[f64]) -> Dataset {
    let temperature: Vec<f64> = values.iter().map(|_| 28.0).collect();
    Dataset::from_columns(vec![
        ("PM2_5", numeric_column(values)),
        ("Temperature", numeric_column(&temperature)),
    ])
}
