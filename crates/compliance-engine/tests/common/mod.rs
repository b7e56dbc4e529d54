//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const CPCB_PM25_ONLY: &str = r#"{
    "agency_name": "Central Pollution Control Board",
    "standards": {
        "air_quality": [
            {
                "parameter_id": "PM2_5",
                "aqi_categories": [
                    {"min": 0, "max": 50, "category": "Good"},
                    {"min": 51, "max": 100, "category": "Satisfactory"},
                    {"min": 101, "max": null, "category": "Severe"}
                ]
            }
        ]
    }
}"#;

pub const ABC_AGENCY: &str = r#"{
    "standards": {
        "air_quality": [
            {"parameter_id": "A", "aqi_categories": [{"min": 0, "max": 10, "category": "Good"}]},
            {"parameter_id": "B", "aqi_categories": [{"min": 0, "max": 10, "category": "Good"}]},
            {"parameter_id": "C", "aqi_categories": [{"min": 0, "max": 10, "category": "Good"}]}
        ]
    }
}"#;

/// A temporary regulations directory holding the given `(file name, body)`
/// documents.
pub fn regulations_dir(documents: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, body) in documents {
        fs::write(dir.path().join(name), body).unwrap();
    }
    dir
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// The regulation documents shipped with the repository.
pub fn bundled_regulations() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("regulations")
}
