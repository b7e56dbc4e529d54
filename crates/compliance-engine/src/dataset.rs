//! Dataset ingestion
//!
//! CSV files (header row required), JSON record arrays and the first
//! worksheet of an `.xlsx` workbook. Cells are parsed with
//! [`CellValue::parse`]; numeric coercion is left to the validator.

use calamine::{Data, Range, Reader, Xlsx};
use shared_types::{CellValue, Dataset, Row};
use std::collections::HashSet;
use std::fs;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

use crate::error::{AuditError, Result};

/// Load a dataset, dispatching on file extension.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    let dataset = match extension.as_str() {
        "csv" => {
            let file = fs::File::open(path).map_err(|e| AuditError::io(path, e))?;
            dataset_from_csv_reader(file).map_err(|e| relabel(e, path))?
        }
        "json" => {
            let content = fs::read_to_string(path).map_err(|e| AuditError::io(path, e))?;
            dataset_from_json_str(&content).map_err(|e| relabel(e, path))?
        }
        "xlsx" => load_first_worksheet(path)?,
        _ => {
            return Err(AuditError::SchemaViolation(format!(
                "Unsupported file type for {}. Please use .csv, .json or .xlsx.",
                path.display()
            )))
        }
    };

    debug!(
        rows = dataset.len(),
        columns = dataset.columns.len(),
        "Loaded dataset {}",
        path.display()
    );
    Ok(dataset)
}

/// Read CSV with a header row. Ragged rows and repeated column names are
/// rejected.
pub fn dataset_from_csv_reader<R: Read>(reader: R) -> Result<Dataset> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();
    ensure_unique_columns(&headers, "<csv>")?;

    let mut dataset = Dataset::new(headers.clone());
    for record in csv_reader.records() {
        let record = record.map_err(csv_error)?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(name, raw)| (name.clone(), CellValue::parse(raw)))
            .collect();
        dataset.rows.push(row);
    }

    Ok(dataset)
}

fn load_first_worksheet(path: &Path) -> Result<Dataset> {
    let xlsx_error = |message: String| AuditError::Parse {
        path: path.display().to_string(),
        message,
    };

    let file = fs::File::open(path).map_err(|e| AuditError::io(path, e))?;
    let mut workbook: Xlsx<_> =
        Xlsx::new(BufReader::new(file)).map_err(|e| xlsx_error(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| xlsx_error("workbook has no worksheets".to_string()))?
        .map_err(|e| xlsx_error(e.to_string()))?;

    dataset_from_range(&range).map_err(|e| relabel(e, path))
}

/// Build a dataset from a worksheet range. The first row holds the column
/// names; blank header cells are named `Unnamed: <index>`.
pub fn dataset_from_range(range: &Range<Data>) -> Result<Dataset> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Dataset::default());
    };

    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(index, cell)| match cell {
            Data::Empty => format!("Unnamed: {}", index),
            other => other.to_string().trim().to_string(),
        })
        .collect();
    ensure_unique_columns(&headers, "<xlsx>")?;

    let mut dataset = Dataset::new(headers.clone());
    for cells in rows {
        let row: Row = headers
            .iter()
            .zip(cells.iter())
            .map(|(name, cell)| (name.clone(), sheet_cell(cell)))
            .collect();
        dataset.rows.push(row);
    }

    Ok(dataset)
}

fn sheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) => CellValue::parse(s),
        other => CellValue::Text(other.to_string()),
    }
}

fn ensure_unique_columns(columns: &[String], source: &str) -> Result<()> {
    let mut seen = HashSet::new();
    for column in columns {
        if !seen.insert(column.as_str()) {
            return Err(AuditError::Parse {
                path: source.to_string(),
                message: format!("duplicate column '{}' in header", column),
            });
        }
    }
    Ok(())
}

/// Parse a JSON array of flat objects. Keys within a record arrive sorted;
/// columns are registered in first-seen order across records.
pub fn dataset_from_json_str(json: &str) -> Result<Dataset> {
    let records: Vec<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_str(json).map_err(|e| AuditError::Parse {
            path: "<json>".to_string(),
            message: e.to_string(),
        })?;

    let mut dataset = Dataset::default();
    for record in records {
        let row: Row = record
            .into_iter()
            .map(|(name, value)| (name, json_cell(value)))
            .collect();
        dataset.push_row(row);
    }

    Ok(dataset)
}

fn json_cell(value: serde_json::Value) -> CellValue {
    match value {
        serde_json::Value::Null => CellValue::Null,
        serde_json::Value::Bool(b) => CellValue::Bool(b),
        serde_json::Value::Number(n) => n.as_f64().map_or(CellValue::Null, CellValue::Number),
        serde_json::Value::String(s) => CellValue::Text(s),
        other => CellValue::Text(other.to_string()),
    }
}

fn csv_error(e: csv::Error) -> AuditError {
    AuditError::Parse {
        path: "<csv>".to_string(),
        message: e.to_string(),
    }
}

fn relabel(e: AuditError, path: &Path) -> AuditError {
    match e {
        AuditError::Parse { message, .. } => AuditError::Parse {
            path: path.display().to_string(),
            message,
        },
        other => other,
    }
}

/// SHA-256 of a file's bytes, hex encoded.
pub fn file_sha256(path: impl AsRef<Path>) -> Result<String> {
    use sha2::{Digest, Sha256};

    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| AuditError::io(path, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_csv_keeps_header_order() {
        let csv = "PM2_5,Temperature,Station\n25,30.5,Delhi\n,31,Pune\n";
        let dataset = dataset_from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(dataset.columns, vec!["PM2_5", "Temperature", "Station"]);
        assert_eq!(dataset.len(), 2);
        let pm: Vec<_> = dataset.column("PM2_5").cloned().collect();
        assert_eq!(pm, vec![CellValue::Number(25.0), CellValue::Null]);
        assert_eq!(
            dataset.column("Station").next(),
            Some(&CellValue::Text("Delhi".to_string()))
        );
    }

    #[test]
    fn test_csv_ragged_row_is_parse_error() {
        let csv = "A,B\n1,2\n3\n";
        let err = dataset_from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, AuditError::Parse { .. }));
    }

    #[test]
    fn test_csv_repeated_header_is_parse_error() {
        let csv = "PM2_5,PM2_5\n25,300\n";
        let err = dataset_from_csv_reader(csv.as_bytes()).unwrap_err();

        match err {
            AuditError::Parse { message, .. } => {
                assert!(message.contains("duplicate column 'PM2_5'"))
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_worksheet_range_to_dataset() {
        let mut range: Range<Data> = Range::new((0, 0), (2, 2));
        range.set_value((0, 0), Data::String("PM2_5".into()));
        range.set_value((0, 1), Data::String("Station".into()));
        range.set_value((1, 0), Data::Int(25));
        range.set_value((1, 1), Data::String("Delhi".into()));
        range.set_value((1, 2), Data::Bool(true));
        range.set_value((2, 0), Data::String("75.5".into()));

        let dataset = dataset_from_range(&range).unwrap();

        assert_eq!(dataset.columns, vec!["PM2_5", "Station", "Unnamed: 2"]);
        assert_eq!(dataset.len(), 2);
        let pm: Vec<_> = dataset.column("PM2_5").filter_map(|c| c.as_f64()).collect();
        assert_eq!(pm, vec![25.0, 75.5]);
        assert_eq!(
            dataset.column("Station").next(),
            Some(&CellValue::Text("Delhi".to_string()))
        );
        assert_eq!(dataset.column("Station").nth(1), Some(&CellValue::Null));
        assert_eq!(dataset.column("Unnamed: 2").next(), Some(&CellValue::Bool(true)));
    }

    #[test]
    fn test_worksheet_repeated_header_is_parse_error() {
        let mut range: Range<Data> = Range::new((0, 0), (1, 1));
        range.set_value((0, 0), Data::String("O3".into()));
        range.set_value((0, 1), Data::String(" O3 ".into()));

        assert!(matches!(
            dataset_from_range(&range).unwrap_err(),
            AuditError::Parse { .. }
        ));
    }

    #[test]
    fn test_corrupt_xlsx_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("air.xlsx");
        fs::write(&path, "not a zip archive").unwrap();

        match load_dataset(&path).unwrap_err() {
            AuditError::Parse { path: reported, .. } => assert!(reported.ends_with("air.xlsx")),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(matches!(
            load_dataset(dir.path().join("missing.xlsx")).unwrap_err(),
            AuditError::NotFound(_)
        ));
    }

    #[test]
    fn test_json_records() {
        let json = r#"[
            {"PM2_5": 25, "Station": "Delhi", "Calibrated": true},
            {"PM2_5": "75", "Station": null}
        ]"#;
        let dataset = dataset_from_json_str(json).unwrap();

        assert_eq!(dataset.len(), 2);
        assert!(dataset.has_column("Calibrated"));
        let pm: Vec<_> = dataset.column("PM2_5").filter_map(|c| c.as_f64()).collect();
        assert_eq!(pm, vec![25.0, 75.0]);
        assert_eq!(dataset.column("Calibrated").nth(1), Some(&CellValue::Null));
    }

    #[test]
    fn test_load_dataset_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("air.csv");
        fs::write(&csv_path, "PM2_5\n10\n20\n").unwrap();

        let dataset = load_dataset(&csv_path).unwrap();
        assert_eq!(dataset.len(), 2);

        let txt = dir.path().join("air.txt");
        fs::write(&txt, "PM2_5\n10\n").unwrap();
        assert!(matches!(
            load_dataset(&txt).unwrap_err(),
            AuditError::SchemaViolation(_)
        ));

        assert!(matches!(
            load_dataset(dir.path().join("missing.csv")).unwrap_err(),
            AuditError::NotFound(_)
        ));
    }

    #[test]
    fn test_file_sha256_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("air.csv");
        fs::write(&path, "abc").unwrap();

        assert_eq!(
            file_sha256(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
