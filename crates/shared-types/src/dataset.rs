//! In-memory tabular dataset
//!
//! Rows map column names to cells. Column order is kept only for display and
//! for "first column" style lookups; presence checks treat columns as a set.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Parse a raw text cell (CSV input). Empty cells are null.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            return CellValue::Number(n);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => CellValue::Bool(true),
            "false" => CellValue::Bool(false),
            _ => CellValue::Text(raw.to_string()),
        }
    }

    /// Numeric coercion. Null, NaN and non-numeric text do not coerce.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if !n.is_nan() => Some(*n),
            CellValue::Number(_) | CellValue::Null => None,
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

pub type Row = HashMap<String, CellValue>;

static NULL_CELL: CellValue = CellValue::Null;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a dataset column-by-column. Shorter columns are padded with nulls.
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<CellValue>)>,
        S: Into<String>,
    {
        let mut dataset = Dataset::default();
        for (name, values) in columns {
            dataset.add_column(name, values);
        }
        dataset
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_set(&self) -> BTreeSet<String> {
        self.columns.iter().cloned().collect()
    }

    pub fn push_row(&mut self, row: Row) {
        for key in row.keys() {
            if !self.has_column(key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    /// Iterate one column top to bottom; missing cells read as null.
    pub fn column<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a CellValue> + 'a {
        self.rows
            .iter()
            .map(move |row| row.get(name).unwrap_or(&NULL_CELL))
    }

    /// Append (or overwrite) a column. Rows are created as needed.
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<CellValue>) {
        let name = name.into();
        if !self.has_column(&name) {
            self.columns.push(name.clone());
        }
        while self.rows.len() < values.len() {
            self.rows.push(Row::new());
        }
        let mut values = values.into_iter();
        for row in self.rows.iter_mut() {
            row.insert(name.clone(), values.next().unwrap_or(CellValue::Null));
        }
    }
}
