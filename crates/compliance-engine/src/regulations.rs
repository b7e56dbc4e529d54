//! Regulation Store
//!
//! Loads one JSON document per agency from a directory and indexes it by
//! agency key. The store is read-only once built; `RegulationCache` gives a
//! process a single shared instance behind a one-time initialisation barrier.
//!
//! Document shape:
//!
//! ```json
//! {
//!   "agency_name": "Central Pollution Control Board",
//!   "standards": {
//!     "air_quality": [
//!       {
//!         "parameter_id": "PM2_5",
//!         "aqi_categories": [{"min": 0, "max": 30, "category": "Good"}],
//!         "naaqs_standards": [{"averaging_time": "24 hours", "level": 35}]
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! The agency key is the file stem, unless the document wraps its body in a
//! single top-level key (`{"cpcb_standards": {"standards": ...}}`), in which
//! case that key is used.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::error::{AuditError, Result};

lazy_static! {
    /// Hour-based averaging windows: "24 hours", "8-hour", "1 hr", "24h"
    static ref HOUR_WINDOW_PATTERN: Regex =
        Regex::new(r"(?i)^\s*(\d+)\s*-?\s*(?:hours?|hrs?|h)\s*$").unwrap();
}

/// One contiguous value range mapped to a named tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBin {
    pub min: f64,
    /// `None` marks the open-ended top tier.
    #[serde(default)]
    pub max: Option<f64>,
    pub category: String,
}

impl CategoryBin {
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && self.max.map_or(true, |max| value <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AveragingWindow {
    OneHour,
    EightHours,
    TwentyFourHours,
    Other(String),
}

impl AveragingWindow {
    pub fn parse(raw: &str) -> Self {
        let hours = HOUR_WINDOW_PATTERN
            .captures(raw)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok());

        match hours {
            Some(1) => AveragingWindow::OneHour,
            Some(8) => AveragingWindow::EightHours,
            Some(24) => AveragingWindow::TwentyFourHours,
            _ => AveragingWindow::Other(raw.trim().to_string()),
        }
    }

    /// Only the 1-, 8- and 24-hour windows take part in violation checks.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, AveragingWindow::Other(_))
    }

    pub fn label(&self) -> &str {
        match self {
            AveragingWindow::OneHour => "1 hour",
            AveragingWindow::EightHours => "8 hours",
            AveragingWindow::TwentyFourHours => "24 hours",
            AveragingWindow::Other(s) => s,
        }
    }
}

impl From<String> for AveragingWindow {
    fn from(s: String) -> Self {
        AveragingWindow::parse(&s)
    }
}

impl From<AveragingWindow> for String {
    fn from(window: AveragingWindow) -> Self {
        window.label().to_string()
    }
}

/// A NAAQS-style limit for one averaging window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRecord {
    #[serde(rename = "averaging_time")]
    pub averaging_window: AveragingWindow,
    #[serde(deserialize_with = "deserialize_level")]
    pub level: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
}

impl ThresholdRecord {
    pub fn is_exceeded_by(&self, value: f64) -> bool {
        self.averaging_window.is_recognized() && value > self.level
    }
}

fn deserialize_level<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Level {
        Number(f64),
        Text(String),
    }

    match Level::deserialize(deserializer)? {
        Level::Number(n) => Ok(n),
        Level::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("non-numeric level '{}'", s))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RuleKind {
    Category,
    Violation,
}

/// How a single parameter is classified.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassificationRule {
    /// Ordered bins; first match wins.
    Category { bins: Vec<CategoryBin> },
    /// Any recognised window exceeded flags a violation.
    Violation { thresholds: Vec<ThresholdRecord> },
}

impl ClassificationRule {
    pub fn kind(&self) -> RuleKind {
        match self {
            ClassificationRule::Category { .. } => RuleKind::Category,
            ClassificationRule::Violation { .. } => RuleKind::Violation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterStandard {
    pub parameter_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub rule: ClassificationRule,
}

/// All air-quality standards of one agency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegulationSet {
    pub agency_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Vec<ParameterStandard>,
}

#[derive(Deserialize)]
struct RegulationDocument {
    #[serde(default)]
    agency_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    standards: StandardsSection,
}

#[derive(Deserialize)]
struct StandardsSection {
    #[serde(default)]
    air_quality: Vec<ParameterEntry>,
}

#[derive(Deserialize)]
struct ParameterEntry {
    #[serde(default)]
    parameter_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    aqi_categories: Vec<CategoryBin>,
    #[serde(default)]
    naaqs_standards: Vec<ThresholdRecord>,
}

impl RegulationSet {
    /// Parse a regulation document. `default_key` is used unless the document
    /// wraps its body in a single agency key.
    pub fn from_json(default_key: &str, json: &str) -> Result<Self> {
        let parse_error = |message: String| AuditError::Parse {
            path: default_key.to_string(),
            message,
        };

        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| parse_error(e.to_string()))?;

        let (agency_key, body) = if value.get("standards").is_some() {
            (default_key.to_string(), value)
        } else {
            match value {
                serde_json::Value::Object(map) if map.len() == 1 => map
                    .into_iter()
                    .next()
                    .ok_or_else(|| parse_error("empty document".to_string()))?,
                _ => {
                    return Err(parse_error(
                        "expected an object with a 'standards' section".to_string(),
                    ))
                }
            }
        };

        let document: RegulationDocument =
            serde_json::from_value(body).map_err(|e| parse_error(e.to_string()))?;

        Ok(document.into_set(agency_key))
    }

    pub fn parameter_ids(&self) -> BTreeSet<String> {
        self.parameters
            .iter()
            .map(|p| p.parameter_id.clone())
            .collect()
    }

    pub fn parameter(&self, parameter_id: &str) -> Option<&ParameterStandard> {
        self.parameters
            .iter()
            .find(|p| p.parameter_id == parameter_id)
    }

    /// Agencies with at least one category rule get a scalar compliance score.
    pub fn scores_by_category(&self) -> bool {
        self.parameters
            .iter()
            .any(|p| p.rule.kind() == RuleKind::Category)
    }
}

impl RegulationDocument {
    fn into_set(self, agency_key: String) -> RegulationSet {
        let mut parameters = Vec::new();

        for entry in self.standards.air_quality {
            let Some(parameter_id) = entry.parameter_id else {
                debug!("Skipping {} standard without parameter_id", agency_key);
                continue;
            };

            // Bins take precedence when a parameter carries both rule kinds
            let rule = if !entry.aqi_categories.is_empty() {
                ClassificationRule::Category {
                    bins: entry.aqi_categories,
                }
            } else if !entry.naaqs_standards.is_empty() {
                ClassificationRule::Violation {
                    thresholds: entry.naaqs_standards,
                }
            } else {
                ClassificationRule::Category { bins: Vec::new() }
            };

            parameters.push(ParameterStandard {
                parameter_id,
                name: entry.name,
                unit: entry.unit,
                rule,
            });
        }

        RegulationSet {
            agency_key,
            agency_name: self.agency_name,
            description: self.description,
            parameters,
        }
    }
}

/// A document that could not be loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedDocument {
    pub file: PathBuf,
    pub reason: String,
}

/// Regulation sets indexed by agency key.
#[derive(Debug, Clone, Default)]
pub struct RegulationStore {
    sets: HashMap<String, RegulationSet>,
    skipped: Vec<SkippedDocument>,
}

impl RegulationStore {
    /// Load every `*.json` document in `dir`.
    ///
    /// Never fails: unreadable or malformed documents are skipped with a
    /// warning and recorded in [`RegulationStore::skipped`].
    pub fn load(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let mut store = RegulationStore::default();

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Regulations directory not readable at '{}': {}",
                    dir.display(),
                    e
                );
                return store;
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().map_or(false, |ext| ext == "json"))
            .collect();
        files.sort();

        for path in files {
            match load_document(&path) {
                Ok(set) => {
                    info!(
                        agency = %set.agency_key,
                        parameters = set.parameters.len(),
                        "Loaded regulation document {}",
                        path.display()
                    );
                    store.insert(set, &path);
                }
                Err(e) => {
                    warn!("Skipping regulation document {}: {}", path.display(), e);
                    store.skipped.push(SkippedDocument {
                        file: path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if store.is_empty() {
            warn!(
                "No regulations were loaded from '{}'. Check the directory and file contents.",
                dir.display()
            );
        } else {
            info!(agencies = store.len(), "Regulation store initialized");
        }

        store
    }

    /// Build a store from already-parsed sets.
    pub fn from_sets(sets: impl IntoIterator<Item = RegulationSet>) -> Self {
        let mut store = RegulationStore::default();
        for set in sets {
            store.insert(set, Path::new("<memory>"));
        }
        store
    }

    fn insert(&mut self, set: RegulationSet, source: &Path) {
        if self.sets.contains_key(&set.agency_key) {
            warn!(
                "Duplicate agency key '{}' in {}; keeping the first document",
                set.agency_key,
                source.display()
            );
            self.skipped.push(SkippedDocument {
                file: source.to_path_buf(),
                reason: format!("duplicate agency key '{}'", set.agency_key),
            });
            return;
        }
        self.sets.insert(set.agency_key.clone(), set);
    }

    /// Look up an agency. Unknown keys yield `None`, never an error.
    pub fn get(&self, agency_key: &str) -> Option<&RegulationSet> {
        self.sets.get(agency_key)
    }

    pub fn agency_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.sets.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn skipped(&self) -> &[SkippedDocument] {
        &self.skipped
    }
}

fn load_document(path: &Path) -> Result<RegulationSet> {
    let content = fs::read_to_string(path).map_err(|e| AuditError::io(path, e))?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    RegulationSet::from_json(&stem, &content).map_err(|e| match e {
        AuditError::Parse { message, .. } => AuditError::Parse {
            path: path.display().to_string(),
            message,
        },
        other => other,
    })
}

/// Shared, lazily-populated regulation store.
///
/// The first `get_or_load` call loads the directory; every later call returns
/// the same store, whatever directory it is given. A first load from a
/// missing or unreadable directory caches the empty store for the life of
/// the cache. Safe to share between threads; concurrent first calls load
/// exactly once.
#[derive(Debug, Default)]
pub struct RegulationCache {
    store: OnceLock<RegulationStore>,
}

impl RegulationCache {
    pub const fn new() -> Self {
        Self {
            store: OnceLock::new(),
        }
    }

    pub fn get_or_load(&self, dir: impl AsRef<Path>) -> &RegulationStore {
        if let Some(store) = self.store.get() {
            debug!(
                "Regulation store already loaded; ignoring '{}'",
                dir.as_ref().display()
            );
            return store;
        }
        self.store.get_or_init(|| {
            let store = RegulationStore::load(&dir);
            if store.is_empty() {
                warn!(
                    "No regulations loaded from '{}'; the empty store stays cached",
                    dir.as_ref().display()
                );
            }
            store
        })
    }

    pub fn get(&self) -> Option<&RegulationStore> {
        self.store.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.store.get().is_some()
    }
}
