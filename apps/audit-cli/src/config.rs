//! Configuration for audit runs
//!
//! An optional TOML file supplies defaults; command-line flags override it.
//!
//! ```toml
//! [audit]
//! regulations_dir = "regulations"
//! agency = "cpcb_standards"
//! dataset = "data/air.csv"
//! model_features = ["PM2_5", "PM10"]
//! performance_report = "reports/performance.json"
//! explainability_report = "reports/xai.json"
//!
//! [output]
//! format = "console"     # console | json | json-pretty
//! path = "reports/final.json"
//! narrative = "template" # template | disabled
//! ```

use anyhow::{bail, Context};
use compliance_engine::AuditRequest;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::reporter::OutputFormat;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML is malformed
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    /// Apply command-line overrides on top of file values.
    pub fn merge(mut self, overrides: Overrides) -> Self {
        let audit = &mut self.audit;
        if let Some(dir) = overrides.regulations_dir {
            audit.regulations_dir = dir;
        }
        if overrides.agency.is_some() {
            audit.agency = overrides.agency;
        }
        if overrides.dataset.is_some() {
            audit.dataset = overrides.dataset;
        }
        if overrides.model_features.is_some() {
            audit.model_features = overrides.model_features;
        }
        if overrides.performance_report.is_some() {
            audit.performance_report = overrides.performance_report;
        }
        if overrides.explainability_report.is_some() {
            audit.explainability_report = overrides.explainability_report;
        }

        let output = &mut self.output;
        if let Some(format) = overrides.format {
            output.format = format;
        }
        if overrides.output_path.is_some() {
            output.path = overrides.output_path;
        }
        if overrides.no_narrative {
            output.narrative = NarrativeMode::Disabled;
        }
        self
    }

    /// Build the pipeline request. Dataset and agency are mandatory.
    pub fn audit_request(&self) -> anyhow::Result<AuditRequest> {
        let Some(dataset) = &self.audit.dataset else {
            bail!("No dataset given. Pass --dataset or set audit.dataset in the config file");
        };
        let Some(agency) = &self.audit.agency else {
            bail!("No agency given. Pass --agency or set audit.agency in the config file");
        };

        let mut request = AuditRequest::new(dataset.clone(), agency.clone());
        request.model_features = self.audit.model_features.clone();
        Ok(request)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Directory of regulation documents (default: `regulations`)
    #[serde(default = "default_regulations_dir")]
    pub regulations_dir: PathBuf,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub dataset: Option<PathBuf>,
    /// Columns the model was trained on; defaults to every dataset column
    #[serde(default)]
    pub model_features: Option<Vec<String>>,
    #[serde(default)]
    pub performance_report: Option<PathBuf>,
    #[serde(default)]
    pub explainability_report: Option<PathBuf>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            regulations_dir: default_regulations_dir(),
            agency: None,
            dataset: None,
            model_features: None,
            performance_report: None,
            explainability_report: None,
        }
    }
}

fn default_regulations_dir() -> PathBuf {
    PathBuf::from("regulations")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Write the report here instead of stdout
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub narrative: NarrativeMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeMode {
    #[default]
    Template,
    Disabled,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub regulations_dir: Option<PathBuf>,
    pub agency: Option<String>,
    pub dataset: Option<PathBuf>,
    pub model_features: Option<Vec<String>>,
    pub performance_report: Option<PathBuf>,
    pub explainability_report: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub output_path: Option<PathBuf>,
    pub no_narrative: bool,
}
