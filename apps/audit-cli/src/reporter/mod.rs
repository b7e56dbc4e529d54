//! Final report rendering
//!
//! # Output Formats
//!
//! - **Console**: human-readable summary with per-stage status
//! - **JSON**: the full `FinalReport`, compact or pretty-printed
//!
//! # Example
//!
//! ```no_run
//! use audit_cli::reporter::{OutputFormat, Reporter};
//! use shared_types::FinalReport;
//!
//! # fn example(report: FinalReport) -> anyhow::Result<()> {
//! Reporter::new(OutputFormat::Console).report(&report)?;
//!
//! // Or write to a file
//! Reporter::new(OutputFormat::JsonPretty).write_to_file(&report, "final_report.json")?;
//! # Ok(())
//! # }
//! ```

mod console;
mod json;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shared_types::FinalReport;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

pub use console::ConsoleReporter;
pub use json::JsonReporter;

/// Output format for the final report
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Console,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print the report to stdout
    pub fn report(&self, report: &FinalReport) -> Result<()> {
        let output = self.format_report(report)?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(output.as_bytes())?;
        if !output.ends_with('\n') {
            writeln!(stdout)?;
        }
        stdout.flush()?;
        Ok(())
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, report: &FinalReport, path: P) -> Result<()> {
        let path = path.as_ref();
        let output = self.format_report(report)?;
        fs::write(path, output)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        Ok(())
    }

    pub fn format_report(&self, report: &FinalReport) -> Result<String> {
        match self.format {
            OutputFormat::Console => ConsoleReporter::format(report),
            OutputFormat::Json => JsonReporter::format(report, false),
            OutputFormat::JsonPretty => JsonReporter::format(report, true),
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}
