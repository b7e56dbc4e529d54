//! JSON reporter for the final report

use anyhow::Result;
use shared_types::FinalReport;

pub struct JsonReporter;

impl JsonReporter {
    /// Serialize the full report, every embedded stage report included.
    pub fn format(report: &FinalReport, pretty: bool) -> Result<String> {
        let output = if pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        Ok(output)
    }
}
