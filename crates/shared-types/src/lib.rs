pub mod dataset;
pub mod types;

pub use dataset::{CellValue, Dataset, Row};
pub use types::{
    new_audit_id, timestamp_now, ClassificationReport, ComponentScores, ExplainabilityReport,
    FinalReport, Grade, PerformanceReport, ReportStatus, ValidationReport,
};
