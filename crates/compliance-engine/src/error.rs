//! Error taxonomy for the audit core
//!
//! Stages report their own failures as status-tagged reports; these errors
//! only surface from loaders and collaborators, and are folded back into
//! report data before aggregation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Upstream {stage} stage reported {status}: {message}")]
    UpstreamFailure {
        stage: &'static str,
        status: shared_types::ReportStatus,
        message: String,
    },

    #[error("{collaborator} failed: {message}")]
    CollaboratorFailure {
        collaborator: &'static str,
        message: String,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

impl AuditError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            AuditError::NotFound(format!("File not found at path: {}", path.display()))
        } else {
            AuditError::Io {
                path: path.display().to_string(),
                source,
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
