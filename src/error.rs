use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for labelconf operations.
#[derive(Debug, Error)]
pub enum LabelConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse labeling config: {message}")]
    ConfigParse { message: String },

    #[error("Labeling config does not match the tag grammar ({} error(s)):\n{report}", report.error_count())]
    Grammar { report: ValidationReport },

    #[error("Labeling config has duplicate tag names: {}", names.join(", "))]
    DuplicateNames { names: Vec<String> },

    #[error("toName=\"{to_name}\" not found in names: {}", known.join(", "))]
    UnknownToName { to_name: String, known: Vec<String> },

    #[error("Tag '{name}' not found in labeling config")]
    TagNotFound { name: String },

    #[error("Labeling config has {count} {kind} tags; a name is required to pick one")]
    AmbiguousTag { kind: &'static str, count: usize },

    #[error("JSON schema export is not supported for control '{name}' ({kind})")]
    UnsupportedSchema { name: String, kind: String },

    #[error("Invalid task: {message}")]
    InvalidTask { message: String },

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse JSON from {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },
}

impl From<roxmltree::Error> for LabelConfigError {
    fn from(source: roxmltree::Error) -> Self {
        LabelConfigError::ConfigParse {
            message: source.to_string(),
        }
    }
}
