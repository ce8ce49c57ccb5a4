use std::path::PathBuf;
use thiserror::Error;

use crate::check::CheckReport;

/// The main error type for riceprep operations.
///
/// Per-file problems (an unreadable image, a corrupt per-image JSON, a
/// missing category directory) are deliberately *not* errors: they are
/// recorded in the operation's report and processing continues. Only
/// conditions that make a whole run meaningless end up here.
#[derive(Debug, Error)]
pub enum RiceprepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse labelmap from {path}: {source}")]
    LabelmapParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid labelmap at {path}: {message}")]
    LabelmapInvalid { path: PathBuf, message: String },

    #[error("Failed to parse COCO manifest from {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write COCO manifest to {path}: {source}")]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write CSV to {path}: {source}")]
    CsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid split ratios: {message}")]
    InvalidSplitRatios { message: String },

    #[error("Check failed with {error_count} error(s) and {warning_count} warning(s)")]
    CheckFailed {
        error_count: usize,
        warning_count: usize,
        report: CheckReport,
    },
}
