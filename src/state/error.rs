//! Error type for local persistence: the manifest and the export files.

use std::path::PathBuf;

use thiserror::Error;

/// Failures reading or writing anything under the base directory.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The manifest exists but could not be read.
    #[error("Failed to read manifest at {path}")]
    ReadManifest {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The manifest was read but is not a JSON array of entry ids.
    #[error("Malformed manifest at {path}")]
    ParseManifest {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Writing or renaming the manifest failed.
    #[error("Failed to write manifest at {path}")]
    WriteManifest {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Checking whether an export file exists failed for a reason other than absence.
    #[error("Failed to inspect {path}")]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write export file {path}")]
    WriteExport {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to remove export file {path}")]
    RemoveExport {
        path: PathBuf,
        source: std::io::Error,
    },
}
