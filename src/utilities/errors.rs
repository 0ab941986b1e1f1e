//! Error types for record persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading, writing or archiving a persisted record.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure on a record path.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The record could not be serialized.
    #[error("failed to serialize record {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The temporary file could not be moved over the record.
    #[error("failed to replace record {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
