//! JSON record files with atomic replacement and corruption archiving.
//!
//! Every community owns a handful of records under one data directory. A
//! record that fails to parse is renamed to the first free
//! `<stem>_old.json` / `<stem>_oldN.json` name and treated as absent, so a
//! corrupt file never blocks startup and is never overwritten.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::utilities::errors::StoreError;
use crate::utilities::paths::{archive_path, record_path};

/// Reads and writes JSON records in one directory.
#[derive(Debug, Clone)]
pub struct FileHandler {
    /// Directory for record storage.
    directory: PathBuf,
}

impl FileHandler {
    /// Create a handler for `directory`. The directory is created lazily on
    /// first write.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the record named `stem`.
    pub fn path(&self, stem: &str) -> PathBuf {
        record_path(&self.directory, stem)
    }

    /// Check if a record exists.
    pub fn exists(&self, stem: &str) -> bool {
        self.path(stem).exists()
    }

    /// Load and decode a record.
    ///
    /// Returns `Ok(None)` when the record is absent, or when it was corrupt
    /// (not JSON, or rejected by `decode`) and has been archived.
    pub fn load<T>(
        &self,
        stem: &str,
        decode: impl FnOnce(Value) -> Result<T, String>,
    ) -> Result<Option<T>, StoreError> {
        let path = self.path(stem);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        let decoded = serde_json::from_str::<Value>(&content)
            .map_err(|e| e.to_string())
            .and_then(decode);

        match decoded {
            Ok(value) => Ok(Some(value)),
            Err(reason) => {
                let archived = self.archive(stem)?;
                tracing::warn!(
                    record = %path.display(),
                    archived = %archived.display(),
                    %reason,
                    "corrupt record archived, reinitializing"
                );
                Ok(None)
            }
        }
    }

    /// Serialize `data` and atomically replace the record.
    ///
    /// The JSON is written to a temporary file in the same directory and
    /// renamed over the record, so readers see either the old or the new
    /// document and never a partial one.
    pub fn save<T: Serialize + ?Sized>(&self, stem: &str, data: &T) -> Result<(), StoreError> {
        let path = self.path(stem);
        fs::create_dir_all(&self.directory).map_err(|e| StoreError::io(&self.directory, e))?;

        let content = serde_json::to_vec_pretty(data).map_err(|source| StoreError::Serialize {
            path: path.clone(),
            source,
        })?;

        let mut tmp =
            NamedTempFile::new_in(&self.directory).map_err(|e| StoreError::io(&self.directory, e))?;
        tmp.write_all(&content)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(&path).map_err(|source| StoreError::Persist {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(record = %path.display(), "record persisted");
        Ok(())
    }

    /// Rename the record to the first unused archive name and return it.
    pub fn archive(&self, stem: &str) -> Result<PathBuf, StoreError> {
        let source = self.path(stem);
        let target = (0..)
            .map(|attempt| archive_path(&self.directory, stem, attempt))
            .find(|candidate| !candidate.exists())
            .unwrap_or_else(|| archive_path(&self.directory, stem, usize::MAX));
        fs::rename(&source, &target).map_err(|e| StoreError::io(&source, e))?;
        Ok(target)
    }
}
