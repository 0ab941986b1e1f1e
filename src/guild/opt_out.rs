//! Participants excluded from color reassignment.
//!
//! Persisted as a JSON array of participant ids in `<key>_opt_out.json`.
//! Every change is written before the call returns; a failed write rolls
//! the in-memory set back so memory and disk never disagree.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::types::UserId;
use crate::utilities::{FileHandler, StoreError};

/// Result of a self-service opt-out or opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptOutChange {
    /// Membership changed and was persisted.
    Changed,
    /// The participant was already in the requested state.
    Unchanged,
    /// Opt-out enforcement is off for the community; nothing was done.
    Disabled,
}

/// Members excluded from raves, persisted as a JSON array of user ids.
#[derive(Debug)]
pub struct OptOutRegistry {
    members: BTreeSet<UserId>,
    files: FileHandler,
    stem: String,
}

impl OptOutRegistry {
    /// Load the registry, creating an empty record when absent or corrupt.
    pub fn load(files: FileHandler, stem: impl Into<String>) -> Result<Self, StoreError> {
        let stem = stem.into();
        let loaded = files.load(&stem, |value: Value| {
            serde_json::from_value::<Vec<UserId>>(value).map_err(|e| e.to_string())
        })?;

        let registry = Self {
            members: loaded.unwrap_or_default().into_iter().collect(),
            files,
            stem,
        };
        if !registry.files.exists(&registry.stem) {
            registry.persist()?;
        }
        Ok(registry)
    }

    /// Whether `id` opted out, regardless of enforcement.
    pub fn contains(&self, id: UserId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Add `id`. Returns `true` if it was newly added.
    pub fn opt_out(&mut self, id: UserId) -> Result<bool, StoreError> {
        if !self.members.insert(id) {
            return Ok(false);
        }
        if let Err(e) = self.persist() {
            self.members.remove(&id);
            return Err(e);
        }
        Ok(true)
    }

    /// Remove `id`. Returns `true` if it was present.
    pub fn opt_in(&mut self, id: UserId) -> Result<bool, StoreError> {
        if !self.members.remove(&id) {
            return Ok(false);
        }
        if let Err(e) = self.persist() {
            self.members.insert(id);
            return Err(e);
        }
        Ok(true)
    }

    fn persist(&self) -> Result<(), StoreError> {
        let ids: Vec<UserId> = self.members.iter().copied().collect();
        self.files.save(&self.stem, &ids)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_missing_record_is_created_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = OptOutRegistry::load(FileHandler::new(dir.path()), "g_opt_out").unwrap();
        assert!(registry.is_empty());
        assert_eq!(fs::read_to_string(dir.path().join("g_opt_out.json")).unwrap(), "[]");
    }

    #[test]
    fn test_opt_out_is_idempotent_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileHandler::new(dir.path());
        let mut registry = OptOutRegistry::load(files.clone(), "g_opt_out").unwrap();

        assert!(registry.opt_out(UserId(5)).unwrap());
        assert!(!registry.opt_out(UserId(5)).unwrap());
        assert!(registry.contains(UserId(5)));

        let reloaded = OptOutRegistry::load(files.clone(), "g_opt_out").unwrap();
        assert!(reloaded.contains(UserId(5)));

        assert!(registry.opt_in(UserId(5)).unwrap());
        assert!(!registry.opt_in(UserId(5)).unwrap());
        let reloaded = OptOutRegistry::load(files, "g_opt_out").unwrap();
        assert!(!reloaded.contains(UserId(5)));
    }

    #[test]
    fn test_corrupt_record_is_archived() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("g_opt_out.json"), "[1, 2,").unwrap();
        let registry = OptOutRegistry::load(FileHandler::new(dir.path()), "g_opt_out").unwrap();
        assert!(registry.is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("g_opt_out_old.json")).unwrap(),
            "[1, 2,"
        );
        assert!(dir.path().join("g_opt_out.json").exists());
    }
}
