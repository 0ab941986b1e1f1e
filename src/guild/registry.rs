//! Process-wide table of community aggregates.

use std::sync::Arc;

use dashmap::DashMap;

use crate::guild::state::GuildState;
use crate::types::{GuildId, GuildRef};
use crate::utilities::{FileHandler, StoreError};

/// Lazily builds and caches one [`GuildState`] per community.
///
/// Construction happens while holding the map shard's write lock, so
/// simultaneous first events for the same community load its records once.
/// Entries live for the rest of the process.
#[derive(Debug)]
pub struct GuildRegistry {
    guilds: DashMap<GuildId, Arc<GuildState>>,
    files: FileHandler,
}

impl GuildRegistry {
    /// Create an empty registry storing records through `files`.
    pub fn new(files: FileHandler) -> Self {
        Self {
            guilds: DashMap::new(),
            files,
        }
    }

    /// Return the community's aggregate, loading it on first use.
    pub fn resolve(&self, guild: &GuildRef) -> Result<Arc<GuildState>, StoreError> {
        if let Some(state) = self.guilds.get(&guild.id) {
            return Ok(Arc::clone(state.value()));
        }

        let entry = self.guilds.entry(guild.id).or_try_insert_with(|| {
            tracing::debug!(guild = %guild.id, name = %guild.name, "resolving community");
            GuildState::load(guild, self.files.clone()).map(Arc::new)
        })?;
        Ok(Arc::clone(entry.value()))
    }

    /// The aggregate if it was already resolved in this process.
    pub fn get(&self, id: GuildId) -> Option<Arc<GuildState>> {
        self.guilds.get(&id).map(|state| Arc::clone(state.value()))
    }

    pub fn len(&self) -> usize {
        self.guilds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guilds.is_empty()
    }
}
