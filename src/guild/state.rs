//! The per-community aggregate: settings, opt-out registry and cooldowns.

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::guild::cooldown::{CooldownController, CooldownScope};
use crate::guild::opt_out::{OptOutChange, OptOutRegistry};
use crate::guild::settings::Settings;
use crate::types::{GuildId, GuildRef, RoleId, UserId};
use crate::utilities::paths::guild_key;
use crate::utilities::{FileHandler, StoreError};

/// Everything the engine and the command handlers know about one community.
///
/// Settings and the opt-out registry sit behind one configuration mutex;
/// cooldowns have their own. Both records are written only through this
/// aggregate, which serializes writers.
#[derive(Debug)]
pub struct GuildState {
    id: GuildId,
    key: String,
    cooldown: CooldownController,
    config: Mutex<GuildConfig>,
    created_roles: Mutex<HashSet<RoleId>>,
}

#[derive(Debug)]
struct GuildConfig {
    settings: Settings,
    opt_outs: OptOutRegistry,
    files: FileHandler,
}

impl GuildState {
    /// Load (or initialize) the records of `guild` from `files`.
    ///
    /// Absent records are created with defaults; corrupt ones are archived
    /// first.
    pub fn load(guild: &GuildRef, files: FileHandler) -> Result<Self, StoreError> {
        let key = guild_key(guild.id, &guild.name);

        let settings = match files.load(&key, Settings::from_record)? {
            Some(settings) => settings,
            None => {
                let settings = Settings::default();
                files.save(&key, &settings.to_record())?;
                tracing::info!(guild = %guild.id, key = %key, "initialized default settings");
                settings
            }
        };
        let opt_outs = OptOutRegistry::load(files.clone(), format!("{key}_opt_out"))?;

        Ok(Self {
            id: guild.id,
            key,
            cooldown: CooldownController::new(),
            config: Mutex::new(GuildConfig {
                settings,
                opt_outs,
                files,
            }),
            created_roles: Mutex::new(HashSet::new()),
        })
    }

    pub fn id(&self) -> GuildId {
        self.id
    }

    /// File-safe key the community's records are stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn cooldown(&self) -> &CooldownController {
        &self.cooldown
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> Settings {
        self.config.lock().settings.clone()
    }

    /// Apply `edit` to a copy of the settings and persist it.
    ///
    /// The change only becomes visible once the record is written; on a
    /// write failure the previous settings stay in effect.
    pub fn update_settings<R>(&self, edit: impl FnOnce(&mut Settings) -> R) -> Result<R, StoreError> {
        let mut config = self.config.lock();
        let mut next = config.settings.clone();
        let result = edit(&mut next);
        config.files.save(&self.key, &next.to_record())?;
        config.settings = next;
        Ok(result)
    }

    /// Whether the participant's window (per the current mode) is open.
    pub fn is_on_cooldown(&self, user: UserId) -> bool {
        let global = self.config.lock().settings.global_cooldown;
        self.cooldown.is_on_cooldown(CooldownScope::for_mode(global, user))
    }

    /// Opted out and enforcement is on.
    pub fn is_opted_out(&self, user: UserId) -> bool {
        let config = self.config.lock();
        config.settings.check_opt_out && config.opt_outs.contains(user)
    }

    /// Add `user` to the opt-out registry, if enforcement is on.
    pub fn opt_out(&self, user: UserId) -> Result<OptOutChange, StoreError> {
        let mut config = self.config.lock();
        if !config.settings.check_opt_out {
            return Ok(OptOutChange::Disabled);
        }
        Ok(change(config.opt_outs.opt_out(user)?))
    }

    /// Remove `user` from the opt-out registry, if enforcement is on.
    pub fn opt_in(&self, user: UserId) -> Result<OptOutChange, StoreError> {
        let mut config = self.config.lock();
        if !config.settings.check_opt_out {
            return Ok(OptOutChange::Disabled);
        }
        Ok(change(config.opt_outs.opt_in(user)?))
    }

    pub fn opted_out_count(&self) -> usize {
        self.config.lock().opt_outs.len()
    }

    /// Remember a per-author role the engine created in this process.
    pub fn record_created_role(&self, role: RoleId) {
        self.created_roles.lock().insert(role);
    }

    /// Whether the engine created `role` in this process.
    pub fn created_role(&self, role: RoleId) -> bool {
        self.created_roles.lock().contains(&role)
    }
}

fn change(changed: bool) -> OptOutChange {
    if changed {
        OptOutChange::Changed
    } else {
        OptOutChange::Unchanged
    }
}
