//! Typed per-community settings and their persisted record form.
//!
//! The record is a JSON array of `[name, value]` pairs. Order does not
//! matter, unknown names are ignored and missing names keep their defaults.
//! A value of the wrong type for a known name is skipped with a warning.

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::color::{Blacklist, Tolerance};

// Record names.
pub const COOLDOWN: &str = "cooldown";
pub const GLOBAL_COOLDOWN: &str = "global_cooldown";
pub const CHECK_ROLE: &str = "check_role";
pub const ROLE_NAME: &str = "role_name";
pub const MOVE_ROLE: &str = "move_role";
pub const ROLE_OFFSET: &str = "role_offset";
pub const CHECK_OPT_OUT: &str = "check_opt_out";
pub const ENABLED: &str = "enabled";
pub const TOLERANCE: &str = "tolerance";
pub const BLACKLIST: &str = "blacklist";

pub const DEFAULT_ROLE_NAME: &str = "Server Booster";
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(3);

/// Configuration of one community.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Length of a cooldown window.
    pub cooldown: Duration,
    /// One window for the whole community instead of one per participant.
    pub global_cooldown: bool,
    /// Only holders of `role_name` rave, and the rave recolors that role.
    pub check_role: bool,
    pub role_name: String,
    /// Reposition newly created per-author roles by `role_offset`.
    pub move_role: bool,
    pub role_offset: i64,
    /// Honor the opt-out registry.
    pub check_opt_out: bool,
    pub enabled: bool,
    /// Tolerance applied to new blacklist entries that do not name one.
    pub tolerance: Tolerance,
    pub blacklist: Blacklist,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            global_cooldown: true,
            check_role: true,
            role_name: DEFAULT_ROLE_NAME.to_string(),
            move_role: false,
            role_offset: 0,
            check_opt_out: true,
            enabled: true,
            tolerance: Tolerance::default(),
            blacklist: Blacklist::default(),
        }
    }
}

impl Settings {
    /// Encode as `[name, value]` pairs.
    pub fn to_record(&self) -> Vec<(String, Value)> {
        vec![
            (COOLDOWN.to_string(), json!(self.cooldown.as_secs())),
            (GLOBAL_COOLDOWN.to_string(), json!(self.global_cooldown)),
            (CHECK_ROLE.to_string(), json!(self.check_role)),
            (ROLE_NAME.to_string(), json!(self.role_name)),
            (MOVE_ROLE.to_string(), json!(self.move_role)),
            (ROLE_OFFSET.to_string(), json!(self.role_offset)),
            (CHECK_OPT_OUT.to_string(), json!(self.check_opt_out)),
            (ENABLED.to_string(), json!(self.enabled)),
            (TOLERANCE.to_string(), json!(self.tolerance)),
            (BLACKLIST.to_string(), json!(self.blacklist)),
        ]
    }

    /// Decode a record. Fails only when the document does not have the
    /// pair-array shape; individual bad values fall back to defaults.
    pub fn from_record(record: Value) -> Result<Self, String> {
        let Value::Array(items) = record else {
            return Err("settings record is not an array".to_string());
        };

        let mut settings = Self::default();
        for item in items {
            let (name, value) = match item {
                Value::Array(mut pair) if pair.len() == 2 => {
                    let value = pair.pop().unwrap_or(Value::Null);
                    match pair.pop() {
                        Some(Value::String(name)) => (name, value),
                        _ => return Err("setting name is not a string".to_string()),
                    }
                }
                other => return Err(format!("malformed setting entry {other}")),
            };
            settings.apply(&name, value);
        }
        Ok(settings)
    }

    fn apply(&mut self, name: &str, value: Value) {
        match name {
            COOLDOWN => assign(name, value, |secs: u64| self.cooldown = Duration::from_secs(secs)),
            GLOBAL_COOLDOWN => assign(name, value, |v: bool| self.global_cooldown = v),
            CHECK_ROLE => assign(name, value, |v: bool| self.check_role = v),
            ROLE_NAME => assign(name, value, |v: String| self.role_name = v),
            MOVE_ROLE => assign(name, value, |v: bool| self.move_role = v),
            ROLE_OFFSET => assign(name, value, |v: i64| self.role_offset = v),
            CHECK_OPT_OUT => assign(name, value, |v: bool| self.check_opt_out = v),
            ENABLED => assign(name, value, |v: bool| self.enabled = v),
            TOLERANCE => assign(name, value, |v: Tolerance| self.tolerance = v),
            BLACKLIST => assign(name, value, |v: Blacklist| self.blacklist = v),
            unknown => tracing::debug!(setting = unknown, "ignoring unknown setting"),
        }
    }
}

fn assign<T: DeserializeOwned>(name: &str, value: Value, set: impl FnOnce(T)) {
    match serde_json::from_value::<T>(value) {
        Ok(parsed) => set(parsed),
        Err(e) => tracing::warn!(setting = name, error = %e, "invalid setting value, keeping default"),
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rave: {}", on_off(self.enabled))?;
        writeln!(
            f,
            "cooldown: {}s ({})",
            self.cooldown.as_secs(),
            if self.global_cooldown { "global" } else { "per user" }
        )?;
        writeln!(f, "role check: {} (role \"{}\")", on_off(self.check_role), self.role_name)?;
        writeln!(f, "move role: {} (offset {})", on_off(self.move_role), self.role_offset)?;
        writeln!(f, "opt-out check: {}", on_off(self.check_opt_out))?;
        write!(
            f,
            "blacklist: {} entries (default tolerance {})",
            self.blacklist.len(),
            self.tolerance
        )
    }
}
