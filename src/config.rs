//! Process configuration, read from the environment.
//!
//! - `ROLERAVE_BOT_ID` (required): the bot's own user id
//! - `ROLERAVE_DATA_DIR`: directory of per-community records (default `data`)
//! - `ROLERAVE_PREFIX`: command marker (default `!`)
//! - `ROLERAVE_RELAY_URL`: transport relay base URL; unset means dry run
//! - `PORT`: HTTP ingress port (default 8080)

use std::path::PathBuf;

use thiserror::Error;

use crate::types::UserId;

pub const BOT_ID_VAR: &str = "ROLERAVE_BOT_ID";
pub const DATA_DIR_VAR: &str = "ROLERAVE_DATA_DIR";
pub const PREFIX_VAR: &str = "ROLERAVE_PREFIX";
pub const RELAY_URL_VAR: &str = "ROLERAVE_RELAY_URL";
pub const PORT_VAR: &str = "PORT";

#[derive(Debug, Error, PartialEq, Eq)]
/// Environment bootstrap failures.
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{var} has an invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Settings of one bot process.
pub struct BotConfig {
    pub bot_id: UserId,
    pub data_dir: PathBuf,
    pub prefix: String,
    pub relay_url: Option<String>,
    pub port: u16,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_id: UserId(0),
            data_dir: PathBuf::from("data"),
            prefix: "!".to_string(),
            relay_url: None,
            port: 8080,
        }
    }
}

impl BotConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let raw_id = get(BOT_ID_VAR).ok_or(ConfigError::Missing(BOT_ID_VAR))?;
        let bot_id = raw_id.parse().map(UserId).map_err(|_| ConfigError::Invalid {
            var: BOT_ID_VAR,
            value: raw_id.clone(),
        })?;

        let port = match get(PORT_VAR) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: PORT_VAR,
                value: raw.clone(),
            })?,
            None => defaults.port,
        };

        Ok(Self {
            bot_id,
            data_dir: get(DATA_DIR_VAR).map(PathBuf::from).unwrap_or(defaults.data_dir),
            prefix: get(PREFIX_VAR).unwrap_or(defaults.prefix),
            relay_url: get(RELAY_URL_VAR),
            port,
        })
    }

    /// Address the HTTP ingress listens on.
    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tokio_test::{assert_err, assert_ok};

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BotConfig::from_lookup(lookup(&[(BOT_ID_VAR, "42")])).unwrap();
        assert_eq!(config.bot_id, UserId(42));
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.prefix, "!");
        assert_eq!(config.relay_url, None);
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_overrides() {
        let config = assert_ok!(BotConfig::from_lookup(lookup(&[
            (BOT_ID_VAR, "7"),
            (DATA_DIR_VAR, "/var/lib/rolerave"),
            (PREFIX_VAR, "?"),
            (RELAY_URL_VAR, "http://relay:9000"),
            (PORT_VAR, "3000"),
        ])));
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/rolerave"));
        assert_eq!(config.prefix, "?");
        assert_eq!(config.relay_url.as_deref(), Some("http://relay:9000"));
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            BotConfig::from_lookup(lookup(&[])),
            Err(ConfigError::Missing(BOT_ID_VAR))
        );
        assert_eq!(
            BotConfig::from_lookup(lookup(&[(BOT_ID_VAR, "  ")])),
            Err(ConfigError::Missing(BOT_ID_VAR))
        );
        assert!(matches!(
            BotConfig::from_lookup(lookup(&[(BOT_ID_VAR, "me")])),
            Err(ConfigError::Invalid { var: BOT_ID_VAR, .. })
        ));
        let err = assert_err!(BotConfig::from_lookup(lookup(&[(BOT_ID_VAR, "1"), (PORT_VAR, "99999")])));
        assert_eq!(err.to_string(), "PORT has an invalid value \"99999\"");
    }
}
