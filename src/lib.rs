//! # rolerave
//!
//! Per-community role color randomizer for chat guilds.
//!
//! Every message posted in a community may recolor a role: either one shared
//! target role held by eligible members, or a personal role named after the
//! author. A cooldown (global or per member) limits how often that happens,
//! members can opt out, and a blacklist keeps sampled colors away from
//! chosen ones. Settings are changed through text commands and persisted per
//! community as JSON records.

pub mod bot;
pub mod color;
pub mod commands;
pub mod config;
pub mod guild;
pub mod rave;
pub mod server;
pub mod transport;
pub mod types;
pub mod utilities;

pub use bot::{EventReport, RaveBot};
pub use color::{Blacklist, BlacklistEntry, Color, ColorSampler, Tolerance};
pub use commands::{CommandDispatcher, CommandError};
pub use config::{BotConfig, ConfigError};
pub use guild::{CooldownController, GuildRegistry, GuildState, Settings};
pub use rave::{FilterReason, RaveEngine, RaveOutcome};
pub use transport::{MemoryTransport, RelayTransport, Transport, TransportError};
pub use types::{ActivityEvent, ChannelId, GuildId, GuildRef, Member, Role, RoleId, UserId};
pub use utilities::{FileHandler, StoreError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
