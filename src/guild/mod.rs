//! Per-community state: settings, opt-outs, cooldowns and the registry that
//! owns them.

pub mod cooldown;
pub mod opt_out;
pub mod registry;
pub mod settings;
pub mod state;

pub use cooldown::{CooldownController, CooldownScope, CooldownTicket};
pub use opt_out::{OptOutChange, OptOutRegistry};
pub use registry::GuildRegistry;
pub use settings::Settings;
pub use state::GuildState;
