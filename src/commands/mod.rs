//! Text command dispatch.
//!
//! Every event is offered to the dispatcher after the rave engine is done
//! with it. Contents starting with the prefix are split into a command word
//! and whitespace-separated arguments; unknown command words are ignored.
//! Queries are open to everyone, changes need administrator permission.

pub mod args;
pub mod handlers;

use std::sync::Arc;

use thiserror::Error;

use crate::guild::{GuildRegistry, GuildState};
use crate::transport::{Transport, TransportError};
use crate::types::ActivityEvent;
use crate::utilities::StoreError;

/// Why a command was rejected. `Display` is the reply shown to the member.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("You need administrator permission to change this setting.")]
    NotPermitted,

    #[error("Could not complete that: {0}")]
    Transport(#[from] TransportError),

    #[error("Could not save the change: {0}")]
    Store(#[from] StoreError),
}

impl CommandError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// The recognized command words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Cooldown,
    GlobalCooldown,
    CheckRole,
    RoleName,
    MoveRole,
    RoleOffset,
    CheckOptOut,
    Rave,
    Tolerance,
    Blacklist,
    OptOut,
    OptIn,
    Color,
    Settings,
}

impl Command {
    /// Look up a command word (already lowercased).
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "cooldown" => Self::Cooldown,
            "global_cooldown" => Self::GlobalCooldown,
            "check_role" => Self::CheckRole,
            "role_name" => Self::RoleName,
            "move_role" => Self::MoveRole,
            "role_offset" => Self::RoleOffset,
            "check_opt_out" => Self::CheckOptOut,
            "rave" => Self::Rave,
            "tolerance" => Self::Tolerance,
            "blacklist" => Self::Blacklist,
            "opt_out" => Self::OptOut,
            "opt_in" => Self::OptIn,
            "color" | "colour" => Self::Color,
            "settings" => Self::Settings,
            _ => return None,
        })
    }
}

/// What a handler can see while running.
pub struct CommandContext<'a> {
    pub guild: Arc<GuildState>,
    pub event: &'a ActivityEvent,
    pub transport: &'a dyn Transport,
}

impl CommandContext<'_> {
    /// Reject the command unless the author is an administrator.
    pub fn ensure_admin(&self) -> Result<(), CommandError> {
        if self.event.author.is_admin {
            Ok(())
        } else {
            Err(CommandError::NotPermitted)
        }
    }
}

/// Parses prefixed contents into commands and runs them against the
/// author's community.
pub struct CommandDispatcher {
    registry: Arc<GuildRegistry>,
    transport: Arc<dyn Transport>,
    prefix: String,
}

impl CommandDispatcher {
    /// Create a dispatcher for commands starting with `prefix`.
    pub fn new(registry: Arc<GuildRegistry>, transport: Arc<dyn Transport>, prefix: impl Into<String>) -> Self {
        Self {
            registry,
            transport,
            prefix: prefix.into(),
        }
    }

    /// Run the command in `event`, if any, and return the reply text.
    pub async fn dispatch(&self, event: &ActivityEvent) -> Option<String> {
        if self.prefix.is_empty() {
            return None;
        }
        let body = event.content.strip_prefix(self.prefix.as_str())?;
        let mut words = body.split_whitespace();
        let command = Command::from_name(&words.next()?.to_ascii_lowercase())?;
        let args: Vec<&str> = words.collect();

        let guild = match self.registry.resolve(&event.guild) {
            Ok(guild) => guild,
            Err(e) => {
                tracing::error!(guild = %event.guild.id, error = %e, "cannot load community for command");
                return Some(CommandError::from(e).to_string());
            }
        };
        let ctx = CommandContext {
            guild,
            event,
            transport: self.transport.as_ref(),
        };

        let reply = match handlers::run(command, &ctx, &args).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::debug!(guild = %event.guild.id, user = %event.author.id, ?command, error = %e, "command rejected");
                e.to_string()
            }
        };
        Some(reply)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::color::Color;
    use crate::transport::MemoryTransport;
    use crate::types::fixtures::{event, member, role};
    use crate::types::{GuildId, GuildRef, Member, UserId};
    use crate::utilities::FileHandler;

    struct Harness {
        dir: tempfile::TempDir,
        registry: Arc<GuildRegistry>,
        transport: Arc<MemoryTransport>,
        dispatcher: CommandDispatcher,
    }

    impl Harness {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let registry = Arc::new(GuildRegistry::new(FileHandler::new(dir.path())));
            let transport = Arc::new(MemoryTransport::new());
            let dispatcher = CommandDispatcher::new(registry.clone(), transport.clone(), "!");
            Self {
                dir,
                registry,
                transport,
                dispatcher,
            }
        }

        async fn run(&self, author: Member, content: &str) -> Option<String> {
            self.dispatcher.dispatch(&event(1, author, content)).await
        }

        fn guild(&self) -> Arc<GuildState> {
            self.registry
                .resolve(&GuildRef {
                    id: GuildId(1),
                    name: "Test Guild".to_string(),
                })
                .unwrap()
        }
    }

    fn admin() -> Member {
        let mut admin = member(1, "admin", vec![]);
        admin.is_admin = true;
        admin
    }

    fn user() -> Member {
        member(2, "user", vec![])
    }

    #[tokio::test]
    async fn test_non_commands_are_ignored() {
        let h = Harness::new();
        assert_eq!(h.run(user(), "hello").await, None);
        assert_eq!(h.run(user(), "!dance").await, None);
        assert_eq!(h.run(user(), "!").await, None);
        assert!(h.registry.is_empty());
    }

    #[tokio::test]
    async fn test_set_cooldown_numeric_persists() {
        let h = Harness::new();
        let reply = h.run(admin(), "!cooldown 45").await.unwrap();
        assert!(reply.contains("45"), "{reply}");
        assert_eq!(h.guild().settings().cooldown, Duration::from_secs(45));

        let record = std::fs::read_to_string(h.dir.path().join("1_Test_Guild.json")).unwrap();
        let record: serde_json::Value = serde_json::from_str(&record).unwrap();
        assert!(record
            .as_array()
            .unwrap()
            .contains(&serde_json::json!(["cooldown", 45])));
    }

    #[tokio::test]
    async fn test_set_cooldown_non_numeric_is_rejected() {
        let h = Harness::new();
        let reply = h.run(admin(), "!cooldown soon").await.unwrap();
        assert!(reply.contains("soon"), "{reply}");
        assert_eq!(h.guild().settings().cooldown, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_changes_need_admin_but_queries_do_not() {
        let h = Harness::new();
        let reply = h.run(user(), "!cooldown 10").await.unwrap();
        assert_eq!(reply, CommandError::NotPermitted.to_string());
        assert_eq!(h.guild().settings().cooldown, Duration::from_secs(3));

        let reply = h.run(user(), "!cooldown").await.unwrap();
        assert!(reply.contains("3 seconds"), "{reply}");
    }

    #[tokio::test]
    async fn test_flag_commands() {
        let h = Harness::new();
        h.run(admin(), "!global_cooldown off").await.unwrap();
        h.run(admin(), "!check_role no").await.unwrap();
        h.run(admin(), "!move_role yes").await.unwrap();
        h.run(admin(), "!check_opt_out disable").await.unwrap();
        h.run(admin(), "!rave off").await.unwrap();
        let settings = h.guild().settings();
        assert!(!settings.global_cooldown);
        assert!(!settings.check_role);
        assert!(settings.move_role);
        assert!(!settings.check_opt_out);
        assert!(!settings.enabled);

        let reply = h.run(admin(), "!rave perhaps").await.unwrap();
        assert!(reply.contains("perhaps"), "{reply}");
        assert!(!h.guild().settings().enabled);
    }

    #[tokio::test]
    async fn test_role_name_and_offset() {
        let h = Harness::new();
        h.run(admin(), "!role_name Nitro Ravers").await.unwrap();
        h.run(admin(), "!role_offset -2").await.unwrap();
        let reply = h.run(admin(), "!role_offset up").await.unwrap();
        assert!(reply.contains("up"));

        let settings = h.guild().settings();
        assert_eq!(settings.role_name, "Nitro Ravers");
        assert_eq!(settings.role_offset, -2);
        assert!(h.run(user(), "!role_name").await.unwrap().contains("Nitro Ravers"));
    }

    #[tokio::test]
    async fn test_tolerance_validation() {
        let h = Harness::new();
        let reply = h.run(admin(), "!tolerance 1.5").await.unwrap();
        assert!(reply.contains("between 0 and 1"), "{reply}");
        h.run(admin(), "!tolerance 0.3").await.unwrap();
        assert_eq!(h.guild().settings().tolerance.get(), 0.3);
    }

    #[tokio::test]
    async fn test_blacklist_add_list_remove() {
        let h = Harness::new();
        h.run(admin(), "!blacklist add 100 100 100 0.2").await.unwrap();
        h.run(admin(), "!blacklist add #ff0000").await.unwrap();

        let settings = h.guild().settings();
        assert_eq!(settings.blacklist.len(), 2);
        assert_eq!(settings.blacklist.ranges()[0].low, [80, 80, 80]);
        assert_eq!(settings.blacklist.ranges()[0].high, [120, 120, 120]);
        assert_eq!(settings.blacklist.entries()[1].tolerance, settings.tolerance);

        let listing = h.run(user(), "!blacklist").await.unwrap();
        assert!(listing.contains("1. #646464"), "{listing}");
        assert!(listing.contains("(80, 80, 80) to (120, 120, 120)"), "{listing}");

        h.run(admin(), "!blacklist remove 1").await.unwrap();
        let settings = h.guild().settings();
        assert_eq!(settings.blacklist.len(), 1);
        assert_eq!(settings.blacklist.entries()[0].color, Color::new(255, 0, 0));

        let reply = h.run(admin(), "!blacklist remove 9").await.unwrap();
        assert!(reply.contains("9"), "{reply}");
        h.run(admin(), "!blacklist clear").await.unwrap();
        assert!(h.guild().settings().blacklist.is_empty());
    }

    #[tokio::test]
    async fn test_blacklist_remove_out_of_range_leaves_record_alone() {
        let h = Harness::new();
        h.run(admin(), "!blacklist add #ff0000").await.unwrap();
        let record = h.dir.path().join("1_Test_Guild.json");
        std::fs::remove_file(&record).unwrap();

        for bad in ["!blacklist remove 2", "!blacklist remove 0", "!blacklist remove x"] {
            let reply = h.run(admin(), bad).await.unwrap();
            assert!(reply.starts_with("There is no blacklist entry"), "{reply}");
        }
        assert!(!record.exists());
        assert_eq!(h.guild().settings().blacklist.len(), 1);
    }

    #[tokio::test]
    async fn test_blacklist_rejects_bad_input() {
        let h = Harness::new();
        for bad in ["!blacklist add 300 1 1", "!blacklist add #ff0000 2", "!blacklist add", "!blacklist frobnicate"] {
            h.run(admin(), bad).await.unwrap();
        }
        assert!(h.guild().settings().blacklist.is_empty());
    }

    #[tokio::test]
    async fn test_blacklist_by_role_color() {
        let h = Harness::new();
        h.transport.insert_role(GuildId(1), role(9, "Level 5", Color::new(10, 200, 30), 3));

        h.run(admin(), "!blacklist role Level 5 0.4").await.unwrap();
        let reply = h.run(admin(), "!blacklist role Level").await.unwrap();
        assert!(reply.contains("Level"), "{reply}");

        let entries = h.guild().settings().blacklist.entries().to_vec();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].color, Color::new(10, 200, 30));
        assert_eq!(entries[0].tolerance.get(), 0.4);

        h.run(admin(), "!blacklist role Level 5").await.unwrap();
        assert_eq!(h.guild().settings().blacklist.len(), 2);
    }

    #[tokio::test]
    async fn test_opt_out_and_in() {
        let h = Harness::new();
        let first = h.run(user(), "!opt_out").await.unwrap();
        let second = h.run(user(), "!opt_out").await.unwrap();
        assert_ne!(first, second);
        assert!(h.guild().is_opted_out(UserId(2)));

        h.run(user(), "!opt_in").await.unwrap();
        assert!(!h.guild().is_opted_out(UserId(2)));

        h.run(admin(), "!check_opt_out off").await.unwrap();
        let reply = h.run(user(), "!opt_out").await.unwrap();
        assert!(reply.contains("disabled"), "{reply}");
        assert_eq!(h.guild().opted_out_count(), 0);
    }

    #[tokio::test]
    async fn test_color_lookup() {
        let h = Harness::new();
        let mut me = user();
        me.roles.push(role(4, "red", Color::new(255, 0, 0), 2));
        let reply = h.run(me, "!color").await.unwrap();
        assert!(reply.contains("#ff0000"), "{reply}");

        h.transport.insert_member(
            GuildId(1),
            member(3, "cy", vec![role(5, "blue", Color::new(0, 0, 255), 1)]),
        );
        let reply = h.run(user(), "!color cy").await.unwrap();
        assert!(reply.contains("#0000ff"), "{reply}");

        let reply = h.run(user(), "!color nobody").await.unwrap();
        assert!(reply.contains("not found"), "{reply}");

        let reply = h.run(user(), "!colour").await.unwrap();
        assert!(reply.contains("no color"), "{reply}");
    }

    #[tokio::test]
    async fn test_settings_summary() {
        let h = Harness::new();
        let reply = h.run(user(), "!settings").await.unwrap();
        assert!(reply.contains("cooldown: 3s (global)"), "{reply}");
    }
}
