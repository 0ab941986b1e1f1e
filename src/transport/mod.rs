//! The chat transport seam.
//!
//! The engine never talks to a chat service directly. Everything it needs
//! from the outside world (role lookups, role mutations, member lookups and
//! replies) goes through [`Transport`]. Every call may fail; callers on the
//! automatic rave path log and carry on, command handlers report the failure
//! to the invoking member.

pub mod memory;
pub mod relay;

use async_trait::async_trait;
use thiserror::Error;

use crate::color::Color;
use crate::types::{ChannelId, GuildId, Member, Role, RoleId, UserId};

pub use memory::{MemoryTransport, TransportCall};
pub use relay::RelayTransport;

/// Failures reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The role, member or community does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The bot lacks permission for the operation.
    #[error("missing permission: {0}")]
    PermissionDenied(String),

    /// The name belongs to a role the bot may not claim.
    #[error("{0} is already taken")]
    Conflict(String),

    /// The transport could not be reached or failed unexpectedly.
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    /// The transport answered with something unreadable.
    #[error("malformed transport response: {0}")]
    Decode(String),
}

/// Outbound operations against the chat service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// All roles of a community.
    async fn roles(&self, guild: GuildId) -> Result<Vec<Role>, TransportError>;

    /// Recolor an existing role.
    async fn edit_role_color(
        &self,
        guild: GuildId,
        role: RoleId,
        color: Color,
    ) -> Result<(), TransportError>;

    /// Create a role and return it as created.
    async fn create_role(&self, guild: GuildId, name: &str, color: Color) -> Result<Role, TransportError>;

    /// Move a role to `position` in the ordering (0 is the bottom).
    async fn move_role(&self, guild: GuildId, role: RoleId, position: i64) -> Result<(), TransportError>;

    /// Give a role to a member.
    async fn add_member_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<(), TransportError>;

    /// Look a member up by exact name.
    async fn find_member(&self, guild: GuildId, name: &str) -> Result<Member, TransportError>;

    /// Post a text reply.
    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<(), TransportError>;

    /// Find a role by exact name.
    async fn role_named(&self, guild: GuildId, name: &str) -> Result<Option<Role>, TransportError> {
        Ok(self.roles(guild).await?.into_iter().find(|role| role.name == name))
    }
}
