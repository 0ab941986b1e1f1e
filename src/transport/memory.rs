//! In-process transport.
//!
//! Keeps a small model of communities (roles and members) and records the
//! most recent outbound calls. Used by the test suite and as the dry-run
//! transport of the server binary when no relay is configured.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;

use super::{Transport, TransportError};
use crate::color::Color;
use crate::types::{ChannelId, GuildId, Member, Role, RoleId, UserId};

/// Default number of calls kept in the log; older ones are dropped.
pub const CALL_LOG_CAPACITY: usize = 1024;

/// One recorded outbound call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum TransportCall {
    EditRoleColor { guild: GuildId, role: RoleId, color: Color },
    CreateRole { guild: GuildId, name: String, color: Color },
    MoveRole { guild: GuildId, role: RoleId, position: i64 },
    AddMemberRole { guild: GuildId, user: UserId, role: RoleId },
    SendMessage { channel: ChannelId, content: String },
}

#[derive(Debug, Default)]
struct World {
    roles: HashMap<GuildId, Vec<Role>>,
    members: HashMap<GuildId, Vec<Member>>,
    calls: VecDeque<TransportCall>,
    call_capacity: usize,
    next_role_id: u64,
    deny_mutations: bool,
}

impl World {
    fn record(&mut self, call: TransportCall) {
        if self.call_capacity == 0 {
            return;
        }
        if self.calls.len() == self.call_capacity {
            self.calls.pop_front();
        }
        self.calls.push_back(call);
    }

    fn role_mut(&mut self, guild: GuildId, role: RoleId) -> Result<&mut Role, TransportError> {
        self.roles
            .get_mut(&guild)
            .and_then(|roles| roles.iter_mut().find(|r| r.id == role))
            .ok_or_else(|| TransportError::NotFound(format!("role {role}")))
    }

    fn check_mutation(&self, what: &str) -> Result<(), TransportError> {
        if self.deny_mutations {
            Err(TransportError::PermissionDenied(what.to_string()))
        } else {
            Ok(())
        }
    }
}

/// In-memory [`Transport`] with a bounded call log.
#[derive(Debug)]
pub struct MemoryTransport {
    world: Mutex<World>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    /// Create a transport keeping the last [`CALL_LOG_CAPACITY`] calls.
    pub fn new() -> Self {
        Self::with_call_capacity(CALL_LOG_CAPACITY)
    }

    /// Create a transport keeping at most `capacity` calls (0 keeps none).
    pub fn with_call_capacity(capacity: usize) -> Self {
        Self {
            world: Mutex::new(World {
                call_capacity: capacity,
                next_role_id: 1_000,
                ..World::default()
            }),
        }
    }

    /// Seed a role.
    pub fn insert_role(&self, guild: GuildId, role: Role) {
        self.world.lock().roles.entry(guild).or_default().push(role);
    }

    /// Seed a member.
    pub fn insert_member(&self, guild: GuildId, member: Member) {
        self.world.lock().members.entry(guild).or_default().push(member);
    }

    /// Make every mutating call fail with `PermissionDenied`.
    pub fn deny_mutations(&self, deny: bool) {
        self.world.lock().deny_mutations = deny;
    }

    /// Recorded calls, oldest first.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.world.lock().calls.iter().cloned().collect()
    }

    /// Contents of the recorded replies, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.world
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                TransportCall::SendMessage { content, .. } => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    /// Current state of a role, by exact name.
    pub fn role(&self, guild: GuildId, name: &str) -> Option<Role> {
        self.world
            .lock()
            .roles
            .get(&guild)
            .and_then(|roles| roles.iter().find(|r| r.name == name).cloned())
    }

    /// Current state of a member.
    pub fn member(&self, guild: GuildId, user: UserId) -> Option<Member> {
        self.world
            .lock()
            .members
            .get(&guild)
            .and_then(|members| members.iter().find(|m| m.id == user).cloned())
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn roles(&self, guild: GuildId) -> Result<Vec<Role>, TransportError> {
        Ok(self.world.lock().roles.get(&guild).cloned().unwrap_or_default())
    }

    async fn edit_role_color(
        &self,
        guild: GuildId,
        role: RoleId,
        color: Color,
    ) -> Result<(), TransportError> {
        let mut world = self.world.lock();
        world.record(TransportCall::EditRoleColor { guild, role, color });
        world.check_mutation("manage roles")?;
        world.role_mut(guild, role)?.color = color;
        Ok(())
    }

    async fn create_role(&self, guild: GuildId, name: &str, color: Color) -> Result<Role, TransportError> {
        let mut world = self.world.lock();
        world.record(TransportCall::CreateRole {
            guild,
            name: name.to_string(),
            color,
        });
        world.check_mutation("manage roles")?;
        world.next_role_id += 1;
        let role = Role {
            id: RoleId(world.next_role_id),
            name: name.to_string(),
            color,
            position: 1,
        };
        world.roles.entry(guild).or_default().push(role.clone());
        Ok(role)
    }

    async fn move_role(&self, guild: GuildId, role: RoleId, position: i64) -> Result<(), TransportError> {
        let mut world = self.world.lock();
        world.record(TransportCall::MoveRole { guild, role, position });
        world.check_mutation("manage roles")?;
        world.role_mut(guild, role)?.position = position;
        Ok(())
    }

    async fn add_member_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<(), TransportError> {
        let mut world = self.world.lock();
        world.record(TransportCall::AddMemberRole { guild, user, role });
        world.check_mutation("manage roles")?;
        let granted = world.role_mut(guild, role)?.clone();
        if let Some(member) = world
            .members
            .get_mut(&guild)
            .and_then(|members| members.iter_mut().find(|m| m.id == user))
        {
            if !member.has_role(granted.id) {
                member.roles.push(granted);
            }
        }
        Ok(())
    }

    async fn find_member(&self, guild: GuildId, name: &str) -> Result<Member, TransportError> {
        self.world
            .lock()
            .members
            .get(&guild)
            .and_then(|members| members.iter().find(|m| m.name == name).cloned())
            .ok_or_else(|| TransportError::NotFound(format!("member {name}")))
    }

    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<(), TransportError> {
        tracing::info!(%channel, %content, "dry-run reply");
        self.world.lock().record(TransportCall::SendMessage {
            channel,
            content: content.to_string(),
        });
        Ok(())
    }
}
