//! Shared domain types for communities, members, roles and activity events.
//!
//! These are the shapes the transport collaborator hands to the engine and
//! the ingress server accepts as JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::Color;

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

snowflake!(
    /// Stable identifier of a community (guild).
    GuildId
);
snowflake!(
    /// Stable identifier of a participant.
    UserId
);
snowflake!(
    /// Stable identifier of a role within a community.
    RoleId
);
snowflake!(
    /// Identifier of the channel an event was posted in.
    ChannelId
);

/// A role as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub color: Color,
    /// Position in the role ordering; 0 is the bottom.
    #[serde(default)]
    pub position: i64,
}

/// A participant together with the roles they currently hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Whether the transport reports administrative permission for this
    /// member in the community.
    #[serde(default)]
    pub is_admin: bool,
}

impl Member {
    /// Whether the member holds a role whose name is exactly `name`.
    pub fn has_role_named(&self, name: &str) -> bool {
        self.roles.iter().any(|role| role.name == name)
    }

    /// Whether the member holds the role with the given id.
    pub fn has_role(&self, id: RoleId) -> bool {
        self.roles.iter().any(|role| role.id == id)
    }

    /// The color the member is displayed with: the highest-positioned role
    /// that carries a color. `None` when no held role is colored.
    pub fn effective_color(&self) -> Option<Color> {
        self.roles
            .iter()
            .filter(|role| !role.color.is_unset())
            .max_by_key(|role| role.position)
            .map(|role| role.color)
    }
}

/// Identity of the community an event belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildRef {
    pub id: GuildId,
    #[serde(default)]
    pub name: String,
}

/// One inbound activity event (a posted message).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub guild: GuildRef,
    pub channel: ChannelId,
    pub author: Member,
    #[serde(default)]
    pub content: String,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn role(id: u64, name: &str, color: Color, position: i64) -> Role {
        Role {
            id: RoleId(id),
            name: name.to_string(),
            color,
            position,
        }
    }

    pub fn member(id: u64, name: &str, roles: Vec<Role>) -> Member {
        Member {
            id: UserId(id),
            name: name.to_string(),
            roles,
            is_admin: false,
        }
    }

    pub fn event(guild: u64, author: Member, content: &str) -> ActivityEvent {
        ActivityEvent {
            guild: GuildRef {
                id: GuildId(guild),
                name: "Test Guild".to_string(),
            },
            channel: ChannelId(1),
            author,
            content: content.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_effective_color_picks_highest_colored_role() {
        let member = member(
            7,
            "ana",
            vec![
                role(1, "low", Color::new(1, 2, 3), 1),
                role(2, "plain", Color::UNSET, 9),
                role(3, "high", Color::new(200, 10, 10), 5),
            ],
        );
        assert_eq!(member.effective_color(), Some(Color::new(200, 10, 10)));
    }

    #[test]
    fn test_effective_color_none_without_colored_roles() {
        let member = member(7, "ana", vec![role(2, "plain", Color::UNSET, 9)]);
        assert_eq!(member.effective_color(), None);
    }

    #[test]
    fn test_role_name_match_is_exact() {
        let member = member(7, "ana", vec![role(1, "Server Booster", Color::UNSET, 1)]);
        assert!(member.has_role_named("Server Booster"));
        assert!(!member.has_role_named("Booster"));
        assert!(!member.has_role_named("server booster"));
    }

    #[test]
    fn test_event_deserializes_with_defaults() {
        let event: ActivityEvent = serde_json::from_value(serde_json::json!({
            "guild": {"id": 10},
            "channel": 3,
            "author": {"id": 4, "name": "bo"},
        }))
        .unwrap();
        assert_eq!(event.guild.id, GuildId(10));
        assert!(event.author.roles.is_empty());
        assert!(event.content.is_empty());
    }
}
