//! Per-event rave state machine.
//!
//! ```text
//! Received -> Filtered                      (not eligible)
//!          -> Eligible -> AcquireFailed     (lost the cooldown race)
//!                      -> Acquired -> Sampling -> Mutating -> Released
//! ```
//!
//! Eligibility is checked in a fixed order and short-circuits: own message,
//! feature disabled, command, cooldown, required role, opt-out. The release
//! timer is armed right after acquisition, before any transport call, so the
//! window closes on schedule whatever the transport does.

use std::sync::Arc;

use crate::color::{Color, ColorSampler};
use crate::guild::{CooldownScope, GuildRegistry, GuildState, Settings};
use crate::rave::{FilterReason, RaveOutcome};
use crate::transport::{Transport, TransportError};
use crate::types::{ActivityEvent, GuildId, Member, Role, UserId};
use crate::utilities::StoreError;

/// Whether `content` starts with the command marker.
pub fn is_command(content: &str, prefix: &str) -> bool {
    !prefix.is_empty() && content.starts_with(prefix)
}

/// Position for a freshly created per-author role.
///
/// A non-negative offset counts down from `top`, a negative one counts up
/// from the bottom. Position 0 belongs to the default role, so the result
/// stays within `[1, top]`.
pub fn target_position(top: i64, offset: i64) -> i64 {
    let position = if offset >= 0 {
        top.saturating_sub(offset)
    } else {
        offset.saturating_neg()
    };
    position.clamp(1, top.max(1))
}

/// Runs inbound events through eligibility, cooldown, sampling and the
/// role mutation for the community they belong to.
pub struct RaveEngine {
    registry: Arc<GuildRegistry>,
    transport: Arc<dyn Transport>,
    bot_id: UserId,
    prefix: String,
    sampler: ColorSampler,
}

impl RaveEngine {
    /// Create an engine that ignores messages from `bot_id` and treats
    /// contents starting with `prefix` as commands.
    pub fn new(
        registry: Arc<GuildRegistry>,
        transport: Arc<dyn Transport>,
        bot_id: UserId,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            transport,
            bot_id,
            prefix: prefix.into(),
            sampler: ColorSampler::default(),
        }
    }

    /// Replace the color sampler.
    pub fn with_sampler(mut self, sampler: ColorSampler) -> Self {
        self.sampler = sampler;
        self
    }

    /// The community registry the engine resolves events against.
    pub fn registry(&self) -> &Arc<GuildRegistry> {
        &self.registry
    }

    /// Run one event through the state machine.
    ///
    /// Errors only when the community's records cannot be loaded; transport
    /// failures are folded into [`RaveOutcome::MutationFailed`].
    pub async fn process(&self, event: &ActivityEvent) -> Result<RaveOutcome, StoreError> {
        let author = &event.author;
        if author.id == self.bot_id {
            return Ok(RaveOutcome::filtered(FilterReason::OwnMessage));
        }

        let guild = self.registry.resolve(&event.guild)?;
        let settings = guild.settings();

        if let Some(reason) = self.filter(&guild, &settings, event) {
            tracing::trace!(guild = %event.guild.id, user = %author.id, ?reason, "event filtered");
            return Ok(RaveOutcome::filtered(reason));
        }

        let scope = CooldownScope::for_mode(settings.global_cooldown, author.id);
        let Some(ticket) = guild.cooldown().try_acquire(scope) else {
            return Ok(RaveOutcome::AcquireFailed);
        };
        ticket.release_after(settings.cooldown);

        let sampled = {
            let mut rng = rand::thread_rng();
            self.sampler.sample(settings.blacklist.ranges(), &mut rng)
        };
        let Some(color) = sampled else {
            tracing::warn!(guild = %guild.id(), "blacklist excludes every color, skipping rave");
            return Ok(RaveOutcome::Exhausted);
        };

        let mutation = if settings.check_role {
            self.recolor_target(guild.id(), &settings.role_name, color).await
        } else {
            self.recolor_author(&guild, author, &settings, color).await
        };

        Ok(match mutation {
            Ok(role) => {
                tracing::debug!(guild = %guild.id(), user = %author.id, %color, role = %role.name, "raved");
                RaveOutcome::Raved {
                    color,
                    role: role.name,
                }
            }
            Err(error) => {
                tracing::warn!(guild = %guild.id(), user = %author.id, %error, "rave mutation failed");
                RaveOutcome::MutationFailed {
                    color,
                    error: error.to_string(),
                }
            }
        })
    }

    fn filter(&self, guild: &GuildState, settings: &Settings, event: &ActivityEvent) -> Option<FilterReason> {
        let author = &event.author;
        if !settings.enabled {
            return Some(FilterReason::Disabled);
        }
        if is_command(&event.content, &self.prefix) {
            return Some(FilterReason::Command);
        }
        let scope = CooldownScope::for_mode(settings.global_cooldown, author.id);
        if guild.cooldown().is_on_cooldown(scope) {
            return Some(FilterReason::OnCooldown);
        }
        if settings.check_role && !author.has_role_named(&settings.role_name) {
            return Some(FilterReason::MissingRole);
        }
        if guild.is_opted_out(author.id) {
            return Some(FilterReason::OptedOut);
        }
        None
    }

    /// Target-role mode: recolor the one shared role.
    async fn recolor_target(&self, guild: GuildId, role_name: &str, color: Color) -> Result<Role, TransportError> {
        let role = self
            .transport
            .role_named(guild, role_name)
            .await?
            .ok_or_else(|| TransportError::NotFound(format!("role {role_name}")))?;
        self.transport.edit_role_color(guild, role.id, color).await?;
        Ok(role)
    }

    /// Per-author mode: find or create the author's own role, recolor it and
    /// make sure the author holds it.
    ///
    /// An existing role with the author's name is only reused when the author
    /// already holds it or the engine created it; any other role of that name
    /// belongs to someone else and is left alone.
    async fn recolor_author(
        &self,
        guild: &GuildState,
        author: &Member,
        settings: &Settings,
        color: Color,
    ) -> Result<Role, TransportError> {
        let guild_id = guild.id();
        let roles = self.transport.roles(guild_id).await?;
        let role = match roles.iter().find(|role| role.name == author.name) {
            Some(existing) if author.has_role(existing.id) || guild.created_role(existing.id) => {
                self.transport.edit_role_color(guild_id, existing.id, color).await?;
                existing.clone()
            }
            Some(_) => return Err(TransportError::Conflict(format!("role {}", author.name))),
            None => {
                let created = self.transport.create_role(guild_id, &author.name, color).await?;
                guild.record_created_role(created.id);
                if settings.move_role {
                    let top = roles.iter().map(|role| role.position).max().unwrap_or(0);
                    let position = target_position(top, settings.role_offset);
                    self.transport.move_role(guild_id, created.id, position).await?;
                }
                created
            }
        };

        if !author.has_role(role.id) {
            self.transport.add_member_role(guild_id, author.id, role.id).await?;
        }
        Ok(role)
    }
}
