//! Event intake: engine first, then command dispatch, then the reply.

use std::sync::Arc;

use serde::Serialize;

use crate::commands::CommandDispatcher;
use crate::config::BotConfig;
use crate::guild::GuildRegistry;
use crate::rave::{RaveEngine, RaveOutcome};
use crate::transport::Transport;
use crate::types::ActivityEvent;
use crate::utilities::FileHandler;

/// What happened to one inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventReport {
    /// Rave outcome, absent when the community could not be loaded.
    pub outcome: Option<RaveOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Command reply, if the event was a command.
    pub reply: Option<String>,
}

/// The event intake: the rave engine and the command dispatcher over one
/// shared registry and transport.
pub struct RaveBot {
    engine: RaveEngine,
    dispatcher: CommandDispatcher,
    transport: Arc<dyn Transport>,
}

impl RaveBot {
    /// Create a bot with a fresh registry over `config.data_dir`.
    pub fn new(config: &BotConfig, transport: Arc<dyn Transport>) -> Self {
        let registry = Arc::new(GuildRegistry::new(FileHandler::new(&config.data_dir)));
        Self::with_registry(config, registry, transport)
    }

    /// Create a bot over an existing registry.
    pub fn with_registry(config: &BotConfig, registry: Arc<GuildRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self {
            engine: RaveEngine::new(registry.clone(), transport.clone(), config.bot_id, config.prefix.clone()),
            dispatcher: CommandDispatcher::new(registry, transport.clone(), config.prefix.clone()),
            transport,
        }
    }

    /// Communities resolved so far.
    pub fn registry(&self) -> &Arc<GuildRegistry> {
        self.engine.registry()
    }

    /// Handle one event. Never fails; problems end up in the report.
    pub async fn handle(&self, event: &ActivityEvent) -> EventReport {
        let (outcome, error) = match self.engine.process(event).await {
            Ok(outcome) => {
                tracing::debug!(guild = %event.guild.id, user = %event.author.id, ?outcome, "event processed");
                (Some(outcome), None)
            }
            Err(e) => {
                tracing::error!(guild = %event.guild.id, error = %e, "rave engine failed");
                (None, Some(e.to_string()))
            }
        };

        let reply = self.dispatcher.dispatch(event).await;
        if let Some(text) = &reply {
            if let Err(e) = self.transport.send_message(event.channel, text).await {
                tracing::warn!(channel = %event.channel, error = %e, "failed to send command reply");
            }
        }

        EventReport { outcome, error, reply }
    }
}
