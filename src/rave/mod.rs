//! The rave engine: decides per event whether to recolor, and does it.

pub mod engine;

use serde::Serialize;

use crate::color::Color;

pub use engine::{is_command, target_position, RaveEngine};

/// Why an event was not eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterReason {
    OwnMessage,
    Disabled,
    Command,
    OnCooldown,
    MissingRole,
    OptedOut,
}

/// Terminal state of one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RaveOutcome {
    /// Not eligible; nothing changed.
    Filtered { reason: FilterReason },
    /// Eligible, but another event won the cooldown.
    AcquireFailed,
    /// The blacklist leaves no color to pick. The cooldown still runs.
    Exhausted,
    /// The role was recolored.
    Raved { color: Color, role: String },
    /// The transport refused the mutation. The cooldown still runs.
    MutationFailed { color: Color, error: String },
}

impl RaveOutcome {
    pub(crate) fn filtered(reason: FilterReason) -> Self {
        Self::Filtered { reason }
    }
}
