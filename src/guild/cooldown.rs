//! Cooldown windows for one community.
//!
//! Two scopes share one mutex: a single global flag, and a set of
//! participants currently inside their own window. Which scope an event uses
//! is picked by the community's `global_cooldown` setting at acquisition
//! time.
//!
//! A successful acquisition hands out a [`CooldownTicket`]. The ticket
//! releases its scope exactly once, when it is dropped, so every acquire is
//! matched by one release on every path, including panics and transport
//! failures. [`CooldownTicket::release_after`] moves the ticket into a timer
//! task instead of blocking the caller.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::types::UserId;

/// What a cooldown window covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CooldownScope {
    /// The whole community.
    Global,
    /// One participant.
    User(UserId),
}

impl CooldownScope {
    /// The scope an event of `user` contends for under the current mode.
    pub fn for_mode(global: bool, user: UserId) -> Self {
        if global {
            Self::Global
        } else {
            Self::User(user)
        }
    }
}

#[derive(Debug, Default)]
struct CooldownState {
    global: bool,
    users: HashSet<UserId>,
}

impl CooldownState {
    fn is_active(&self, scope: CooldownScope) -> bool {
        match scope {
            CooldownScope::Global => self.global,
            CooldownScope::User(id) => self.users.contains(&id),
        }
    }
}

/// Cooldown state machine of one community.
#[derive(Debug, Clone, Default)]
pub struct CooldownController {
    state: Arc<Mutex<CooldownState>>,
}

impl CooldownController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-mutating check used by eligibility checks.
    pub fn is_on_cooldown(&self, scope: CooldownScope) -> bool {
        self.state.lock().is_active(scope)
    }

    /// Enter a window for `scope` unless one is already open.
    pub fn try_acquire(&self, scope: CooldownScope) -> Option<CooldownTicket> {
        let mut state = self.state.lock();
        let acquired = match scope {
            CooldownScope::Global => !std::mem::replace(&mut state.global, true),
            CooldownScope::User(id) => state.users.insert(id),
        };
        acquired.then(|| CooldownTicket {
            state: Arc::clone(&self.state),
            scope,
        })
    }

    /// Participants currently inside a per-participant window.
    pub fn active_users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self.state.lock().users.iter().copied().collect();
        users.sort();
        users
    }

    pub fn is_global_active(&self) -> bool {
        self.state.lock().global
    }
}

/// Proof of an open cooldown window. Dropping it closes the window.
#[derive(Debug)]
#[must_use = "dropping a ticket releases the cooldown immediately"]
pub struct CooldownTicket {
    state: Arc<Mutex<CooldownState>>,
    scope: CooldownScope,
}

impl CooldownTicket {
    pub fn scope(&self) -> CooldownScope {
        self.scope
    }

    /// Close the window now.
    pub fn release(self) {
        drop(self);
    }

    /// Close the window once `delay` has elapsed, on a spawned task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn release_after(self, delay: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            self.release();
        })
    }
}

impl Drop for CooldownTicket {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        match self.scope {
            CooldownScope::Global => state.global = false,
            CooldownScope::User(id) => {
                state.users.remove(&id);
            }
        }
        tracing::trace!(scope = ?self.scope, "cooldown released");
    }
}
