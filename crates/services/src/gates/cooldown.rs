//! Per-user cooldown between mutating actions.
//!
//! The gate only decides. Persisting the new `last_action_at` after a
//! successful write is up to the caller, and two concurrent requests from
//! the same user can both pass before either records its timestamp.

use chrono::{DateTime, Duration, Utc};
use domains::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownDecision {
    Allowed,
    /// Always at least 1.
    Wait { seconds_remaining: u64 },
}

impl CooldownDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, CooldownDecision::Allowed)
    }

    /// Zero when allowed.
    pub fn seconds_remaining(self) -> u64 {
        match self {
            CooldownDecision::Allowed => 0,
            CooldownDecision::Wait { seconds_remaining } => seconds_remaining,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CooldownGate {
    cooldown: Duration,
}

impl CooldownGate {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    /// Allowed iff `now >= last_action_at + cooldown`; otherwise the wait
    /// is rounded up to whole seconds.
    pub fn check(&self, last_action_at: DateTime<Utc>, now: DateTime<Utc>) -> CooldownDecision {
        let ready_at = last_action_at
            .checked_add_signed(self.cooldown)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        if now >= ready_at {
            return CooldownDecision::Allowed;
        }

        let remaining_ms = (ready_at - now).num_milliseconds();
        let seconds = (remaining_ms + 999) / 1000;
        CooldownDecision::Wait {
            seconds_remaining: u64::try_from(seconds).unwrap_or(1).max(1),
        }
    }

    /// A user who has never acted is always allowed.
    pub fn check_user(&self, user: &User, now: DateTime<Utc>) -> CooldownDecision {
        match user.last_action_at {
            Some(at) => self.check(at, now),
            None => CooldownDecision::Allowed,
        }
    }
}
