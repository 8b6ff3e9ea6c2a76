//! Checks that run before any state-mutating action.

pub mod authorization;
pub mod cooldown;

pub use cooldown::{CooldownDecision, CooldownGate};
