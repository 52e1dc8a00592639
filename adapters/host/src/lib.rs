#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Host adapter that drives a Wavebreak encounter.
//!
//! [`Session`] owns the authoritative world and every system, advances them in
//! fixed steps in dependency order, and publishes UI-facing [`Notification`]s
//! on its [`Bus`]. Effective player statistics come from an external
//! [`StatSource`] and are only re-read at run start or when the loadout changes.

pub mod bus;
mod clock;
pub mod config;
mod session;

pub use bus::{Bus, Notification, SubscriptionId};
pub use config::{ConfigError, RunConfig, SessionConfig};
pub use session::Session;

use wavebreak_core::EffectiveStats;

/// Read-only seam to the stat aggregator that owns the player's loadout.
pub trait StatSource {
    /// Current effective statistics of the equipped loadout.
    fn effective_stats(&self) -> EffectiveStats;
}

impl StatSource for EffectiveStats {
    fn effective_stats(&self) -> EffectiveStats {
        *self
    }
}
