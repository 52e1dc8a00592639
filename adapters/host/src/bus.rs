//! Outbound publish/subscribe surface for UI collaborators.

use std::fmt;

use glam::Vec2;
use wavebreak_core::{Archetype, Faction, PacingPhase, Rank, RunOutcome, StatsSnapshot};

/// Notifications published to subscribers outside the simulation.
#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    /// Periodic statistics for heads-up displays.
    Stats(StatsSnapshot),
    /// An enemy died.
    EnemyKilled {
        /// Where the enemy died.
        position: Vec2,
        /// Score and experience value of the kill.
        reward: u32,
        /// Behaviour profile of the enemy.
        archetype: Archetype,
        /// Faction of the enemy.
        faction: Faction,
        /// Power tier of the enemy.
        rank: Rank,
    },
    /// The player reached a new level.
    PlayerLeveledUp {
        /// Level reached.
        level: u32,
        /// Experience required for the next level.
        xp_to_next: u32,
    },
    /// The pacing director entered a new phase.
    PacingPhaseChanged {
        /// Phase entered.
        phase: PacingPhase,
        /// Announcement for the phase.
        message: &'static str,
    },
    /// Damage landed on an enemy; drives floating damage numbers.
    DamageApplied {
        /// Where the damage landed.
        position: Vec2,
        /// Damage dealt.
        amount: f32,
        /// Whether the hit was critical.
        is_crit: bool,
        /// Whether the hit killed the enemy.
        lethal: bool,
    },
    /// The run finished.
    RunEnded(RunOutcome),
}

/// Handle returned by [`Bus::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&Notification)>;

/// In-process fan-out of notifications to registered callbacks.
#[derive(Default)]
pub struct Bus {
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_id: u64,
}

impl Bus {
    /// Creates a bus without subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback invoked for every published notification.
    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&Notification) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Removes a callback. Returns `false` for unknown handles.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(candidate, _)| *candidate != id);
        self.subscribers.len() != before
    }

    /// Delivers `notification` to every subscriber in registration order.
    pub fn publish(&mut self, notification: &Notification) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(notification);
        }
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("subscribers", &self.subscribers.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}
