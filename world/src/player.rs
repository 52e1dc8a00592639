//! Player actor owned by the world.

use std::time::Duration;

use glam::Vec2;
use wavebreak_core::{EffectiveStats, PlayerClass, PlayerSnapshot, PLAYER_RADIUS};

#[derive(Clone, Debug)]
pub(crate) struct Player {
    pub(crate) position: Vec2,
    velocity: Vec2,
    facing: Vec2,
    intent: Vec2,
    pub(crate) health: f32,
    max_health: f32,
    invulnerable: Duration,
    pub(crate) alive: bool,
    level: u32,
    health_multiplier: f32,
    damage_multiplier: f32,
    stats: EffectiveStats,
    class: Option<PlayerClass>,
}

impl Player {
    pub(crate) fn new() -> Self {
        let stats = EffectiveStats::default();
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            facing: Vec2::X,
            intent: Vec2::ZERO,
            health: stats.hp_max,
            max_health: stats.hp_max,
            invulnerable: Duration::ZERO,
            alive: false,
            level: 1,
            health_multiplier: 1.0,
            damage_multiplier: 1.0,
            stats,
            class: None,
        }
    }

    /// Places a fresh player at the arena origin.
    pub(crate) fn spawn(&mut self, class: PlayerClass, stats: EffectiveStats) {
        *self = Self::new();
        self.stats = stats;
        self.max_health = stats.hp_max.max(1.0);
        self.health = self.max_health;
        self.alive = true;
        self.class = Some(class);
    }

    pub(crate) fn set_intent(&mut self, direction: Vec2) {
        self.intent = direction.normalize_or_zero();
    }

    pub(crate) fn advance(&mut self, dt: Duration, base_speed: f32) {
        if !self.alive {
            self.velocity = Vec2::ZERO;
            return;
        }
        let speed = base_speed * (1.0 + self.stats.speed_bonus).max(0.0);
        self.velocity = self.intent * speed;
        if self.intent != Vec2::ZERO {
            self.facing = self.intent;
        }
        self.position += self.velocity * dt.as_secs_f32();
        self.invulnerable = self.invulnerable.saturating_sub(dt);
    }

    /// Replaces the aggregated stats, keeping the current health fraction.
    pub(crate) fn update_stats(&mut self, stats: EffectiveStats) {
        let fraction = if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            1.0
        };
        self.stats = stats;
        self.max_health = (stats.hp_max * self.health_multiplier).max(1.0);
        if self.alive {
            self.health = (self.max_health * fraction).clamp(0.0, self.max_health);
        }
    }

    /// Applies level scaling and heals to full. Returns the new maximum health.
    pub(crate) fn rescale(&mut self, level: u32, health_multiplier: f32, damage_multiplier: f32) -> f32 {
        self.level = level;
        self.health_multiplier = health_multiplier.max(0.0);
        self.damage_multiplier = damage_multiplier.max(0.0);
        self.max_health = (self.stats.hp_max * self.health_multiplier).max(1.0);
        if self.alive {
            self.health = self.max_health;
        }
        self.max_health
    }

    /// Applies defense-reduced damage unless the player is shielded.
    ///
    /// Returns the damage actually taken.
    pub(crate) fn take_damage(&mut self, amount: f32, invulnerability: Duration) -> Option<f32> {
        if !self.alive || !self.invulnerable.is_zero() || amount <= 0.0 {
            return None;
        }
        let defense = self.stats.defense.max(0.0);
        let taken = amount * 100.0 / (100.0 + defense);
        self.health = (self.health - taken).max(0.0);
        self.invulnerable = invulnerability;
        if self.health <= 0.0 {
            self.alive = false;
        }
        Some(taken)
    }

    pub(crate) fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            position: self.position,
            velocity: self.velocity,
            facing: self.facing,
            health: self.health,
            max_health: self.max_health,
            radius: PLAYER_RADIUS,
            alive: self.alive,
            invulnerable: !self.invulnerable.is_zero(),
            level: self.level,
            damage_multiplier: self.damage_multiplier,
            stats: self.stats,
            class: self.class,
        }
    }
}
