//! Pooled enemy actors.

use std::time::Duration;

use glam::Vec2;
use wavebreak_core::{Archetype, Behavior, EnemyConfig, EnemyId, EnemySnapshot, Faction, Rank};

use crate::pool::Poolable;

/// Parameters that fully describe an activated enemy.
#[derive(Clone, Copy, Debug)]
pub(crate) struct EnemySpawn {
    pub(crate) config: EnemyConfig,
    pub(crate) position: Vec2,
}

/// Mutable enemy state owned by the world.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) config: EnemyConfig,
    pub(crate) health: f32,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) knockback: Vec2,
    pub(crate) facing: Vec2,
    pub(crate) flash: Duration,
    pub(crate) opacity: f32,
    pub(crate) behavior: Behavior,
}

impl Enemy {
    pub(crate) fn snapshot(&self, id: EnemyId) -> EnemySnapshot {
        EnemySnapshot {
            id,
            archetype: self.config.archetype,
            faction: self.config.faction,
            rank: self.config.rank,
            position: self.position,
            velocity: self.velocity,
            health: self.health,
            max_health: self.config.max_health,
            speed: self.config.speed,
            contact_damage: self.config.contact_damage,
            attack_range: self.config.attack_range,
            radius: self.config.radius,
            reward: self.config.reward,
            opacity: self.opacity,
            behavior: self.behavior,
        }
    }

    /// Integrates velocity and decays knockback and flash timers.
    pub(crate) fn advance(&mut self, dt: Duration, knockback_damping: f32) {
        let seconds = dt.as_secs_f32();
        self.position += (self.velocity + self.knockback) * seconds;
        self.knockback *= (-knockback_damping * seconds).exp();
        if self.knockback.length_squared() < 1.0 {
            self.knockback = Vec2::ZERO;
        }
        self.flash = self.flash.saturating_sub(dt);
    }
}

impl Poolable for Enemy {
    type Config = EnemySpawn;

    fn dormant() -> Self {
        Self {
            config: EnemyConfig::new(Archetype::Chaser, Faction::Vermin, Rank::Normal, 1.0),
            health: 0.0,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            knockback: Vec2::ZERO,
            facing: Vec2::X,
            flash: Duration::ZERO,
            opacity: 0.0,
            behavior: Behavior::Chaser,
        }
    }

    fn enable(&mut self, spawn: EnemySpawn) {
        *self = Self {
            config: spawn.config,
            health: spawn.config.max_health,
            position: spawn.position,
            velocity: Vec2::ZERO,
            knockback: Vec2::ZERO,
            facing: Vec2::X,
            flash: Duration::ZERO,
            opacity: 1.0,
            behavior: Behavior::initial(spawn.config.archetype, spawn.position),
        };
    }

    fn disable(&mut self) {
        self.velocity = Vec2::ZERO;
        self.knockback = Vec2::ZERO;
        self.flash = Duration::ZERO;
        self.opacity = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enable_overwrites_previous_state() {
        let mut enemy = Enemy::dormant();
        enemy.enable(EnemySpawn {
            config: EnemyConfig::new(Archetype::Dash, Faction::Abyssal, Rank::Elite, 1.0),
            position: Vec2::new(5.0, 5.0),
        });
        enemy.health = 1.0;
        enemy.knockback = Vec2::new(300.0, 0.0);
        enemy.flash = Duration::from_millis(80);
        enemy.disable();

        enemy.enable(EnemySpawn {
            config: EnemyConfig::new(Archetype::Swarm, Faction::Vermin, Rank::Normal, 1.0),
            position: Vec2::new(-1.0, 2.0),
        });
        assert_eq!(enemy.config.archetype, Archetype::Swarm);
        assert!((enemy.health - 12.0).abs() < f32::EPSILON);
        assert_eq!(enemy.knockback, Vec2::ZERO);
        assert_eq!(enemy.flash, Duration::ZERO);
        assert!(matches!(enemy.behavior, Behavior::Swarm { .. }));
    }

    #[test]
    fn knockback_decays_over_time() {
        let mut enemy = Enemy::dormant();
        enemy.knockback = Vec2::new(200.0, 0.0);
        enemy.advance(Duration::from_millis(100), 8.0);
        assert!(enemy.position.x > 0.0);
        assert!(enemy.knockback.x < 200.0);
    }
}
