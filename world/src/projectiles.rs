//! Pooled projectile actors.

use std::time::Duration;

use glam::Vec2;
use wavebreak_core::{
    Owner, ProjectileId, ProjectileMotion, ProjectileSnapshot, ProjectileSpec,
};

use crate::pool::Poolable;

#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) owner: Owner,
    pub(crate) position: Vec2,
    pub(crate) previous_position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) damage: f32,
    pub(crate) radius: f32,
    pub(crate) remaining: Duration,
    pub(crate) motion: ProjectileMotion,
    pub(crate) can_crit: bool,
}

impl Projectile {
    pub(crate) fn snapshot(&self, id: ProjectileId) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id,
            owner: self.owner,
            position: self.position,
            previous_position: self.previous_position,
            damage: self.damage,
            radius: self.radius,
            can_crit: self.can_crit,
        }
    }

    /// Moves the projectile, steering toward `target` when homing.
    ///
    /// Returns `false` once the lifetime has run out.
    pub(crate) fn advance(&mut self, dt: Duration, target: Option<Vec2>) -> bool {
        let seconds = dt.as_secs_f32();
        if let (ProjectileMotion::Homing { turn_rate, .. }, Some(target)) = (self.motion, target) {
            let speed = self.velocity.length();
            let desired = (target - self.position).normalize_or_zero();
            let current = self.velocity.normalize_or_zero();
            if speed > 0.0 && desired != Vec2::ZERO && current != Vec2::ZERO {
                let angle = current.angle_between(desired);
                let step = angle.clamp(-turn_rate * seconds, turn_rate * seconds);
                self.velocity = Vec2::from_angle(step).rotate(current) * speed;
            }
        }

        self.previous_position = self.position;
        self.position += self.velocity * seconds;
        self.remaining = self.remaining.saturating_sub(dt);
        !self.remaining.is_zero()
    }
}

impl Poolable for Projectile {
    type Config = ProjectileSpec;

    fn dormant() -> Self {
        Self {
            owner: Owner::Player,
            position: Vec2::ZERO,
            previous_position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            damage: 0.0,
            radius: 0.0,
            remaining: Duration::ZERO,
            motion: ProjectileMotion::Straight,
            can_crit: false,
        }
    }

    fn enable(&mut self, spec: ProjectileSpec) {
        *self = Self {
            owner: spec.owner,
            position: spec.origin,
            previous_position: spec.origin,
            velocity: spec.velocity,
            damage: spec.damage,
            radius: spec.radius,
            remaining: spec.lifetime,
            motion: spec.motion,
            can_crit: spec.can_crit,
        };
    }

    fn disable(&mut self) {
        self.velocity = Vec2::ZERO;
        self.remaining = Duration::ZERO;
    }
}
