#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Player weapon and skill system.
//!
//! The primary weapon fires automatically at the nearest enemy within range,
//! shaped by the run's class. Skills are requested by the host and resolved on
//! the next simulation step. Instant attacks leave the system as [`HitEvent`]
//! values for the combat pipeline; projectiles leave as fire commands.

use std::{f32::consts::TAU, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use wavebreak_core::{
    ArcSector, Command, EnemyView, Event, HitEvent, HitId, HitShape, Owner, PlayerClass,
    PlayerSnapshot, ProjectileMotion, ProjectileSpec, Skill, StepClock,
};

const HIT_STREAM: u16 = 1;
const FASTEST_FIRE_INTERVAL: Duration = Duration::from_millis(50);

/// Tuning knobs for primary weapons and skills.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponTuning {
    /// Speed of gunner projectiles.
    pub bolt_speed: f32,
    /// Collision radius of gunner projectiles.
    pub bolt_radius: f32,
    /// Longest reach of the warden's sweep.
    pub sweep_reach: f32,
    /// Half of the warden's sweep angle in radians.
    pub sweep_half_angle: f32,
    /// Radius of the nova burst.
    pub nova_radius: f32,
    /// Damage of the nova burst relative to base damage.
    pub nova_damage_multiplier: f32,
    /// Milliseconds before nova may be used again.
    pub nova_cooldown_ms: u64,
    /// Projectiles launched by a volley.
    pub volley_count: u32,
    /// Speed of volley projectiles.
    pub volley_speed: f32,
    /// Heading change of volley projectiles in radians per second.
    pub volley_turn_rate: f32,
    /// Lifetime of volley projectiles in milliseconds.
    pub volley_lifetime_ms: u64,
    /// Milliseconds before volley may be used again.
    pub volley_cooldown_ms: u64,
    /// Length of frenzy in milliseconds.
    pub frenzy_duration_ms: u64,
    /// Divisor applied to the fire interval during frenzy.
    pub frenzy_fire_rate_multiplier: f32,
    /// Milliseconds before frenzy may be used again.
    pub frenzy_cooldown_ms: u64,
}

impl Default for WeaponTuning {
    fn default() -> Self {
        Self {
            bolt_speed: 520.0,
            bolt_radius: 5.0,
            sweep_reach: 110.0,
            sweep_half_angle: 1.0,
            nova_radius: 220.0,
            nova_damage_multiplier: 3.0,
            nova_cooldown_ms: 8_000,
            volley_count: 8,
            volley_speed: 360.0,
            volley_turn_rate: 4.0,
            volley_lifetime_ms: 2_500,
            volley_cooldown_ms: 10_000,
            frenzy_duration_ms: 6_000,
            frenzy_fire_rate_multiplier: 2.0,
            frenzy_cooldown_ms: 20_000,
        }
    }
}

/// Pure system that turns the player's loadout into attacks.
#[derive(Debug)]
pub struct Weapons {
    tuning: WeaponTuning,
    primary_cooldown: Duration,
    skill_cooldowns: [Duration; 3],
    requested: Vec<Skill>,
    frenzy: Duration,
    next_hit: u64,
}

impl Weapons {
    /// Creates the weapon system using the provided tuning.
    #[must_use]
    pub fn new(tuning: WeaponTuning) -> Self {
        Self {
            tuning,
            primary_cooldown: Duration::ZERO,
            skill_cooldowns: [Duration::ZERO; 3],
            requested: Vec::new(),
            frenzy: Duration::ZERO,
            next_hit: 0,
        }
    }

    /// Clears cooldowns, pending skills and active effects.
    pub fn reset(&mut self) {
        self.primary_cooldown = Duration::ZERO;
        self.skill_cooldowns = [Duration::ZERO; 3];
        self.requested.clear();
        self.frenzy = Duration::ZERO;
    }

    /// Queues a skill for the next step. Returns `false` while it is cooling down.
    pub fn request_skill(&mut self, skill: Skill) -> bool {
        let slot = skill_slot(skill);
        if !self.skill_cooldowns[slot].is_zero() || self.requested.contains(&skill) {
            return false;
        }
        self.skill_cooldowns[slot] = Duration::from_millis(match skill {
            Skill::Nova => self.tuning.nova_cooldown_ms,
            Skill::Volley => self.tuning.volley_cooldown_ms,
            Skill::Frenzy => self.tuning.frenzy_cooldown_ms,
        });
        self.requested.push(skill);
        true
    }

    /// Time left before `skill` may be requested again.
    #[must_use]
    pub fn skill_cooldown(&self, skill: Skill) -> Duration {
        self.skill_cooldowns[skill_slot(skill)]
    }

    /// Reports whether frenzy is active.
    #[must_use]
    pub fn is_frenzied(&self) -> bool {
        !self.frenzy.is_zero()
    }

    /// Consumes world events and snapshots to emit attacks.
    pub fn handle(
        &mut self,
        events: &[Event],
        player: &PlayerSnapshot,
        enemies: &EnemyView,
        out: &mut Vec<Command>,
        hits: &mut Vec<HitEvent>,
    ) {
        let clock = StepClock::scan(events);
        if clock.run_started {
            self.reset();
        }
        let dt = clock.elapsed;
        if dt.is_zero() {
            return;
        }

        self.primary_cooldown = self.primary_cooldown.saturating_sub(dt);
        for cooldown in &mut self.skill_cooldowns {
            *cooldown = cooldown.saturating_sub(dt);
        }
        self.frenzy = self.frenzy.saturating_sub(dt);

        let Some(class) = player.class else {
            return;
        };
        if !player.alive {
            self.requested.clear();
            return;
        }

        let damage = player.stats.damage * player.damage_multiplier;
        let skills = std::mem::take(&mut self.requested);
        for skill in skills {
            self.use_skill(skill, player, enemies, damage, out, hits);
        }

        if self.primary_cooldown.is_zero() {
            let target = enemies
                .iter()
                .filter(|enemy| enemy.opacity > 0.0)
                .map(|enemy| (enemy, enemy.position.distance_squared(player.position)))
                .filter(|(_, distance)| *distance <= reach(player) * reach(player))
                .min_by(|left, right| left.1.total_cmp(&right.1))
                .map(|(enemy, _)| enemy.position);
            if let Some(target) = target {
                let direction = (target - player.position).normalize_or_zero();
                let direction = if direction == Vec2::ZERO {
                    player.facing
                } else {
                    direction
                };
                self.fire_primary(class, player, direction, damage, out, hits);
                self.primary_cooldown = self.fire_interval(player);
            }
        }
    }

    fn fire_primary(
        &mut self,
        class: PlayerClass,
        player: &PlayerSnapshot,
        direction: Vec2,
        damage: f32,
        out: &mut Vec<Command>,
        hits: &mut Vec<HitEvent>,
    ) {
        let range = reach(player);
        match class {
            PlayerClass::Gunner => {
                let speed = self.tuning.bolt_speed.max(1.0);
                out.push(Command::FireProjectile {
                    spec: ProjectileSpec {
                        owner: Owner::Player,
                        origin: player.position,
                        velocity: direction * speed,
                        damage,
                        radius: self.tuning.bolt_radius,
                        lifetime: Duration::try_from_secs_f32(range / speed)
                            .unwrap_or(Duration::ZERO),
                        motion: ProjectileMotion::Straight,
                        can_crit: true,
                    },
                });
            }
            PlayerClass::Lancer => {
                let id = self.next_hit_id();
                hits.push(HitEvent {
                    id,
                    owner: Owner::Player,
                    damage,
                    origin: player.position,
                    shape: HitShape::Line {
                        from: player.position,
                        to: player.position + direction * range,
                    },
                    can_crit: true,
                    knockback: true,
                });
            }
            PlayerClass::Warden => {
                let id = self.next_hit_id();
                hits.push(HitEvent {
                    id,
                    owner: Owner::Player,
                    damage,
                    origin: player.position,
                    shape: HitShape::Area {
                        center: player.position,
                        radius: range.min(self.tuning.sweep_reach),
                        arc: Some(ArcSector {
                            direction,
                            half_angle: self.tuning.sweep_half_angle,
                        }),
                    },
                    can_crit: true,
                    knockback: true,
                });
            }
        }
    }

    fn use_skill(
        &mut self,
        skill: Skill,
        player: &PlayerSnapshot,
        enemies: &EnemyView,
        damage: f32,
        out: &mut Vec<Command>,
        hits: &mut Vec<HitEvent>,
    ) {
        log::debug!("skill {skill:?} used at {:?}", player.position);
        match skill {
            Skill::Nova => {
                let id = self.next_hit_id();
                hits.push(HitEvent {
                    id,
                    owner: Owner::Player,
                    damage: damage * self.tuning.nova_damage_multiplier,
                    origin: player.position,
                    shape: HitShape::Area {
                        center: player.position,
                        radius: self.tuning.nova_radius,
                        arc: None,
                    },
                    can_crit: true,
                    knockback: true,
                });
            }
            Skill::Volley => {
                let count = self.tuning.volley_count.max(1);
                let target = enemies
                    .nearest(player.position, f32::INFINITY)
                    .map(|enemy| enemy.id);
                for index in 0..count {
                    let angle = index as f32 / count as f32 * TAU;
                    let motion = match target {
                        Some(target) => ProjectileMotion::Homing {
                            target,
                            turn_rate: self.tuning.volley_turn_rate,
                        },
                        None => ProjectileMotion::Straight,
                    };
                    out.push(Command::FireProjectile {
                        spec: ProjectileSpec {
                            owner: Owner::Player,
                            origin: player.position,
                            velocity: Vec2::from_angle(angle) * self.tuning.volley_speed,
                            damage,
                            radius: self.tuning.bolt_radius,
                            lifetime: Duration::from_millis(self.tuning.volley_lifetime_ms),
                            motion,
                            can_crit: true,
                        },
                    });
                }
            }
            Skill::Frenzy => {
                self.frenzy = Duration::from_millis(self.tuning.frenzy_duration_ms);
            }
        }
    }

    fn fire_interval(&self, player: &PlayerSnapshot) -> Duration {
        let base = Duration::from_millis(u64::from(player.stats.fire_rate_ms));
        let interval = if self.is_frenzied() && self.tuning.frenzy_fire_rate_multiplier > 0.0 {
            base.div_f32(self.tuning.frenzy_fire_rate_multiplier)
        } else {
            base
        };
        interval.max(FASTEST_FIRE_INTERVAL)
    }

    fn next_hit_id(&mut self) -> HitId {
        self.next_hit = self.next_hit.wrapping_add(1);
        HitId::from_parts(HIT_STREAM, self.next_hit)
    }
}

impl Default for Weapons {
    fn default() -> Self {
        Self::new(WeaponTuning::default())
    }
}

const fn skill_slot(skill: Skill) -> usize {
    match skill {
        Skill::Nova => 0,
        Skill::Volley => 1,
        Skill::Frenzy => 2,
    }
}

/// Primary weapon range; unusable stat values disable the primary.
fn reach(player: &PlayerSnapshot) -> f32 {
    let range = player.stats.range;
    if range.is_finite() {
        range.max(0.0)
    } else {
        0.0
    }
}
