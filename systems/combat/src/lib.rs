#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Combat resolution pipeline.
//!
//! Collects committed hits and live projectiles, resolves their geometry
//! against the enemy and player snapshots, and emits damage commands for the
//! world to apply. Instant hits are consumed at most once through a bounded
//! ledger of resolved identifiers; projectile idempotence is enforced by the
//! world, which spends a projectile on its first damage command.

use std::{
    collections::{HashSet, VecDeque},
    time::Duration,
};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use wavebreak_core::{
    Command, DamageSource, EnemySnapshot, EnemyView, Event, HitEvent, HitId, HitShape,
    PlayerSnapshot, ProjectileSnapshot, StepClock,
};

const DEFAULT_SEED: u64 = 0x0c0b_a7c0_de5e_ed00;

/// Tuning knobs for damage resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Knockback impulse applied to surviving enemies.
    pub knockback: f32,
    /// Damage multiplier of a critical strike.
    pub crit_multiplier: f32,
    /// Smallest single hit that requests hit-stop.
    pub hit_stop_threshold: f32,
    /// Milliseconds of hit-stop per point of damage.
    pub hit_stop_ms_per_damage: f32,
    /// Longest hit-stop a single hit may request, in milliseconds.
    pub hit_stop_max_ms: f32,
    /// Number of resolved hit identifiers remembered for de-duplication.
    pub ledger_capacity: usize,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            knockback: 180.0,
            crit_multiplier: 2.0,
            hit_stop_threshold: 40.0,
            hit_stop_ms_per_damage: 0.8,
            hit_stop_max_ms: 100.0,
            ledger_capacity: 4_096,
        }
    }
}

/// Pure system that turns hits and projectile contacts into damage commands.
#[derive(Debug)]
pub struct Combat {
    tuning: CombatTuning,
    pending: Vec<HitEvent>,
    ledger: Ledger,
    rng: ChaCha8Rng,
    seed: u64,
}

impl Combat {
    /// Creates the combat pipeline with a deterministic crit stream.
    #[must_use]
    pub fn new(tuning: CombatTuning, seed: u64) -> Self {
        let ledger = Ledger::new(tuning.ledger_capacity);
        Self {
            tuning,
            pending: Vec::new(),
            ledger,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Queues a committed hit for the next resolution pass.
    pub fn queue(&mut self, hit: HitEvent) {
        self.pending.push(hit);
    }

    /// Queues every hit drained from `hits`.
    pub fn queue_all(&mut self, hits: &mut Vec<HitEvent>) {
        self.pending.append(hits);
    }

    /// Number of hits waiting for resolution.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Forgets pending hits and the consumed-id ledger and reseeds crits.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.ledger.clear();
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }

    /// Resolves queued hits, projectile contacts and enemy contact damage.
    pub fn handle(
        &mut self,
        events: &[Event],
        enemies: &EnemyView,
        projectiles: &[ProjectileSnapshot],
        player: &PlayerSnapshot,
        out: &mut Vec<Command>,
    ) {
        let clock = StepClock::scan(events);
        if clock.run_started {
            self.reset();
        }
        if clock.elapsed.is_zero() {
            return;
        }

        let mut heaviest = 0.0_f32;
        let hits = std::mem::take(&mut self.pending);
        for hit in &hits {
            if !self.ledger.consume(hit.id) {
                continue;
            }
            heaviest = heaviest.max(self.resolve_hit(hit, enemies, player, out));
        }

        for projectile in projectiles {
            heaviest = heaviest.max(self.resolve_projectile(projectile, enemies, player, out));
        }

        if let Some(command) = contact_damage(enemies, player) {
            out.push(command);
        }

        if heaviest >= self.tuning.hit_stop_threshold {
            let millis = (heaviest * self.tuning.hit_stop_ms_per_damage)
                .min(self.tuning.hit_stop_max_ms)
                .max(0.0);
            out.push(Command::HitStop {
                duration: Duration::from_micros((millis * 1_000.0).round() as u64),
            });
        }
    }

    fn resolve_hit(
        &mut self,
        hit: &HitEvent,
        enemies: &EnemyView,
        player: &PlayerSnapshot,
        out: &mut Vec<Command>,
    ) -> f32 {
        if !hit.owner.is_friendly() {
            if player.alive && shape_touches(&hit.shape, player.position, player.radius) {
                out.push(Command::DamagePlayer {
                    amount: hit.damage,
                    origin: hit.origin,
                });
            }
            return 0.0;
        }

        let mut heaviest = 0.0_f32;
        for enemy in enemies.iter() {
            if !enemy_in_shape(&hit.shape, enemy) {
                continue;
            }
            let (amount, is_crit) = self.roll(hit.damage, hit.can_crit, player);
            let knockback = if hit.knockback {
                self.knockback(enemy.position - hit.origin)
            } else {
                Vec2::ZERO
            };
            out.push(Command::ApplyDamage {
                enemy: enemy.id,
                amount,
                origin: hit.origin,
                knockback,
                is_crit,
                source: DamageSource::Instant(hit.id),
            });
            heaviest = heaviest.max(amount);
        }
        heaviest
    }

    fn resolve_projectile(
        &mut self,
        projectile: &ProjectileSnapshot,
        enemies: &EnemyView,
        player: &PlayerSnapshot,
        out: &mut Vec<Command>,
    ) -> f32 {
        if !projectile.owner.is_friendly() {
            let reach = projectile.radius + player.radius;
            let touched = sweep_time(
                projectile.previous_position,
                projectile.position,
                player.position,
                reach,
            );
            if player.alive && touched.is_some() {
                out.push(Command::DamagePlayer {
                    amount: projectile.damage,
                    origin: projectile.position,
                });
                out.push(Command::ExpireProjectile {
                    projectile: projectile.id,
                });
            }
            return 0.0;
        }

        let target = enemies
            .iter()
            .filter(|enemy| enemy.opacity > 0.0)
            .filter_map(|enemy| {
                sweep_time(
                    projectile.previous_position,
                    projectile.position,
                    enemy.position,
                    enemy.radius + projectile.radius,
                )
                .map(|time| (enemy, time))
            })
            .min_by(|left, right| left.1.total_cmp(&right.1))
            .map(|(enemy, _)| enemy);
        let Some(enemy) = target else {
            return 0.0;
        };

        let (amount, is_crit) = self.roll(projectile.damage, projectile.can_crit, player);
        let travel = projectile.position - projectile.previous_position;
        let push = if travel == Vec2::ZERO {
            enemy.position - projectile.position
        } else {
            travel
        };
        out.push(Command::ApplyDamage {
            enemy: enemy.id,
            amount,
            origin: projectile.position,
            knockback: self.knockback(push),
            is_crit,
            source: DamageSource::Projectile(projectile.id),
        });
        amount
    }

    fn roll(&mut self, damage: f32, can_crit: bool, player: &PlayerSnapshot) -> (f32, bool) {
        let chance = f64::from(player.stats.crit_chance.clamp(0.0, 1.0));
        if can_crit && chance > 0.0 && self.rng.gen_bool(chance) {
            (damage * self.tuning.crit_multiplier, true)
        } else {
            (damage, false)
        }
    }

    fn knockback(&self, direction: Vec2) -> Vec2 {
        direction.normalize_or_zero() * self.tuning.knockback
    }
}

impl Default for Combat {
    fn default() -> Self {
        Self::new(CombatTuning::default(), DEFAULT_SEED)
    }
}

/// Resolved identifiers, evicted oldest first once the capacity is reached.
#[derive(Debug)]
struct Ledger {
    seen: HashSet<HitId>,
    order: VecDeque<HitId>,
    capacity: usize,
}

impl Ledger {
    fn new(capacity: usize) -> Self {
        Self {
            seen: HashSet::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Records `id`, returning `false` when it was already consumed.
    fn consume(&mut self, id: HitId) -> bool {
        if !self.seen.insert(id) {
            return false;
        }
        self.order.push_back(id);
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                let _ = self.seen.remove(&evicted);
            }
        }
        true
    }

    fn clear(&mut self) {
        self.seen.clear();
        self.order.clear();
    }
}

fn contact_damage(enemies: &EnemyView, player: &PlayerSnapshot) -> Option<Command> {
    if !player.alive || player.invulnerable {
        return None;
    }
    enemies
        .iter()
        .filter(|enemy| enemy.opacity > 0.0 && enemy.contact_damage > 0.0)
        .filter(|enemy| {
            let reach = enemy.radius + player.radius;
            enemy.position.distance_squared(player.position) <= reach * reach
        })
        .max_by(|left, right| left.contact_damage.total_cmp(&right.contact_damage))
        .map(|enemy| Command::DamagePlayer {
            amount: enemy.contact_damage,
            origin: enemy.position,
        })
}

fn enemy_in_shape(shape: &HitShape, enemy: &EnemySnapshot) -> bool {
    if enemy.opacity <= 0.0 {
        return false;
    }
    match *shape {
        HitShape::Line { from, to } => {
            let extent = Vec2::splat(enemy.radius);
            segment_hits_box(from, to, enemy.position - extent, enemy.position + extent)
        }
        HitShape::Area { .. } => shape_touches(shape, enemy.position, enemy.radius),
    }
}

fn shape_touches(shape: &HitShape, point: Vec2, radius: f32) -> bool {
    match *shape {
        HitShape::Line { from, to } => sweep_time(from, to, point, radius).is_some(),
        HitShape::Area {
            center,
            radius: reach,
            arc,
        } => {
            let offset = point - center;
            let limit = reach + radius;
            if offset.length_squared() > limit * limit {
                return false;
            }
            match arc {
                None => true,
                Some(arc) => {
                    if offset.length_squared() <= radius * radius {
                        return true;
                    }
                    let direction = arc.direction.normalize_or_zero();
                    direction == Vec2::ZERO || direction.angle_between(offset).abs() <= arc.half_angle
                }
            }
        }
    }
}

/// Earliest fraction of the segment `from..to` at which a circle is touched.
fn sweep_time(from: Vec2, to: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let radius_sq = radius * radius;
    let start = from - center;
    if start.length_squared() <= radius_sq {
        return Some(0.0);
    }
    let delta = to - from;
    let a = delta.length_squared();
    if a <= f32::EPSILON {
        return None;
    }
    let b = 2.0 * start.dot(delta);
    let c = start.length_squared() - radius_sq;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let time = (-b - discriminant.sqrt()) / (2.0 * a);
    (0.0..=1.0).contains(&time).then_some(time)
}

/// Slab test between the segment `from..to` and an axis-aligned box.
fn segment_hits_box(from: Vec2, to: Vec2, min: Vec2, max: Vec2) -> bool {
    let delta = to - from;
    let mut enter = 0.0_f32;
    let mut exit = 1.0_f32;
    for axis in 0..2 {
        let origin = from[axis];
        let step = delta[axis];
        if step.abs() <= f32::EPSILON {
            if origin < min[axis] || origin > max[axis] {
                return false;
            }
            continue;
        }
        let mut near = (min[axis] - origin) / step;
        let mut far = (max[axis] - origin) / step;
        if near > far {
            std::mem::swap(&mut near, &mut far);
        }
        enter = enter.max(near);
        exit = exit.min(far);
        if enter > exit {
            return false;
        }
    }
    true
}
