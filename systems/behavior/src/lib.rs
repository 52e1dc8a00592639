#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-archetype enemy AI expressed as a single state-machine dispatch.
//!
//! Every tick each live enemy is stepped once: its [`Behavior`] variant is
//! matched, the archetype's rules produce an [`Intent`] that the world applies
//! through [`Command::DriveEnemy`], and any side effects (shots, telegraphs,
//! blinks, loot claims and extractions) are emitted as further commands.

use std::{f32::consts::TAU, time::Duration};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use wavebreak_core::{
    Behavior, Blink, Command, DashStage, EnemySnapshot, EnemyView, Event, LootId, LootSnapshot,
    Owner, ProjectileMotion, ProjectileSpec, StepClock,
};

/// Tuning knobs for every archetype's state machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorTuning {
    /// Peak heading wobble of swarmers in radians.
    pub swarm_wobble: f32,
    /// Wobble frequency of swarmers in radians per second.
    pub swarm_frequency: f32,
    /// Shooters back away when closer than this.
    pub shooter_retreat_distance: f32,
    /// Shooters close in when farther than this.
    pub shooter_pursue_distance: f32,
    /// Milliseconds between shooter shots.
    pub shooter_fire_interval_ms: u64,
    /// Milliseconds between stationary turret shots.
    pub stationary_fire_interval_ms: u64,
    /// Speed of enemy projectiles.
    pub shot_speed: f32,
    /// Collision radius of enemy projectiles.
    pub shot_radius: f32,
    /// Lifetime of enemy projectiles in milliseconds.
    pub shot_lifetime_ms: u64,
    /// Length of the dash telegraph in milliseconds.
    pub dash_windup_ms: u64,
    /// Length of the dash burst in milliseconds.
    pub dash_duration_ms: u64,
    /// Speed multiplier applied while dashing.
    pub dash_speed_multiplier: f32,
    /// Stall after a dash in milliseconds.
    pub dash_recover_ms: u64,
    /// Minimum milliseconds between dashes.
    pub dash_interval_ms: u64,
    /// Orbit radius of strafers.
    pub strafe_radius: f32,
    /// Orbit angular speed of strafers in radians per second.
    pub strafe_angular_speed: f32,
    /// Milliseconds between erratic heading changes.
    pub erratic_interval_ms: u64,
    /// Fraction of base speed used by creeping teleporters.
    pub teleport_creep_multiplier: f32,
    /// Minimum milliseconds between blinks.
    pub teleport_interval_ms: u64,
    /// Teleporters only blink when farther than this from the player.
    pub teleport_trigger_distance: f32,
    /// Closest a blink may land to the player.
    pub teleport_min_distance: f32,
    /// Farthest a blink may land from the player.
    pub teleport_max_distance: f32,
    /// Length of each blink fade in milliseconds.
    pub teleport_fade_ms: u64,
    /// Milliseconds between scavenger and extractor target scans.
    pub scan_interval_ms: u64,
    /// Reach added to an enemy's radius when claiming loot or extracting.
    pub reach: f32,
    /// Fraction of base speed used while wandering without a target.
    pub wander_multiplier: f32,
}

impl Default for BehaviorTuning {
    fn default() -> Self {
        Self {
            swarm_wobble: 0.6,
            swarm_frequency: 3.0,
            shooter_retreat_distance: 220.0,
            shooter_pursue_distance: 400.0,
            shooter_fire_interval_ms: 2_000,
            stationary_fire_interval_ms: 1_500,
            shot_speed: 260.0,
            shot_radius: 6.0,
            shot_lifetime_ms: 3_000,
            dash_windup_ms: 450,
            dash_duration_ms: 350,
            dash_speed_multiplier: 3.0,
            dash_recover_ms: 500,
            dash_interval_ms: 2_500,
            strafe_radius: 220.0,
            strafe_angular_speed: 1.2,
            erratic_interval_ms: 500,
            teleport_creep_multiplier: 0.35,
            teleport_interval_ms: 3_000,
            teleport_trigger_distance: 300.0,
            teleport_min_distance: 120.0,
            teleport_max_distance: 220.0,
            teleport_fade_ms: 250,
            scan_interval_ms: 500,
            reach: 12.0,
            wander_multiplier: 0.5,
        }
    }
}

/// Read-only world state the behaviours react to.
#[derive(Clone, Copy, Debug)]
pub struct BehaviorContext<'a> {
    /// Position of the player, or `None` when no live player exists.
    pub player: Option<Vec2>,
    /// Loot drops lying in the arena.
    pub loot: &'a [LootSnapshot],
    /// Points enemies may extract through.
    pub extraction_points: &'a [Vec2],
}

/// Movement intent produced for one enemy in one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intent {
    /// Desired velocity.
    pub velocity: Vec2,
    /// Facing direction.
    pub facing: Vec2,
    /// Visibility in `0.0..=1.0`.
    pub opacity: f32,
    /// Updated behaviour state.
    pub behavior: Behavior,
}

impl Intent {
    fn moving(velocity: Vec2, behavior: Behavior) -> Self {
        Self {
            velocity,
            facing: velocity.normalize_or_zero(),
            opacity: 1.0,
            behavior,
        }
    }

    fn facing(direction: Vec2, behavior: Behavior) -> Self {
        Self {
            velocity: Vec2::ZERO,
            facing: direction,
            opacity: 1.0,
            behavior,
        }
    }
}

/// Pure system that steps every live enemy's state machine.
#[derive(Debug)]
pub struct Behaviors {
    tuning: BehaviorTuning,
    elapsed: Duration,
    seed: u64,
    rng: ChaCha8Rng,
}

impl Behaviors {
    /// Creates the behaviour layer using the provided tuning and random seed.
    #[must_use]
    pub fn new(tuning: BehaviorTuning, seed: u64) -> Self {
        Self {
            tuning,
            elapsed: Duration::ZERO,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Clears the behaviour clock for a new run.
    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }

    /// Consumes world events and the enemy snapshot to emit drive commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        enemies: &EnemyView,
        context: &BehaviorContext<'_>,
        out: &mut Vec<Command>,
    ) {
        let clock = StepClock::scan(events);
        if clock.run_started {
            self.reset();
        }
        let dt = clock.elapsed;
        if dt.is_zero() {
            return;
        }
        self.elapsed = self.elapsed.saturating_add(dt);

        for enemy in enemies.iter() {
            let intent = self.step(enemy, dt, context, out);
            out.push(Command::DriveEnemy {
                enemy: enemy.id,
                velocity: intent.velocity,
                facing: intent.facing,
                opacity: intent.opacity,
                behavior: intent.behavior,
            });
        }
    }

    /// Advances one enemy's state machine by `dt`.
    ///
    /// Side effects are appended to `out`; the returned intent is what the
    /// enemy should do until the next tick.
    pub fn step(
        &mut self,
        enemy: &EnemySnapshot,
        dt: Duration,
        context: &BehaviorContext<'_>,
        out: &mut Vec<Command>,
    ) -> Intent {
        let toward = context
            .player
            .map(|player| (player - enemy.position).normalize_or_zero())
            .unwrap_or(Vec2::ZERO);
        let distance = context
            .player
            .map_or(f32::INFINITY, |player| player.distance(enemy.position));

        match enemy.behavior {
            Behavior::Chaser => Intent::moving(toward * enemy.speed, Behavior::Chaser),
            Behavior::Swarm { phase } => {
                let time = self.elapsed.as_secs_f32();
                let wobble = self.tuning.swarm_wobble
                    * (time * self.tuning.swarm_frequency + phase).sin();
                let heading = Vec2::from_angle(wobble).rotate(toward);
                Intent::moving(heading * enemy.speed, Behavior::Swarm { phase })
            }
            Behavior::Shooter { cooldown } => self.shooter(enemy, dt, cooldown, toward, distance, out),
            Behavior::Dash {
                stage,
                timer,
                cooldown,
                heading,
            } => self.dash(enemy, dt, (stage, timer, cooldown, heading), toward, distance, out),
            Behavior::Strafe { clockwise } => self.strafe(enemy, dt, clockwise, context.player),
            Behavior::Flee => Intent::moving(-toward * enemy.speed, Behavior::Flee),
            Behavior::Stationary { cooldown } => {
                let mut cooldown = cooldown.saturating_sub(dt);
                if context.player.is_some() && distance <= enemy.attack_range && cooldown.is_zero() {
                    self.fire(enemy, toward, out);
                    cooldown = Duration::from_millis(self.tuning.stationary_fire_interval_ms);
                }
                Intent::facing(toward, Behavior::Stationary { cooldown })
            }
            Behavior::Erratic { heading, timer } => {
                let mut heading = heading;
                let mut timer = timer.saturating_sub(dt);
                if timer.is_zero() || heading == Vec2::ZERO {
                    heading = self.random_heading();
                    timer = Duration::from_millis(self.tuning.erratic_interval_ms);
                }
                Intent::moving(heading * enemy.speed, Behavior::Erratic { heading, timer })
            }
            Behavior::Teleporter { cooldown, blink } => {
                self.teleporter(enemy, dt, cooldown, blink, toward, context.player, out)
            }
            Behavior::Scavenger {
                scan,
                target,
                heading,
            } => self.scavenger(enemy, dt, (scan, target, heading), context.loot, out),
            Behavior::Extractor {
                scan,
                target,
                heading,
            } => self.extractor(enemy, dt, (scan, target, heading), context.extraction_points, out),
        }
    }

    fn shooter(
        &mut self,
        enemy: &EnemySnapshot,
        dt: Duration,
        cooldown: Duration,
        toward: Vec2,
        distance: f32,
        out: &mut Vec<Command>,
    ) -> Intent {
        let mut cooldown = cooldown.saturating_sub(dt);
        if toward == Vec2::ZERO {
            return Intent::facing(toward, Behavior::Shooter { cooldown });
        }
        if distance < self.tuning.shooter_retreat_distance {
            let mut intent = Intent::moving(-toward * enemy.speed, Behavior::Shooter { cooldown });
            intent.facing = toward;
            return intent;
        }
        if distance > self.tuning.shooter_pursue_distance {
            return Intent::moving(toward * enemy.speed, Behavior::Shooter { cooldown });
        }
        if cooldown.is_zero() {
            self.fire(enemy, toward, out);
            cooldown = Duration::from_millis(self.tuning.shooter_fire_interval_ms);
        }
        Intent::facing(toward, Behavior::Shooter { cooldown })
    }

    fn dash(
        &mut self,
        enemy: &EnemySnapshot,
        dt: Duration,
        (stage, timer, cooldown, heading): (DashStage, Duration, Duration, Vec2),
        toward: Vec2,
        distance: f32,
        out: &mut Vec<Command>,
    ) -> Intent {
        let timer = timer.saturating_sub(dt);
        let cooldown = cooldown.saturating_sub(dt);
        let state = |stage, timer, cooldown, heading| Behavior::Dash {
            stage,
            timer,
            cooldown,
            heading,
        };

        match stage {
            DashStage::Chase => {
                if toward != Vec2::ZERO && distance <= enemy.attack_range && cooldown.is_zero() {
                    let windup = Duration::from_millis(self.tuning.dash_windup_ms);
                    out.push(Command::Telegraph {
                        enemy: enemy.id,
                        direction: toward,
                        duration: windup,
                    });
                    return Intent::facing(toward, state(DashStage::Windup, windup, cooldown, heading));
                }
                Intent::moving(
                    toward * enemy.speed,
                    state(DashStage::Chase, Duration::ZERO, cooldown, heading),
                )
            }
            DashStage::Windup => {
                if timer.is_zero() {
                    let locked = if toward == Vec2::ZERO { heading } else { toward };
                    let burst = Duration::from_millis(self.tuning.dash_duration_ms);
                    return Intent::moving(
                        locked * enemy.speed * self.tuning.dash_speed_multiplier,
                        state(DashStage::Dash, burst, cooldown, locked),
                    );
                }
                Intent::facing(toward, state(DashStage::Windup, timer, cooldown, heading))
            }
            DashStage::Dash => {
                if timer.is_zero() {
                    let recover = Duration::from_millis(self.tuning.dash_recover_ms);
                    return Intent::facing(heading, state(DashStage::Recover, recover, cooldown, heading));
                }
                Intent::moving(
                    heading * enemy.speed * self.tuning.dash_speed_multiplier,
                    state(DashStage::Dash, timer, cooldown, heading),
                )
            }
            DashStage::Recover => {
                if timer.is_zero() {
                    let interval = Duration::from_millis(self.tuning.dash_interval_ms);
                    return Intent::facing(
                        heading,
                        state(DashStage::Chase, Duration::ZERO, interval, heading),
                    );
                }
                Intent::facing(heading, state(DashStage::Recover, timer, cooldown, heading))
            }
        }
    }

    fn strafe(
        &mut self,
        enemy: &EnemySnapshot,
        dt: Duration,
        clockwise: bool,
        player: Option<Vec2>,
    ) -> Intent {
        let behavior = Behavior::Strafe { clockwise };
        let Some(player) = player else {
            return Intent::facing(Vec2::ZERO, behavior);
        };
        let offset = enemy.position - player;
        let sign = if clockwise { -1.0 } else { 1.0 };
        let angle = offset.y.atan2(offset.x) + sign * self.tuning.strafe_angular_speed * dt.as_secs_f32();
        let target = player + Vec2::from_angle(angle) * self.tuning.strafe_radius;
        let seconds = dt.as_secs_f32().max(f32::EPSILON);
        let velocity = ((target - enemy.position) / seconds).clamp_length_max(enemy.speed);
        let mut intent = Intent::moving(velocity, behavior);
        intent.facing = (player - enemy.position).normalize_or_zero();
        intent
    }

    fn teleporter(
        &mut self,
        enemy: &EnemySnapshot,
        dt: Duration,
        cooldown: Duration,
        blink: Blink,
        toward: Vec2,
        player: Option<Vec2>,
        out: &mut Vec<Command>,
    ) -> Intent {
        let fade = Duration::from_millis(self.tuning.teleport_fade_ms);
        let fraction = |remaining: Duration| {
            if fade.is_zero() {
                0.0
            } else {
                remaining.as_secs_f32() / fade.as_secs_f32()
            }
        };

        match blink {
            Blink::Creep => {
                let cooldown = cooldown.saturating_sub(dt);
                if let Some(player) = player {
                    if cooldown.is_zero()
                        && player.distance(enemy.position) > self.tuning.teleport_trigger_distance
                    {
                        let (low, high) = (
                            self.tuning.teleport_min_distance,
                            self.tuning.teleport_max_distance.max(self.tuning.teleport_min_distance),
                        );
                        let radius = if high > low {
                            self.rng.gen_range(low..high)
                        } else {
                            low
                        };
                        let destination = player + self.random_heading() * radius;
                        return Intent::facing(
                            toward,
                            Behavior::Teleporter {
                                cooldown,
                                blink: Blink::FadeOut {
                                    remaining: fade,
                                    destination,
                                },
                            },
                        );
                    }
                }
                let speed = enemy.speed * self.tuning.teleport_creep_multiplier;
                Intent::moving(
                    toward * speed,
                    Behavior::Teleporter {
                        cooldown,
                        blink: Blink::Creep,
                    },
                )
            }
            Blink::FadeOut {
                remaining,
                destination,
            } => {
                let remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    out.push(Command::TeleportEnemy {
                        enemy: enemy.id,
                        position: destination,
                    });
                    let mut intent = Intent::facing(
                        toward,
                        Behavior::Teleporter {
                            cooldown,
                            blink: Blink::FadeIn { remaining: fade },
                        },
                    );
                    intent.opacity = 0.0;
                    return intent;
                }
                let mut intent = Intent::facing(
                    toward,
                    Behavior::Teleporter {
                        cooldown,
                        blink: Blink::FadeOut {
                            remaining,
                            destination,
                        },
                    },
                );
                intent.opacity = fraction(remaining);
                intent
            }
            Blink::FadeIn { remaining } => {
                let remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    return Intent::facing(
                        toward,
                        Behavior::Teleporter {
                            cooldown: Duration::from_millis(self.tuning.teleport_interval_ms),
                            blink: Blink::Creep,
                        },
                    );
                }
                let mut intent = Intent::facing(
                    toward,
                    Behavior::Teleporter {
                        cooldown,
                        blink: Blink::FadeIn { remaining },
                    },
                );
                intent.opacity = 1.0 - fraction(remaining);
                intent
            }
        }
    }

    fn scavenger(
        &mut self,
        enemy: &EnemySnapshot,
        dt: Duration,
        (scan, target, heading): (Duration, Option<LootId>, Vec2),
        loot: &[LootSnapshot],
        out: &mut Vec<Command>,
    ) -> Intent {
        let mut scan = scan.saturating_sub(dt);
        let mut target = target.filter(|id| loot.iter().any(|drop| drop.id == *id));
        let mut heading = heading;
        if scan.is_zero() {
            scan = Duration::from_millis(self.tuning.scan_interval_ms);
            target = loot
                .iter()
                .min_by(|left, right| {
                    left.position
                        .distance_squared(enemy.position)
                        .total_cmp(&right.position.distance_squared(enemy.position))
                })
                .map(|drop| drop.id);
            if target.is_none() {
                heading = self.random_heading();
            }
        }

        let destination = target.and_then(|id| loot.iter().find(|drop| drop.id == id));
        match destination {
            Some(drop) => {
                if drop.position.distance(enemy.position) <= enemy.radius + self.tuning.reach {
                    out.push(Command::ClaimLoot {
                        enemy: enemy.id,
                        loot: drop.id,
                    });
                    let behavior = Behavior::Scavenger {
                        scan: Duration::ZERO,
                        target: None,
                        heading,
                    };
                    return Intent::facing(heading, behavior);
                }
                let direction = (drop.position - enemy.position).normalize_or_zero();
                Intent::moving(
                    direction * enemy.speed,
                    Behavior::Scavenger {
                        scan,
                        target,
                        heading,
                    },
                )
            }
            None => Intent::moving(
                heading * enemy.speed * self.tuning.wander_multiplier,
                Behavior::Scavenger {
                    scan,
                    target: None,
                    heading,
                },
            ),
        }
    }

    fn extractor(
        &mut self,
        enemy: &EnemySnapshot,
        dt: Duration,
        (scan, target, heading): (Duration, Option<Vec2>, Vec2),
        points: &[Vec2],
        out: &mut Vec<Command>,
    ) -> Intent {
        let mut scan = scan.saturating_sub(dt);
        let mut target = target;
        let mut heading = heading;
        if scan.is_zero() {
            scan = Duration::from_millis(self.tuning.scan_interval_ms);
            target = points
                .iter()
                .copied()
                .min_by(|left, right| {
                    left.distance_squared(enemy.position)
                        .total_cmp(&right.distance_squared(enemy.position))
                });
            if target.is_none() {
                heading = self.random_heading();
            }
        }

        match target {
            Some(point) => {
                if point.distance(enemy.position) <= enemy.radius + self.tuning.reach {
                    log::debug!("{:?} reached extraction point {point:?}", enemy.id);
                    out.push(Command::ExtractEnemy { enemy: enemy.id });
                    return Intent::facing(
                        heading,
                        Behavior::Extractor {
                            scan,
                            target,
                            heading,
                        },
                    );
                }
                let direction = (point - enemy.position).normalize_or_zero();
                Intent::moving(
                    direction * enemy.speed,
                    Behavior::Extractor {
                        scan,
                        target,
                        heading,
                    },
                )
            }
            None => Intent::moving(
                heading * enemy.speed * self.tuning.wander_multiplier,
                Behavior::Extractor {
                    scan,
                    target,
                    heading,
                },
            ),
        }
    }

    fn fire(&mut self, enemy: &EnemySnapshot, direction: Vec2, out: &mut Vec<Command>) {
        if direction == Vec2::ZERO {
            return;
        }
        out.push(Command::FireProjectile {
            spec: ProjectileSpec {
                owner: Owner::Enemy(enemy.id),
                origin: enemy.position + direction * enemy.radius,
                velocity: direction * self.tuning.shot_speed,
                damage: enemy.contact_damage,
                radius: self.tuning.shot_radius,
                lifetime: Duration::from_millis(self.tuning.shot_lifetime_ms),
                motion: ProjectileMotion::Straight,
                can_crit: false,
            },
        });
    }

    fn random_heading(&mut self) -> Vec2 {
        Vec2::from_angle(self.rng.gen_range(0.0..TAU))
    }
}

impl Default for Behaviors {
    fn default() -> Self {
        Self::new(BehaviorTuning::default(), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavebreak_core::{Archetype, EnemyConfig, EnemyId, Faction, Rank};

    fn snapshot(archetype: Archetype, position: Vec2) -> EnemySnapshot {
        let config = EnemyConfig::new(archetype, Faction::Cultist, Rank::Normal, 1.0);
        EnemySnapshot {
            id: EnemyId::new(0, 1),
            archetype,
            faction: config.faction,
            rank: config.rank,
            position,
            velocity: Vec2::ZERO,
            health: config.max_health,
            max_health: config.max_health,
            speed: config.speed,
            contact_damage: config.contact_damage,
            attack_range: config.attack_range,
            radius: config.radius,
            reward: config.reward,
            opacity: 1.0,
            behavior: Behavior::initial(archetype, position),
        }
    }

    fn context(player: Vec2) -> BehaviorContext<'static> {
        BehaviorContext {
            player: Some(player),
            loot: &[],
            extraction_points: &[],
        }
    }

    #[test]
    fn shooter_holds_band_and_fires() {
        let mut behaviors = Behaviors::default();
        let mut out = Vec::new();
        let mut enemy = snapshot(Archetype::Shooter, Vec2::new(100.0, 0.0));
        let close = behaviors.step(&enemy, Duration::from_millis(16), &context(Vec2::ZERO), &mut out);
        assert!(close.velocity.x > 0.0, "retreats when too close");

        enemy.position = Vec2::new(500.0, 0.0);
        let far = behaviors.step(&enemy, Duration::from_millis(16), &context(Vec2::ZERO), &mut out);
        assert!(far.velocity.x < 0.0, "pursues when too far");

        enemy.position = Vec2::new(300.0, 0.0);
        enemy.behavior = Behavior::Shooter {
            cooldown: Duration::ZERO,
        };
        let hold = behaviors.step(&enemy, Duration::from_millis(16), &context(Vec2::ZERO), &mut out);
        assert_eq!(hold.velocity, Vec2::ZERO);
        assert!(matches!(
            out.as_slice(),
            [Command::FireProjectile { .. }]
        ));
        assert!(matches!(
            hold.behavior,
            Behavior::Shooter { cooldown } if cooldown == Duration::from_secs(2)
        ));
    }

    #[test]
    fn dash_telegraphs_before_bursting() {
        let mut behaviors = Behaviors::default();
        let mut out = Vec::new();
        let mut enemy = snapshot(Archetype::Dash, Vec2::new(200.0, 0.0));
        let dt = Duration::from_millis(50);

        let windup = behaviors.step(&enemy, dt, &context(Vec2::ZERO), &mut out);
        assert!(matches!(out.as_slice(), [Command::Telegraph { .. }]));
        assert_eq!(windup.velocity, Vec2::ZERO);
        enemy.behavior = windup.behavior;

        let mut stages = Vec::new();
        for _ in 0..80 {
            let intent = behaviors.step(&enemy, dt, &context(Vec2::ZERO), &mut out);
            if let Behavior::Dash { stage, .. } = intent.behavior {
                if stages.last() != Some(&stage) {
                    stages.push(stage);
                }
                if stage == DashStage::Dash {
                    assert!(intent.velocity.length() > enemy.speed * 2.9);
                }
            }
            enemy.behavior = intent.behavior;
        }
        assert_eq!(
            stages,
            vec![
                DashStage::Windup,
                DashStage::Dash,
                DashStage::Recover,
                DashStage::Chase,
                DashStage::Windup,
            ]
        );
    }

    #[test]
    fn strafer_converges_on_orbit() {
        let mut behaviors = Behaviors::default();
        let mut out = Vec::new();
        let mut enemy = snapshot(Archetype::Strafe, Vec2::new(400.0, 0.0));
        let dt = Duration::from_millis(16);
        for _ in 0..600 {
            let intent = behaviors.step(&enemy, dt, &context(Vec2::ZERO), &mut out);
            enemy.position += intent.velocity * dt.as_secs_f32();
        }
        assert!((enemy.position.length() - 220.0).abs() < 5.0);
    }

    #[test]
    fn teleporter_blinks_into_band() {
        let mut behaviors = Behaviors::default();
        let mut out = Vec::new();
        let mut enemy = snapshot(Archetype::Teleporter, Vec2::new(800.0, 0.0));
        let dt = Duration::from_millis(50);
        let mut opacities = Vec::new();
        for _ in 0..80 {
            let intent = behaviors.step(&enemy, dt, &context(Vec2::ZERO), &mut out);
            opacities.push(intent.opacity);
            enemy.behavior = intent.behavior;
        }
        let destination = out.iter().find_map(|command| match command {
            Command::TeleportEnemy { position, .. } => Some(*position),
            _ => None,
        });
        let distance = destination.expect("teleported").length();
        assert!((120.0..=220.0).contains(&distance));
        assert!(opacities.iter().any(|opacity| *opacity < 0.5));
    }

    #[test]
    fn scavenger_claims_loot_on_contact() {
        let mut behaviors = Behaviors::default();
        let mut out = Vec::new();
        let loot = [LootSnapshot {
            id: LootId::new(4),
            position: Vec2::new(5.0, 0.0),
            value: 3,
        }];
        let ctx = BehaviorContext {
            player: None,
            loot: &loot,
            extraction_points: &[],
        };
        let enemy = snapshot(Archetype::Scavenger, Vec2::ZERO);
        let _ = behaviors.step(&enemy, Duration::from_millis(16), &ctx, &mut out);
        assert!(matches!(
            out.as_slice(),
            [Command::ClaimLoot { loot, .. }] if *loot == LootId::new(4)
        ));
    }

    #[test]
    fn extractor_leaves_at_extraction_point() {
        let mut behaviors = Behaviors::default();
        let mut out = Vec::new();
        let points = [Vec2::new(100.0, 0.0)];
        let ctx = BehaviorContext {
            player: Some(Vec2::new(-300.0, 0.0)),
            loot: &[],
            extraction_points: &points,
        };
        let mut enemy = snapshot(Archetype::Extractor, Vec2::ZERO);
        let dt = Duration::from_millis(50);
        for _ in 0..40 {
            let intent = behaviors.step(&enemy, dt, &ctx, &mut out);
            enemy.position += intent.velocity * dt.as_secs_f32();
            enemy.behavior = intent.behavior;
            if !out.is_empty() {
                break;
            }
        }
        assert!(matches!(out.as_slice(), [Command::ExtractEnemy { .. }]));
    }

    #[test]
    fn swarm_weaves_while_closing_in() {
        let mut behaviors = Behaviors::new(BehaviorTuning::default(), 17);
        let enemy = snapshot(Archetype::Swarm, Vec2::new(300.0, 0.0));
        let enemies = EnemyView::from_snapshots(vec![enemy]);
        let events = [Event::TimeAdvanced {
            dt: Duration::from_millis(50),
        }];
        let toward = Vec2::new(-1.0, 0.0);

        let mut sides = Vec::new();
        for _ in 0..50 {
            let mut out = Vec::new();
            behaviors.handle(&events, &enemies, &context(Vec2::ZERO), &mut out);
            let Some(Command::DriveEnemy { velocity, .. }) = out.first() else {
                panic!("swarm was not driven");
            };
            assert!(velocity.dot(toward) > 0.0, "swarm keeps closing in");
            sides.push(toward.perp_dot(*velocity));
        }
        assert!(sides.iter().any(|side| *side > 1.0));
        assert!(sides.iter().any(|side| *side < -1.0));
    }

    #[test]
    fn erratic_keeps_heading_until_timer_expires() {
        let mut behaviors = Behaviors::new(BehaviorTuning::default(), 23);
        let mut out = Vec::new();
        let mut enemy = snapshot(Archetype::Erratic, Vec2::ZERO);
        let dt = Duration::from_millis(100);

        let mut headings = Vec::new();
        for _ in 0..25 {
            let intent = behaviors.step(&enemy, dt, &context(Vec2::new(500.0, 0.0)), &mut out);
            let Behavior::Erratic { heading, .. } = intent.behavior else {
                panic!("erratic changed archetype");
            };
            headings.push(heading);
            enemy.behavior = intent.behavior;
        }

        for interval in headings.chunks(5) {
            assert!(interval.iter().all(|heading| *heading == interval[0]));
            assert!((interval[0].length() - 1.0).abs() < 1e-4);
        }
        let first = headings[0];
        assert!(headings.iter().skip(5).step_by(5).any(|heading| *heading != first));
        assert!(out.is_empty());
    }

    #[test]
    fn flee_runs_away_from_player() {
        let mut behaviors = Behaviors::default();
        let mut out = Vec::new();
        let player = Vec2::new(40.0, -30.0);
        for position in [Vec2::new(100.0, 0.0), Vec2::new(-80.0, 200.0), Vec2::new(40.0, -90.0)] {
            let enemy = snapshot(Archetype::Flee, position);
            let intent = behaviors.step(&enemy, Duration::from_millis(16), &context(player), &mut out);
            assert!(intent.velocity.dot(position - player) > 0.0);
            assert!((intent.velocity.length() - enemy.speed).abs() < 1e-3);
        }
    }

    #[test]
    fn missing_player_never_panics() {
        let mut behaviors = Behaviors::default();
        let mut out = Vec::new();
        let ctx = BehaviorContext {
            player: None,
            loot: &[],
            extraction_points: &[],
        };
        for archetype in Archetype::ALL {
            let enemy = snapshot(archetype, Vec2::new(10.0, 10.0));
            let intent = behaviors.step(&enemy, Duration::from_millis(16), &ctx, &mut out);
            assert!(intent.velocity.is_finite());
        }
        assert!(out.is_empty());
    }
}
