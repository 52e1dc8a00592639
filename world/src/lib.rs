#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative encounter state for Wavebreak.
//!
//! The world owns every pooled enemy and projectile, the player actor, loot
//! drops and the run clock. Nothing else mutates that state: adapters and
//! systems submit [`Command`] values to [`apply`] and observe the resulting
//! [`Event`] stream, while [`query`] exposes read-only snapshots.

mod enemies;
pub mod pool;
mod player;
mod projectiles;

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use wavebreak_core::{
    Command, DamageSource, EffectiveStats, EnemyConfig, EnemyId, Event, LootId, PlayerClass,
    ProjectileId, ProjectileMotion, ProjectileSpec, SpawnRejection, DEFAULT_POPULATION_CAP,
};

use crate::{
    enemies::{Enemy, EnemySpawn},
    player::Player,
    pool::Pool,
    projectiles::Projectile,
};

/// Tunable parameters of the authoritative world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Maximum number of simultaneously live enemies.
    pub population_cap: usize,
    /// Dormant enemies created up front.
    pub enemy_pool_prewarm: usize,
    /// Released enemies retained for reuse.
    pub enemy_pool_retain: usize,
    /// Dormant projectiles created up front.
    pub projectile_pool_prewarm: usize,
    /// Released projectiles retained for reuse.
    pub projectile_pool_retain: usize,
    /// Maximum number of simultaneously live projectiles.
    pub projectile_limit: usize,
    /// Player movement speed before the stat bonus.
    pub player_speed: f32,
    /// Invulnerability window granted after the player is hit, in milliseconds.
    pub invulnerability_ms: u64,
    /// Length of the hit flash applied to damaged enemies, in milliseconds.
    pub hit_flash_ms: u64,
    /// Exponential decay rate of enemy knockback per second.
    pub knockback_damping: f32,
    /// Distance at which the player collects loot.
    pub pickup_radius: f32,
    /// Points enemies may leave the arena through.
    pub extraction_points: Vec<Vec2>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            population_cap: DEFAULT_POPULATION_CAP,
            enemy_pool_prewarm: 64,
            enemy_pool_retain: 512,
            projectile_pool_prewarm: 128,
            projectile_pool_retain: 1_024,
            projectile_limit: 2_048,
            player_speed: 220.0,
            invulnerability_ms: 500,
            hit_flash_ms: 80,
            knockback_damping: 8.0,
            pickup_radius: 40.0,
            extraction_points: vec![
                Vec2::new(900.0, 0.0),
                Vec2::new(-900.0, 0.0),
                Vec2::new(0.0, 900.0),
                Vec2::new(0.0, -900.0),
            ],
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Loot {
    id: LootId,
    position: Vec2,
    value: u32,
}

/// Represents the authoritative Wavebreak world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    enemies: Pool<Enemy, EnemyId>,
    projectiles: Pool<Projectile, ProjectileId>,
    player: Player,
    loot: Vec<Loot>,
    next_loot: u32,
    active: bool,
    paused: bool,
    hit_stop: Duration,
    survival_time: Duration,
    loot_collected: u32,
}

impl World {
    /// Creates an idle world using the provided configuration.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        let enemies = Pool::new(config.enemy_pool_prewarm, config.enemy_pool_retain);
        let projectiles = Pool::new(config.projectile_pool_prewarm, config.projectile_pool_retain)
            .with_live_limit(config.projectile_limit);
        Self {
            config,
            enemies,
            projectiles,
            player: Player::new(),
            loot: Vec::new(),
            next_loot: 0,
            active: false,
            paused: false,
            hit_stop: Duration::ZERO,
            survival_time: Duration::ZERO,
            loot_collected: 0,
        }
    }

    fn clear_run(&mut self) {
        self.enemies.release_all();
        self.projectiles.release_all();
        self.loot.clear();
        self.paused = false;
        self.hit_stop = Duration::ZERO;
        self.survival_time = Duration::ZERO;
        self.loot_collected = 0;
    }

    fn start_run(&mut self, class: PlayerClass, stats: EffectiveStats) {
        self.clear_run();
        self.next_loot = 0;
        self.player.spawn(class, stats);
        self.active = true;
    }

    fn spawn_enemy(&mut self, config: EnemyConfig, position: Vec2) -> Result<EnemyId, SpawnRejection> {
        if !self.active {
            return Err(SpawnRejection::RunInactive);
        }
        if self.enemies.live() >= self.config.population_cap {
            return Err(SpawnRejection::PopulationCap);
        }
        self.enemies
            .acquire(EnemySpawn { config, position })
            .map_err(|error| {
                log::debug!("enemy pool refused spawn: {error}");
                SpawnRejection::PoolExhausted
            })
    }

    fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.survival_time = self.survival_time.saturating_add(dt);
        self.player.advance(dt, self.config.player_speed);

        let damping = self.config.knockback_damping;
        for (_, enemy) in self.enemies.iter_mut() {
            enemy.advance(dt, damping);
        }

        let mut expired = Vec::new();
        for (id, projectile) in self.projectiles.iter_mut() {
            let target = match projectile.motion {
                ProjectileMotion::Homing { target, .. } => {
                    self.enemies.get(target).map(|enemy| enemy.position)
                }
                ProjectileMotion::Straight => None,
            };
            if !projectile.advance(dt, target) {
                expired.push(id);
            }
        }
        for projectile in expired {
            if self.projectiles.release(projectile) {
                out_events.push(Event::ProjectileExpired { projectile });
            }
        }

        if self.player.alive {
            let reach = self.config.pickup_radius;
            let origin = self.player.position;
            let mut index = 0;
            while index < self.loot.len() {
                if self.loot[index].position.distance(origin) <= reach {
                    let loot = self.loot.remove(index);
                    self.loot_collected = self.loot_collected.saturating_add(loot.value);
                    out_events.push(Event::LootCollected {
                        loot: loot.id,
                        value: loot.value,
                    });
                } else {
                    index += 1;
                }
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartRun { class, stats } => {
            world.start_run(class, stats);
            out_events.push(Event::RunStarted { class });
        }
        Command::EndRun { reason } => {
            if world.active {
                world.clear_run();
                world.active = false;
                out_events.push(Event::RunEnded { reason });
            }
        }
        Command::SetPaused { paused } => {
            if world.active && world.paused != paused {
                world.paused = paused;
                out_events.push(Event::PauseChanged { paused });
            }
        }
        Command::Tick { dt } => {
            if !world.active || world.paused {
                return;
            }
            let frozen = dt.min(world.hit_stop);
            world.hit_stop -= frozen;
            let simulated = dt - frozen;
            if simulated.is_zero() {
                return;
            }
            out_events.push(Event::TimeAdvanced { dt: simulated });
            world.advance(simulated, out_events);
        }
        Command::HitStop { duration } => {
            if world.active && duration > world.hit_stop {
                world.hit_stop = duration;
                out_events.push(Event::HitStopStarted { duration });
            }
        }
        Command::SetPlayerIntent { direction } => world.player.set_intent(direction),
        Command::UpdatePlayerStats { stats } => world.player.update_stats(stats),
        Command::RescalePlayer {
            level,
            health_multiplier,
            damage_multiplier,
        } => {
            let max_health = world
                .player
                .rescale(level, health_multiplier, damage_multiplier);
            out_events.push(Event::PlayerRescaled { level, max_health });
        }
        Command::SpawnEnemy { config, position } => {
            match world.spawn_enemy(config, position) {
                Ok(enemy) => out_events.push(Event::EnemySpawned {
                    enemy,
                    archetype: config.archetype,
                    faction: config.faction,
                    rank: config.rank,
                    position,
                }),
                Err(reason) => out_events.push(Event::SpawnRejected {
                    archetype: config.archetype,
                    reason,
                }),
            }
        }
        Command::DriveEnemy {
            enemy,
            velocity,
            facing,
            opacity,
            behavior,
        } => {
            if let Some(state) = world.enemies.get_mut(enemy) {
                state.velocity = velocity;
                if facing != Vec2::ZERO {
                    state.facing = facing.normalize_or_zero();
                }
                state.opacity = opacity.clamp(0.0, 1.0);
                state.behavior = behavior;
            }
        }
        Command::Telegraph {
            enemy,
            direction,
            duration,
        } => {
            if let Some(state) = world.enemies.get(enemy) {
                let direction = if direction == Vec2::ZERO {
                    state.facing
                } else {
                    direction.normalize_or_zero()
                };
                out_events.push(Event::AttackTelegraphed {
                    enemy,
                    position: state.position,
                    direction,
                    duration,
                });
            }
        }
        Command::TeleportEnemy { enemy, position } => {
            if let Some(state) = world.enemies.get_mut(enemy) {
                let from = state.position;
                state.position = position;
                state.knockback = Vec2::ZERO;
                out_events.push(Event::EnemyTeleported {
                    enemy,
                    from,
                    to: position,
                });
            }
        }
        Command::ExtractEnemy { enemy } => {
            let Some(position) = world.enemies.get(enemy).map(|state| state.position) else {
                return;
            };
            if world.enemies.release(enemy) {
                out_events.push(Event::EnemyExtracted { enemy, position });
            }
        }
        Command::ClaimLoot { enemy, loot } => {
            if !world.enemies.contains(enemy) {
                return;
            }
            if let Some(index) = world.loot.iter().position(|drop| drop.id == loot) {
                let _ = world.loot.remove(index);
                out_events.push(Event::LootClaimed { loot, enemy });
            }
        }
        Command::FireProjectile { spec } => fire_projectile(world, spec, out_events),
        Command::ExpireProjectile { projectile } => {
            if world.projectiles.release(projectile) {
                out_events.push(Event::ProjectileExpired { projectile });
            }
        }
        Command::ApplyDamage {
            enemy,
            amount,
            origin: _,
            knockback,
            is_crit,
            source,
        } => apply_damage(world, enemy, amount, knockback, is_crit, source, out_events),
        Command::DamagePlayer { amount, origin } => {
            if !world.active {
                return;
            }
            let invulnerability = Duration::from_millis(world.config.invulnerability_ms);
            if let Some(taken) = world.player.take_damage(amount, invulnerability) {
                out_events.push(Event::PlayerDamaged {
                    amount: taken,
                    health: world.player.health,
                    origin,
                });
                if !world.player.alive {
                    out_events.push(Event::PlayerDied {
                        position: world.player.position,
                    });
                }
            }
        }
        Command::DropLoot { position, value } => {
            if !world.active {
                return;
            }
            let id = LootId::new(world.next_loot);
            world.next_loot = world.next_loot.wrapping_add(1);
            world.loot.push(Loot {
                id,
                position,
                value,
            });
            out_events.push(Event::LootDropped {
                loot: id,
                position,
                value,
            });
        }
    }
}

fn fire_projectile(world: &mut World, spec: ProjectileSpec, out_events: &mut Vec<Event>) {
    if !world.active {
        return;
    }
    match world.projectiles.acquire(spec) {
        Ok(projectile) => out_events.push(Event::ProjectileFired {
            projectile,
            owner: spec.owner,
            position: spec.origin,
        }),
        Err(error) => log::debug!("projectile dropped: {error}"),
    }
}

fn apply_damage(
    world: &mut World,
    enemy: EnemyId,
    amount: f32,
    knockback: Vec2,
    is_crit: bool,
    source: DamageSource,
    out_events: &mut Vec<Event>,
) {
    if !world.enemies.contains(enemy) {
        return;
    }
    if let DamageSource::Projectile(projectile) = source {
        // A projectile resolves at most one hit; a stale handle means it was already spent.
        if !world.projectiles.release(projectile) {
            return;
        }
        out_events.push(Event::ProjectileExpired { projectile });
    }

    let flash = Duration::from_millis(world.config.hit_flash_ms);
    let Some(state) = world.enemies.get_mut(enemy) else {
        return;
    };
    state.health -= amount.max(0.0);
    state.flash = flash;
    let lethal = state.health <= 0.0;
    if !lethal {
        state.knockback += knockback;
    }
    let position = state.position;
    let config = state.config;
    out_events.push(Event::DamageApplied {
        enemy,
        position,
        amount,
        is_crit,
        lethal,
    });

    if lethal && world.enemies.release(enemy) {
        out_events.push(Event::EnemyKilled {
            enemy,
            position,
            reward: config.reward,
            archetype: config.archetype,
            faction: config.faction,
            rank: config.rank,
        });
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use glam::Vec2;
    use wavebreak_core::{
        EnemyId, EnemySnapshot, EnemyView, LootSnapshot, PlayerSnapshot, ProjectileSnapshot,
    };

    use super::World;

    /// Captures a read-only view of every live enemy.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .enemies
                .iter()
                .map(|(id, enemy)| enemy.snapshot(id))
                .collect(),
        )
    }

    /// Captures a single live enemy, if the identifier is still current.
    #[must_use]
    pub fn enemy(world: &World, id: EnemyId) -> Option<EnemySnapshot> {
        world.enemies.get(id).map(|enemy| enemy.snapshot(id))
    }

    /// Number of enemies currently alive.
    #[must_use]
    pub fn live_enemy_count(world: &World) -> usize {
        world.enemies.live()
    }

    /// Ceiling on simultaneously live enemies.
    #[must_use]
    pub fn population_cap(world: &World) -> usize {
        world.config.population_cap
    }

    /// Captures every live projectile ordered by identifier.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        let mut snapshots: Vec<ProjectileSnapshot> = world
            .projectiles
            .iter()
            .map(|(id, projectile)| projectile.snapshot(id))
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        snapshots
    }

    /// Captures the player actor.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        world.player.snapshot()
    }

    /// Captures every loot drop lying in the arena.
    #[must_use]
    pub fn loot(world: &World) -> Vec<LootSnapshot> {
        world
            .loot
            .iter()
            .map(|drop| LootSnapshot {
                id: drop.id,
                position: drop.position,
                value: drop.value,
            })
            .collect()
    }

    /// Points enemies may extract through.
    #[must_use]
    pub fn extraction_points(world: &World) -> &[Vec2] {
        &world.config.extraction_points
    }

    /// Simulated time elapsed in the current run.
    #[must_use]
    pub fn survival_time(world: &World) -> Duration {
        world.survival_time
    }

    /// Reports whether a run is in progress.
    #[must_use]
    pub fn is_run_active(world: &World) -> bool {
        world.active
    }

    /// Reports whether the simulation is paused.
    #[must_use]
    pub fn is_paused(world: &World) -> bool {
        world.paused
    }

    /// Wall-clock time the current hit-stop will still freeze.
    #[must_use]
    pub fn hit_stop_remaining(world: &World) -> Duration {
        world.hit_stop
    }

    /// Total loot value the player picked up this run.
    #[must_use]
    pub fn loot_collected(world: &World) -> u32 {
        world.loot_collected
    }

    /// Occupancy of the actor pools.
    #[must_use]
    pub fn pool_stats(world: &World) -> PoolStats {
        PoolStats {
            enemies_live: world.enemies.live(),
            enemies_free: world.enemies.free(),
            projectiles_live: world.projectiles.live(),
            projectiles_free: world.projectiles.free(),
        }
    }

    /// Occupancy counters of the world's pools.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PoolStats {
        /// Live enemies.
        pub enemies_live: usize,
        /// Dormant enemies ready for reuse.
        pub enemies_free: usize,
        /// Live projectiles.
        pub projectiles_live: usize,
        /// Dormant projectiles ready for reuse.
        pub projectiles_free: usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavebreak_core::{Archetype, Faction, Owner, Rank, RunEndReason};

    fn running_world() -> World {
        let mut world = World::default();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::StartRun {
                class: PlayerClass::Gunner,
                stats: EffectiveStats::default(),
            },
            &mut events,
        );
        world
    }

    fn spawn(world: &mut World, archetype: Archetype, position: Vec2) -> EnemyId {
        let mut events = Vec::new();
        apply(
            world,
            Command::SpawnEnemy {
                config: EnemyConfig::new(archetype, Faction::Vermin, Rank::Normal, 1.0),
                position,
            },
            &mut events,
        );
        match events.as_slice() {
            [Event::EnemySpawned { enemy, .. }] => *enemy,
            other => panic!("unexpected spawn events: {other:?}"),
        }
    }

    fn damage(world: &mut World, enemy: EnemyId, amount: f32, hit: u64) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::ApplyDamage {
                enemy,
                amount,
                origin: Vec2::ZERO,
                knockback: Vec2::new(180.0, 0.0),
                is_crit: false,
                source: DamageSource::Instant(wavebreak_core::HitId::new(hit)),
            },
            &mut events,
        );
        events
    }

    #[test]
    fn second_hit_kills_once_without_knockback() {
        let mut world = running_world();
        let mut config = EnemyConfig::new(Archetype::Chaser, Faction::Vermin, Rank::Normal, 1.0);
        config.max_health = 50.0;
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnEnemy {
                config,
                position: Vec2::new(100.0, 0.0),
            },
            &mut events,
        );
        let enemy = query::enemy_view(&world).iter().next().map(|s| s.id).expect("spawned");

        let first = damage(&mut world, enemy, 30.0, 1);
        assert!(matches!(
            first.as_slice(),
            [Event::DamageApplied { lethal: false, .. }]
        ));
        let after_first = query::enemy(&world, enemy).expect("alive");
        assert!((after_first.health - 20.0).abs() < f32::EPSILON);

        let second = damage(&mut world, enemy, 25.0, 2);
        let kills = second
            .iter()
            .filter(|event| matches!(event, Event::EnemyKilled { .. }))
            .count();
        assert_eq!(kills, 1);
        assert!(matches!(
            second.first(),
            Some(Event::DamageApplied { lethal: true, .. })
        ));
        assert!(query::enemy(&world, enemy).is_none());
        assert!(damage(&mut world, enemy, 25.0, 3).is_empty());
    }

    #[test]
    fn surviving_hit_applies_knockback() {
        let mut world = running_world();
        let enemy = spawn(&mut world, Archetype::Stationary, Vec2::new(50.0, 0.0));
        let _ = damage(&mut world, enemy, 5.0, 1);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(100),
            },
            &mut events,
        );
        let snapshot = query::enemy(&world, enemy).expect("alive");
        assert!(snapshot.position.x > 50.0);
    }

    #[test]
    fn projectile_damage_is_applied_once() {
        let mut world = running_world();
        let enemy = spawn(&mut world, Archetype::Chaser, Vec2::new(40.0, 0.0));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::FireProjectile {
                spec: ProjectileSpec {
                    owner: Owner::Player,
                    origin: Vec2::ZERO,
                    velocity: Vec2::new(400.0, 0.0),
                    damage: 4.0,
                    radius: 4.0,
                    lifetime: Duration::from_secs(1),
                    motion: ProjectileMotion::Straight,
                    can_crit: false,
                },
            },
            &mut events,
        );
        let Some(Event::ProjectileFired { projectile, .. }) = events.first().cloned() else {
            panic!("projectile was not fired: {events:?}");
        };

        let hit = Command::ApplyDamage {
            enemy,
            amount: 4.0,
            origin: Vec2::ZERO,
            knockback: Vec2::ZERO,
            is_crit: false,
            source: DamageSource::Projectile(projectile),
        };
        let mut first = Vec::new();
        apply(&mut world, hit.clone(), &mut first);
        let mut second = Vec::new();
        apply(&mut world, hit, &mut second);

        assert!(first
            .iter()
            .any(|event| matches!(event, Event::DamageApplied { .. })));
        assert!(second.is_empty());
        let snapshot = query::enemy(&world, enemy).expect("alive");
        assert!((snapshot.health - 26.0).abs() < f32::EPSILON);
        assert!(query::projectiles(&world).is_empty());
    }

    #[test]
    fn population_cap_rejects_spawns() {
        let mut world = World::new(WorldConfig {
            population_cap: 3,
            ..WorldConfig::default()
        });
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::StartRun {
                class: PlayerClass::Warden,
                stats: EffectiveStats::default(),
            },
            &mut events,
        );
        for _ in 0..5 {
            apply(
                &mut world,
                Command::SpawnEnemy {
                    config: EnemyConfig::new(Archetype::Swarm, Faction::Vermin, Rank::Normal, 1.0),
                    position: Vec2::new(300.0, 0.0),
                },
                &mut events,
            );
        }
        let rejected = events
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    Event::SpawnRejected {
                        reason: SpawnRejection::PopulationCap,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(rejected, 2);
        assert_eq!(query::live_enemy_count(&world), 3);
    }

    #[test]
    fn spawns_are_rejected_without_active_run() {
        let mut world = World::default();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnEnemy {
                config: EnemyConfig::new(Archetype::Chaser, Faction::Vermin, Rank::Normal, 1.0),
                position: Vec2::ZERO,
            },
            &mut events,
        );
        assert!(matches!(
            events.as_slice(),
            [Event::SpawnRejected {
                reason: SpawnRejection::RunInactive,
                ..
            }]
        ));
    }

    #[test]
    fn pause_and_hit_stop_freeze_simulated_time() {
        let mut world = running_world();
        let mut events = Vec::new();

        apply(&mut world, Command::SetPaused { paused: true }, &mut events);
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );
        assert_eq!(query::survival_time(&world), Duration::ZERO);
        apply(&mut world, Command::SetPaused { paused: false }, &mut events);

        apply(
            &mut world,
            Command::HitStop {
                duration: Duration::from_millis(60),
            },
            &mut events,
        );
        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(50),
            },
            &mut events,
        );
        assert!(events.is_empty());
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(50),
            },
            &mut events,
        );
        assert_eq!(
            events.as_slice(),
            [Event::TimeAdvanced {
                dt: Duration::from_millis(40)
            }]
        );
        assert_eq!(query::survival_time(&world), Duration::from_millis(40));
    }

    #[test]
    fn end_run_releases_everything() {
        let mut world = running_world();
        for index in 0..10 {
            let _ = spawn(&mut world, Archetype::Chaser, Vec2::new(index as f32, 0.0));
        }
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::DropLoot {
                position: Vec2::new(500.0, 0.0),
                value: 3,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::EndRun {
                reason: RunEndReason::Aborted,
            },
            &mut events,
        );
        assert_eq!(query::live_enemy_count(&world), 0);
        assert!(query::loot(&world).is_empty());
        assert!(!query::is_run_active(&world));
        let stats = query::pool_stats(&world);
        assert_eq!(stats.enemies_live, 0);
        assert!(stats.enemies_free >= 10);
    }

    #[test]
    fn player_collects_nearby_loot() {
        let mut world = running_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::DropLoot {
                position: Vec2::new(10.0, 0.0),
                value: 7,
            },
            &mut events,
        );
        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
            },
            &mut events,
        );
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::LootCollected { value: 7, .. })));
        assert_eq!(query::loot_collected(&world), 7);
    }

    #[test]
    fn player_death_is_reported() {
        let mut world = running_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::DamagePlayer {
                amount: 1_000.0,
                origin: Vec2::X,
            },
            &mut events,
        );
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::PlayerDied { .. })));
        assert!(!query::player(&world).alive);
    }
}
