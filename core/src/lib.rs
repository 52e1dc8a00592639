#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Wavebreak encounter simulation.
//!
//! This crate defines the message surface that connects the host adapter, the
//! authoritative world, and pure systems. The host submits [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to. Systems consume event streams, query immutable snapshots, and
//! respond exclusively with new command batches.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Default ceiling on simultaneously live enemies.
pub const DEFAULT_POPULATION_CAP: usize = 300;

/// Radius of the player's collision circle in world units.
pub const PLAYER_RADIUS: f32 = 16.0;

const SHOOTER_WARMUP: Duration = Duration::from_secs(1);
const STATIONARY_WARMUP: Duration = Duration::from_secs(1);
const TELEPORT_WARMUP: Duration = Duration::from_secs(3);

/// Playable character classes; each one determines the primary weapon shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerClass {
    /// Fires straight projectiles at the nearest enemy.
    Gunner,
    /// Fires piercing hit-scan beams.
    Lancer,
    /// Sweeps a melee arc in front of the player.
    Warden,
}

/// Active skills the player can request during a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    /// Area burst centred on the player.
    Nova,
    /// Ring of homing projectiles.
    Volley,
    /// Temporary fire-rate boost with doubled score gain.
    Frenzy,
}

/// Reasons a run can end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunEndReason {
    /// The player survived the full run duration.
    Extracted,
    /// The player's health reached zero.
    Defeated,
    /// The host aborted the run.
    Aborted,
}

/// Phases of the pacing director's tension cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacingPhase {
    /// Steady accrual while pressure builds.
    Buildup,
    /// Accelerated accrual and access to the heaviest purchases.
    Peak,
    /// Near-zero accrual so the player can recover.
    Relax,
}

/// Cosmetic and behavioural grouping that enemies belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// Swarming fodder that dominates the opening minutes.
    Vermin,
    /// Ranged and mobile skirmishers.
    Cultist,
    /// Rare and dangerous elites.
    Abyssal,
}

/// Power tier applied on top of an archetype profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    /// Unmodified archetype profile.
    Normal,
    /// Tougher variant with a larger reward.
    Elite,
    /// Slow, durable variant.
    Heavy,
    /// Run-defining encounter.
    Boss,
}

impl Rank {
    /// Multiplier applied to the archetype's base health.
    #[must_use]
    pub const fn health_multiplier(self) -> f32 {
        match self {
            Self::Normal => 1.0,
            Self::Elite => 3.0,
            Self::Heavy => 8.0,
            Self::Boss => 25.0,
        }
    }

    /// Multiplier applied to the archetype's base reward.
    #[must_use]
    pub const fn reward_multiplier(self) -> u32 {
        match self {
            Self::Normal => 1,
            Self::Elite => 3,
            Self::Heavy => 8,
            Self::Boss => 25,
        }
    }

    /// Multiplier applied to the archetype's collision radius.
    #[must_use]
    pub const fn radius_multiplier(self) -> f32 {
        match self {
            Self::Normal => 1.0,
            Self::Elite => 1.25,
            Self::Heavy => 1.8,
            Self::Boss => 2.6,
        }
    }

    /// Multiplier applied to the archetype's movement speed.
    #[must_use]
    pub const fn speed_multiplier(self) -> f32 {
        match self {
            Self::Normal => 1.0,
            Self::Elite => 1.1,
            Self::Heavy => 0.7,
            Self::Boss => 0.8,
        }
    }
}

/// Behaviour profile tag selected for an enemy at spawn time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// Constant pursuit toward the player.
    Chaser,
    /// Pursuit with a sinusoidal heading wobble.
    Swarm,
    /// Keeps a firing band around the player.
    Shooter,
    /// Telegraphs, then bursts toward the player.
    Dash,
    /// Orbits the player at a fixed radius.
    Strafe,
    /// Runs away from the player.
    Flee,
    /// Holds position and fires when the player is in range.
    Stationary,
    /// Changes heading at random intervals.
    Erratic,
    /// Creeps toward the player and blinks when far away.
    Teleporter,
    /// Hunts loot drops.
    Scavenger,
    /// Heads for the nearest extraction point.
    Extractor,
}

/// Base statistics attached to an archetype before rank and time scaling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArchetypeProfile {
    /// Starting health.
    pub health: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Damage dealt on contact or per shot.
    pub contact_damage: f32,
    /// Distance at which range-triggered actions engage.
    pub attack_range: f32,
    /// Score and experience awarded on death.
    pub reward: u32,
    /// Collision radius in world units.
    pub radius: f32,
}

impl Archetype {
    /// Every archetype in declaration order.
    pub const ALL: [Archetype; 11] = [
        Self::Chaser,
        Self::Swarm,
        Self::Shooter,
        Self::Dash,
        Self::Strafe,
        Self::Flee,
        Self::Stationary,
        Self::Erratic,
        Self::Teleporter,
        Self::Scavenger,
        Self::Extractor,
    ];

    /// Returns the base statistics associated with the archetype.
    #[must_use]
    pub const fn profile(self) -> ArchetypeProfile {
        let (health, speed, contact_damage, attack_range, reward, radius) = match self {
            Self::Chaser => (30.0, 90.0, 10.0, 0.0, 1, 14.0),
            Self::Swarm => (12.0, 130.0, 5.0, 0.0, 1, 10.0),
            Self::Shooter => (25.0, 80.0, 8.0, 320.0, 2, 14.0),
            Self::Dash => (45.0, 100.0, 18.0, 260.0, 3, 16.0),
            Self::Strafe => (28.0, 110.0, 8.0, 220.0, 2, 14.0),
            Self::Flee => (40.0, 120.0, 0.0, 0.0, 10, 12.0),
            Self::Stationary => (60.0, 0.0, 12.0, 360.0, 3, 18.0),
            Self::Erratic => (20.0, 140.0, 6.0, 0.0, 1, 10.0),
            Self::Teleporter => (35.0, 120.0, 12.0, 300.0, 4, 14.0),
            Self::Scavenger => (50.0, 105.0, 6.0, 0.0, 5, 15.0),
            Self::Extractor => (60.0, 95.0, 6.0, 0.0, 6, 15.0),
        };
        ArchetypeProfile {
            health,
            speed,
            contact_damage,
            attack_range,
            reward,
            radius,
        }
    }
}

/// Fully populated configuration used to activate a pooled enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyConfig {
    /// Behaviour tag driving the enemy's state machine.
    pub archetype: Archetype,
    /// Faction the enemy belongs to.
    pub faction: Faction,
    /// Power tier of the enemy.
    pub rank: Rank,
    /// Health the enemy spawns with.
    pub max_health: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Damage dealt on contact or per shot.
    pub contact_damage: f32,
    /// Distance at which range-triggered actions engage.
    pub attack_range: f32,
    /// Score and experience awarded on death.
    pub reward: u32,
    /// Collision radius in world units.
    pub radius: f32,
}

impl EnemyConfig {
    /// Builds a configuration from the archetype profile, rank, and health scale.
    #[must_use]
    pub fn new(archetype: Archetype, faction: Faction, rank: Rank, health_scale: f32) -> Self {
        let profile = archetype.profile();
        Self {
            archetype,
            faction,
            rank,
            max_health: profile.health * rank.health_multiplier() * health_scale.max(0.1),
            speed: profile.speed * rank.speed_multiplier(),
            contact_damage: profile.contact_damage,
            attack_range: profile.attack_range,
            reward: profile.reward * rank.reward_multiplier(),
            radius: profile.radius * rank.radius_multiplier(),
        }
    }
}

/// Sub-states of the dash archetype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DashStage {
    /// Pursuing the player.
    Chase,
    /// Standing still while telegraphing the dash.
    Windup,
    /// Bursting along the locked heading.
    Dash,
    /// Brief stall after the dash.
    Recover,
}

/// Sub-states of the teleporter archetype.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Blink {
    /// Walking slowly toward the player.
    Creep,
    /// Fading out before repositioning.
    FadeOut {
        /// Time left until the reposition happens.
        remaining: Duration,
        /// Point the enemy will appear at.
        destination: Vec2,
    },
    /// Fading back in after repositioning.
    FadeIn {
        /// Time left until fully visible again.
        remaining: Duration,
    },
}

/// Per-archetype AI state carried by each enemy instance.
///
/// Each variant holds only the timers and sub-states its archetype needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Behavior {
    /// See [`Archetype::Chaser`].
    Chaser,
    /// See [`Archetype::Swarm`].
    Swarm {
        /// Phase offset of the wobble, seeded from the spawn position.
        phase: f32,
    },
    /// See [`Archetype::Shooter`].
    Shooter {
        /// Time until the next shot may be fired.
        cooldown: Duration,
    },
    /// See [`Archetype::Dash`].
    Dash {
        /// Current sub-state.
        stage: DashStage,
        /// Time left in the current timed sub-state.
        timer: Duration,
        /// Time until another windup may begin.
        cooldown: Duration,
        /// Heading locked at the end of the windup.
        heading: Vec2,
    },
    /// See [`Archetype::Strafe`].
    Strafe {
        /// Orbit direction around the player.
        clockwise: bool,
    },
    /// See [`Archetype::Flee`].
    Flee,
    /// See [`Archetype::Stationary`].
    Stationary {
        /// Time until the next shot may be fired.
        cooldown: Duration,
    },
    /// See [`Archetype::Erratic`].
    Erratic {
        /// Current heading.
        heading: Vec2,
        /// Time until a new heading is picked.
        timer: Duration,
    },
    /// See [`Archetype::Teleporter`].
    Teleporter {
        /// Time until another blink may begin.
        cooldown: Duration,
        /// Current blink sub-state.
        blink: Blink,
    },
    /// See [`Archetype::Scavenger`].
    Scavenger {
        /// Time until the next target scan.
        scan: Duration,
        /// Loot drop currently pursued.
        target: Option<LootId>,
        /// Wander heading used while no target exists.
        heading: Vec2,
    },
    /// See [`Archetype::Extractor`].
    Extractor {
        /// Time until the next target scan.
        scan: Duration,
        /// Extraction point currently pursued.
        target: Option<Vec2>,
        /// Wander heading used while no target exists.
        heading: Vec2,
    },
}

impl Behavior {
    /// Creates the starting state for an archetype spawned at `position`.
    #[must_use]
    pub fn initial(archetype: Archetype, position: Vec2) -> Self {
        match archetype {
            Archetype::Chaser => Self::Chaser,
            Archetype::Swarm => Self::Swarm {
                phase: position.x * 0.013 + position.y * 0.007,
            },
            Archetype::Shooter => Self::Shooter {
                cooldown: SHOOTER_WARMUP,
            },
            Archetype::Dash => Self::Dash {
                stage: DashStage::Chase,
                timer: Duration::ZERO,
                cooldown: Duration::ZERO,
                heading: Vec2::ZERO,
            },
            Archetype::Strafe => Self::Strafe {
                clockwise: position.x.to_bits() % 2 == 0,
            },
            Archetype::Flee => Self::Flee,
            Archetype::Stationary => Self::Stationary {
                cooldown: STATIONARY_WARMUP,
            },
            Archetype::Erratic => Self::Erratic {
                heading: Vec2::ZERO,
                timer: Duration::ZERO,
            },
            Archetype::Teleporter => Self::Teleporter {
                cooldown: TELEPORT_WARMUP,
                blink: Blink::Creep,
            },
            Archetype::Scavenger => Self::Scavenger {
                scan: Duration::ZERO,
                target: None,
                heading: Vec2::ZERO,
            },
            Archetype::Extractor => Self::Extractor {
                scan: Duration::ZERO,
                target: None,
                heading: Vec2::ZERO,
            },
        }
    }
}

/// Generation-checked identifier of a pooled enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId {
    slot: u32,
    generation: u32,
}

impl EnemyId {
    /// Creates an identifier from a pool slot and its generation.
    #[must_use]
    pub const fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    /// Pool slot backing the enemy.
    #[must_use]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// Activation generation of the slot.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Generation-checked identifier of a pooled projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId {
    slot: u32,
    generation: u32,
}

impl ProjectileId {
    /// Creates an identifier from a pool slot and its generation.
    #[must_use]
    pub const fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    /// Pool slot backing the projectile.
    #[must_use]
    pub const fn slot(&self) -> u32 {
        self.slot
    }

    /// Activation generation of the slot.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Identifier of a loot drop lying in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LootId(u32);

impl LootId {
    /// Creates a new loot identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of an instant hit event, used to guarantee single resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HitId(u64);

impl HitId {
    /// Creates a new hit identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Builds an identifier from a producer stream and a per-stream sequence.
    ///
    /// Producers that allocate from distinct streams never collide.
    #[must_use]
    pub const fn from_parts(stream: u16, sequence: u64) -> Self {
        Self(((stream as u64) << 48) | (sequence & 0xffff_ffff_ffff))
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Actor responsible for a hit or projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Owner {
    /// The player actor.
    Player,
    /// A specific enemy.
    Enemy(EnemyId),
    /// An environmental turret.
    Turret,
}

impl Owner {
    /// Reports whether the owner fights on the player's side.
    #[must_use]
    pub const fn is_friendly(&self) -> bool {
        matches!(self, Self::Player | Self::Turret)
    }
}

/// Angular restriction applied to an area hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcSector {
    /// Unit vector through the middle of the arc.
    pub direction: Vec2,
    /// Half of the arc's opening angle in radians.
    pub half_angle: f32,
}

/// Geometry of an instant hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HitShape {
    /// Hit-scan segment tested against enemy bounding rectangles.
    Line {
        /// Segment start.
        from: Vec2,
        /// Segment end.
        to: Vec2,
    },
    /// Radius burst, optionally narrowed to an arc (cones and melee sweeps).
    Area {
        /// Centre of the burst.
        center: Vec2,
        /// Reach of the burst.
        radius: f32,
        /// Optional angular restriction.
        arc: Option<ArcSector>,
    },
}

/// Instant hit already committed to happen, consumed once by combat.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitEvent {
    /// Identifier used to reject re-delivery.
    pub id: HitId,
    /// Actor responsible for the hit.
    pub owner: Owner,
    /// Damage applied to every enemy the shape touches.
    pub damage: f32,
    /// Point knockback pushes away from.
    pub origin: Vec2,
    /// Geometry of the hit.
    pub shape: HitShape,
    /// Whether the hit may roll a critical strike.
    pub can_crit: bool,
    /// Whether knockback is applied to surviving targets.
    pub knockback: bool,
}

/// Motion model of a live projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProjectileMotion {
    /// Travels along its initial velocity.
    Straight,
    /// Steers toward a target enemy while it is alive.
    Homing {
        /// Enemy being tracked.
        target: EnemyId,
        /// Maximum heading change in radians per second.
        turn_rate: f32,
    },
}

/// Parameters required to launch a pooled projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSpec {
    /// Actor that fired the projectile.
    pub owner: Owner,
    /// Launch position.
    pub origin: Vec2,
    /// Initial velocity in world units per second.
    pub velocity: Vec2,
    /// Damage applied on impact.
    pub damage: f32,
    /// Collision radius.
    pub radius: f32,
    /// Time before the projectile expires without hitting anything.
    pub lifetime: Duration,
    /// Motion model.
    pub motion: ProjectileMotion,
    /// Whether the impact may roll a critical strike.
    pub can_crit: bool,
}

/// Source that produced an [`Command::ApplyDamage`] request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DamageSource {
    /// A live projectile; spent by its first hit.
    Projectile(ProjectileId),
    /// An instant hit event.
    Instant(HitId),
}

/// Effective combat statistics computed by the external stat aggregator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectiveStats {
    /// Base damage per attack.
    pub damage: f32,
    /// Attack reach in world units.
    pub range: f32,
    /// Milliseconds between primary attacks.
    pub fire_rate_ms: u32,
    /// Probability in `0.0..=1.0` of a critical strike.
    pub crit_chance: f32,
    /// Flat defense rating reducing incoming damage.
    pub defense: f32,
    /// Maximum health before level scaling.
    pub hp_max: f32,
    /// Fractional movement speed bonus.
    pub speed_bonus: f32,
}

impl Default for EffectiveStats {
    fn default() -> Self {
        Self {
            damage: 10.0,
            range: 350.0,
            fire_rate_ms: 500,
            crit_chance: 0.05,
            defense: 0.0,
            hp_max: 100.0,
            speed_bonus: 0.0,
        }
    }
}

/// Periodic UI-facing statistics.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Current player health.
    pub hp: f32,
    /// Maximum player health.
    pub max_hp: f32,
    /// Current level.
    pub level: u32,
    /// Experience gathered toward the next level.
    pub xp: u32,
    /// Experience required for the next level.
    pub xp_to_next_level: u32,
    /// Current score.
    pub score: u64,
    /// Time survived in the current run.
    pub survival_time: Duration,
    /// Number of live enemies.
    pub enemies_alive: usize,
}

/// Summary of a finished run handed to the external profile layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Class the run was played with.
    pub class: PlayerClass,
    /// Why the run ended.
    pub reason: RunEndReason,
    /// Final score.
    pub score: u64,
    /// Time survived.
    pub survival_time: Duration,
    /// Level reached.
    pub level: u32,
    /// Enemies killed.
    pub kills: u32,
    /// Total value of loot picked up by the player.
    pub loot_collected: u32,
}

/// Reasons a spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnRejection {
    /// The live population already reached the cap.
    PopulationCap,
    /// The enemy pool refused to hand out another instance.
    PoolExhausted,
    /// No run is active.
    RunInactive,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Starts a new run, clearing any residual state.
    StartRun {
        /// Class selected for the run.
        class: PlayerClass,
        /// Effective stats read from the stat aggregator.
        stats: EffectiveStats,
    },
    /// Ends the active run, releasing every pooled instance.
    EndRun {
        /// Why the run ended.
        reason: RunEndReason,
    },
    /// Freezes or resumes simulation time.
    SetPaused {
        /// Whether the simulation should be paused.
        paused: bool,
    },
    /// Advances the simulation clock by the provided wall-clock delta.
    Tick {
        /// Duration that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests a brief global freeze used as impact feedback.
    HitStop {
        /// Length of the freeze.
        duration: Duration,
    },
    /// Updates the direction the player wants to move in.
    SetPlayerIntent {
        /// Desired direction; normalised by the world.
        direction: Vec2,
    },
    /// Replaces the player's effective stats after a loadout change.
    UpdatePlayerStats {
        /// Freshly aggregated stats.
        stats: EffectiveStats,
    },
    /// Rescales the player for a new level and heals to full.
    RescalePlayer {
        /// Level the player reached.
        level: u32,
        /// Multiplier applied to the aggregated maximum health.
        health_multiplier: f32,
        /// Multiplier applied to outgoing player damage.
        damage_multiplier: f32,
    },
    /// Activates a pooled enemy.
    SpawnEnemy {
        /// Complete configuration overwriting any pooled state.
        config: EnemyConfig,
        /// Spawn position.
        position: Vec2,
    },
    /// Applies a behaviour intent to an enemy.
    DriveEnemy {
        /// Enemy being driven.
        enemy: EnemyId,
        /// Desired velocity.
        velocity: Vec2,
        /// Facing direction.
        facing: Vec2,
        /// Visibility in `0.0..=1.0`.
        opacity: f32,
        /// Updated behaviour state.
        behavior: Behavior,
    },
    /// Announces an upcoming high-impact enemy action.
    Telegraph {
        /// Enemy winding up.
        enemy: EnemyId,
        /// Direction of the telegraphed action.
        direction: Vec2,
        /// Length of the warning window.
        duration: Duration,
    },
    /// Instantly repositions an enemy.
    TeleportEnemy {
        /// Enemy being moved.
        enemy: EnemyId,
        /// Destination.
        position: Vec2,
    },
    /// Removes an enemy that reached an extraction point.
    ExtractEnemy {
        /// Enemy leaving the arena.
        enemy: EnemyId,
    },
    /// Lets an enemy consume a loot drop.
    ClaimLoot {
        /// Enemy consuming the drop.
        enemy: EnemyId,
        /// Drop being consumed.
        loot: LootId,
    },
    /// Launches a pooled projectile.
    FireProjectile {
        /// Launch parameters.
        spec: ProjectileSpec,
    },
    /// Returns a projectile to its pool without a hit.
    ExpireProjectile {
        /// Projectile being retired.
        projectile: ProjectileId,
    },
    /// Applies resolved damage to an enemy.
    ApplyDamage {
        /// Enemy taking damage.
        enemy: EnemyId,
        /// Damage amount.
        amount: f32,
        /// Point the hit came from.
        origin: Vec2,
        /// Impulse applied when the hit is not lethal.
        knockback: Vec2,
        /// Whether the hit was a critical strike.
        is_crit: bool,
        /// Projectile or instant hit that produced the damage.
        source: DamageSource,
    },
    /// Applies resolved damage to the player.
    DamagePlayer {
        /// Raw damage before defense.
        amount: f32,
        /// Point the hit came from.
        origin: Vec2,
    },
    /// Places a loot drop in the arena.
    DropLoot {
        /// Drop position.
        position: Vec2,
        /// Value of the drop.
        value: u32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that simulation time advanced.
    TimeAdvanced {
        /// Simulated time that elapsed.
        dt: Duration,
    },
    /// Confirms a new run started.
    RunStarted {
        /// Class selected for the run.
        class: PlayerClass,
    },
    /// Confirms the run ended and the population was cleared.
    RunEnded {
        /// Why the run ended.
        reason: RunEndReason,
    },
    /// Reports a pause state change.
    PauseChanged {
        /// Whether the simulation is now paused.
        paused: bool,
    },
    /// Reports that a hit-stop began.
    HitStopStarted {
        /// Length of the freeze.
        duration: Duration,
    },
    /// Confirms an enemy entered the population.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Behaviour tag of the enemy.
        archetype: Archetype,
        /// Faction of the enemy.
        faction: Faction,
        /// Power tier of the enemy.
        rank: Rank,
        /// Spawn position.
        position: Vec2,
    },
    /// Reports that a spawn request was refused.
    SpawnRejected {
        /// Archetype that was requested.
        archetype: Archetype,
        /// Why the request failed.
        reason: SpawnRejection,
    },
    /// Announces a telegraphed enemy action.
    AttackTelegraphed {
        /// Enemy winding up.
        enemy: EnemyId,
        /// Enemy position.
        position: Vec2,
        /// Direction of the action.
        direction: Vec2,
        /// Length of the warning window.
        duration: Duration,
    },
    /// Confirms an enemy blinked to a new position.
    EnemyTeleported {
        /// Enemy that moved.
        enemy: EnemyId,
        /// Position before the blink.
        from: Vec2,
        /// Position after the blink.
        to: Vec2,
    },
    /// Confirms an enemy left through an extraction point.
    EnemyExtracted {
        /// Enemy that left; already released.
        enemy: EnemyId,
        /// Position it left from.
        position: Vec2,
    },
    /// Confirms a projectile was launched.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Actor that fired it.
        owner: Owner,
        /// Launch position.
        position: Vec2,
    },
    /// Reports a projectile returned to its pool.
    ProjectileExpired {
        /// Projectile that expired.
        projectile: ProjectileId,
    },
    /// Reports damage applied to an enemy, for floating damage numbers.
    DamageApplied {
        /// Enemy that was hit.
        enemy: EnemyId,
        /// Enemy position at the time of the hit.
        position: Vec2,
        /// Damage amount.
        amount: f32,
        /// Whether the hit was a critical strike.
        is_crit: bool,
        /// Whether the hit killed the enemy.
        lethal: bool,
    },
    /// Reports an enemy death with everything consumers need denormalized.
    EnemyKilled {
        /// Enemy that died; already released.
        enemy: EnemyId,
        /// Position of the death.
        position: Vec2,
        /// Score and experience value.
        reward: u32,
        /// Behaviour tag of the enemy.
        archetype: Archetype,
        /// Faction of the enemy.
        faction: Faction,
        /// Power tier of the enemy.
        rank: Rank,
    },
    /// Reports damage taken by the player.
    PlayerDamaged {
        /// Damage after defense.
        amount: f32,
        /// Remaining health.
        health: f32,
        /// Point the hit came from.
        origin: Vec2,
    },
    /// Reports the player's death.
    PlayerDied {
        /// Position of the death.
        position: Vec2,
    },
    /// Confirms the player was rescaled for a new level.
    PlayerRescaled {
        /// Level applied.
        level: u32,
        /// New maximum health.
        max_health: f32,
    },
    /// Confirms a loot drop was placed.
    LootDropped {
        /// Identifier of the drop.
        loot: LootId,
        /// Drop position.
        position: Vec2,
        /// Value of the drop.
        value: u32,
    },
    /// Reports the player picked up a loot drop.
    LootCollected {
        /// Drop that was collected.
        loot: LootId,
        /// Value of the drop.
        value: u32,
    },
    /// Reports an enemy consumed a loot drop.
    LootClaimed {
        /// Drop that was consumed.
        loot: LootId,
        /// Enemy that consumed it.
        enemy: EnemyId,
    },
    /// Announces a pacing phase transition.
    PacingPhaseChanged {
        /// Phase that became active.
        phase: PacingPhase,
        /// Difficulty scalar after the transition.
        difficulty: f32,
        /// Flavour text for the HUD.
        message: &'static str,
    },
    /// Announces a player level-up.
    PlayerLeveledUp {
        /// Level reached.
        level: u32,
        /// Experience required for the following level.
        xp_to_next: u32,
    },
}

/// Clock-related facts gathered from one batch of world events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepClock {
    /// A new run started within the batch.
    pub run_started: bool,
    /// Total simulated time advanced within the batch.
    pub elapsed: Duration,
}

impl StepClock {
    /// Scans `events` for run starts and simulated time.
    #[must_use]
    pub fn scan(events: &[Event]) -> Self {
        events.iter().fold(Self::default(), |mut clock, event| {
            match event {
                Event::RunStarted { .. } => clock.run_started = true,
                Event::TimeAdvanced { dt } => clock.elapsed = clock.elapsed.saturating_add(*dt),
                _ => {}
            }
            clock
        })
    }
}

/// Immutable representation of a single live enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier of the enemy.
    pub id: EnemyId,
    /// Behaviour tag.
    pub archetype: Archetype,
    /// Faction.
    pub faction: Faction,
    /// Power tier.
    pub rank: Rank,
    /// Current position.
    pub position: Vec2,
    /// Current velocity, excluding knockback.
    pub velocity: Vec2,
    /// Current health.
    pub health: f32,
    /// Health the enemy spawned with.
    pub max_health: f32,
    /// Movement speed.
    pub speed: f32,
    /// Damage dealt on contact or per shot.
    pub contact_damage: f32,
    /// Distance at which range-triggered actions engage.
    pub attack_range: f32,
    /// Collision radius.
    pub radius: f32,
    /// Score and experience value.
    pub reward: u32,
    /// Visibility in `0.0..=1.0`.
    pub opacity: f32,
    /// Current behaviour state.
    pub behavior: Behavior,
}

/// Read-only snapshot describing every live enemy.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of live enemies captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Looks up a snapshot by identifier.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Finds the enemy closest to `point` within `max_distance`.
    #[must_use]
    pub fn nearest(&self, point: Vec2, max_distance: f32) -> Option<&EnemySnapshot> {
        let limit = max_distance * max_distance;
        self.snapshots
            .iter()
            .map(|snapshot| (snapshot, snapshot.position.distance_squared(point)))
            .filter(|(_, distance)| *distance <= limit)
            .min_by(|left, right| left.1.total_cmp(&right.1))
            .map(|(snapshot, _)| snapshot)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a live projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier of the projectile.
    pub id: ProjectileId,
    /// Actor that fired it.
    pub owner: Owner,
    /// Current position.
    pub position: Vec2,
    /// Position at the start of the last tick, for swept tests.
    pub previous_position: Vec2,
    /// Damage applied on impact.
    pub damage: f32,
    /// Collision radius.
    pub radius: f32,
    /// Whether the impact may roll a critical strike.
    pub can_crit: bool,
}

/// Immutable representation of the player actor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Current position.
    pub position: Vec2,
    /// Current velocity.
    pub velocity: Vec2,
    /// Last non-zero movement direction.
    pub facing: Vec2,
    /// Current health.
    pub health: f32,
    /// Maximum health after level scaling.
    pub max_health: f32,
    /// Collision radius.
    pub radius: f32,
    /// Whether the player is alive.
    pub alive: bool,
    /// Whether the invulnerability window is active.
    pub invulnerable: bool,
    /// Level the player was last rescaled for.
    pub level: u32,
    /// Damage multiplier from level scaling.
    pub damage_multiplier: f32,
    /// Effective stats from the stat aggregator.
    pub stats: EffectiveStats,
    /// Class of the active run.
    pub class: Option<PlayerClass>,
}

/// Immutable representation of a loot drop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LootSnapshot {
    /// Identifier of the drop.
    pub id: LootId,
    /// Drop position.
    pub position: Vec2,
    /// Value of the drop.
    pub value: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_scaling_applies_to_config() {
        let normal = EnemyConfig::new(Archetype::Chaser, Faction::Vermin, Rank::Normal, 1.0);
        let boss = EnemyConfig::new(Archetype::Chaser, Faction::Vermin, Rank::Boss, 1.0);
        assert!((normal.max_health - 30.0).abs() < f32::EPSILON);
        assert!((boss.max_health - 750.0).abs() < 0.001);
        assert_eq!(boss.reward, 25);
        assert!(boss.radius > normal.radius);
    }

    #[test]
    fn health_scale_is_floored() {
        let config = EnemyConfig::new(Archetype::Swarm, Faction::Vermin, Rank::Normal, -3.0);
        assert!(config.max_health > 0.0);
    }

    #[test]
    fn initial_behavior_matches_archetype() {
        for archetype in Archetype::ALL {
            let behavior = Behavior::initial(archetype, Vec2::new(10.0, -4.0));
            let matches = match (archetype, behavior) {
                (Archetype::Chaser, Behavior::Chaser)
                | (Archetype::Swarm, Behavior::Swarm { .. })
                | (Archetype::Shooter, Behavior::Shooter { .. })
                | (Archetype::Dash, Behavior::Dash { .. })
                | (Archetype::Strafe, Behavior::Strafe { .. })
                | (Archetype::Flee, Behavior::Flee)
                | (Archetype::Stationary, Behavior::Stationary { .. })
                | (Archetype::Erratic, Behavior::Erratic { .. })
                | (Archetype::Teleporter, Behavior::Teleporter { .. })
                | (Archetype::Scavenger, Behavior::Scavenger { .. })
                | (Archetype::Extractor, Behavior::Extractor { .. }) => true,
                _ => false,
            };
            assert!(matches, "{archetype:?} produced {behavior:?}");
        }
    }

    #[test]
    fn enemy_view_nearest_respects_range() {
        let make = |slot: u32, x: f32| EnemySnapshot {
            id: EnemyId::new(slot, 0),
            archetype: Archetype::Chaser,
            faction: Faction::Vermin,
            rank: Rank::Normal,
            position: Vec2::new(x, 0.0),
            velocity: Vec2::ZERO,
            health: 10.0,
            max_health: 10.0,
            speed: 1.0,
            contact_damage: 1.0,
            attack_range: 0.0,
            radius: 5.0,
            reward: 1,
            opacity: 1.0,
            behavior: Behavior::Chaser,
        };
        let view = EnemyView::from_snapshots(vec![make(2, 50.0), make(1, 20.0)]);
        assert_eq!(view.iter().next().map(|s| s.id), Some(EnemyId::new(1, 0)));
        assert_eq!(
            view.nearest(Vec2::ZERO, 100.0).map(|s| s.id),
            Some(EnemyId::new(1, 0))
        );
        assert!(view.nearest(Vec2::ZERO, 10.0).is_none());
        assert!(view.get(EnemyId::new(2, 0)).is_some());
        assert!(view.get(EnemyId::new(2, 1)).is_none());
    }

    #[test]
    fn hit_id_streams_do_not_collide() {
        assert_ne!(HitId::from_parts(1, 7), HitId::from_parts(2, 7));
        assert_eq!(HitId::from_parts(0, 7), HitId::new(7));
    }

    #[test]
    fn run_outcome_round_trips_through_bincode() {
        let outcome = RunOutcome {
            class: PlayerClass::Lancer,
            reason: RunEndReason::Extracted,
            score: 1_234,
            survival_time: Duration::from_secs(600),
            level: 7,
            kills: 311,
            loot_collected: 42,
        };
        let bytes = bincode::serialize(&outcome).expect("serialize");
        let restored: RunOutcome = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, outcome);
    }

    #[test]
    fn step_clock_sums_time_and_flags_run_start() {
        let idle = StepClock::scan(&[Event::PauseChanged { paused: true }]);
        assert_eq!(idle, StepClock::default());

        let clock = StepClock::scan(&[
            Event::RunStarted {
                class: PlayerClass::Warden,
            },
            Event::TimeAdvanced {
                dt: Duration::from_millis(10),
            },
            Event::TimeAdvanced {
                dt: Duration::from_millis(6),
            },
        ]);
        assert!(clock.run_started);
        assert_eq!(clock.elapsed, Duration::from_millis(16));
    }
}
