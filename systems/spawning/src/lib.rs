#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Population spawner responsible for emitting enemy spawn commands.
//!
//! Two independent pressures feed the population: purchases made by the
//! pacing director, fulfilled through [`Spawning::fulfil`], and an ambient
//! timer whose interval shrinks as the run goes on. Every attempt is checked
//! against the population cap before a command is produced.

use std::{f32::consts::TAU, time::Duration};

use glam::Vec2;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use wavebreak_core::{Archetype, Command, EnemyConfig, Event, Faction, Rank, StepClock};
use wavebreak_system_pacing::{SpawnRequest, SpawnTier};

const VERMIN_ROSTER: [Archetype; 5] = [
    Archetype::Chaser,
    Archetype::Swarm,
    Archetype::Swarm,
    Archetype::Erratic,
    Archetype::Scavenger,
];
const CULTIST_ROSTER: [Archetype; 5] = [
    Archetype::Shooter,
    Archetype::Strafe,
    Archetype::Dash,
    Archetype::Stationary,
    Archetype::Extractor,
];
const ABYSSAL_ROSTER: [Archetype; 3] = [Archetype::Teleporter, Archetype::Dash, Archetype::Chaser];

const SKIRMISHER_ROSTER: [Archetype; 5] = [
    Archetype::Shooter,
    Archetype::Strafe,
    Archetype::Dash,
    Archetype::Stationary,
    Archetype::Scavenger,
];
const ELITE_ROSTER: [Archetype; 5] = [
    Archetype::Chaser,
    Archetype::Dash,
    Archetype::Shooter,
    Archetype::Teleporter,
    Archetype::Extractor,
];
const HEAVY_ROSTER: [Archetype; 3] = [Archetype::Chaser, Archetype::Stationary, Archetype::Dash];
const BOSS_ROSTER: [Archetype; 3] = [Archetype::Dash, Archetype::Teleporter, Archetype::Shooter];

/// Point on the survival clock at which the ambient interval changes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntervalStep {
    /// Survival time in seconds from which the step applies.
    pub after_secs: u64,
    /// Milliseconds between ambient spawns.
    pub interval_ms: u64,
}

/// Probability mass of each faction once every faction is unlocked.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactionWeights {
    /// Weight of [`Faction::Vermin`].
    pub vermin: f32,
    /// Weight of [`Faction::Cultist`].
    pub cultist: f32,
    /// Weight of [`Faction::Abyssal`].
    pub abyssal: f32,
}

impl Default for FactionWeights {
    fn default() -> Self {
        Self {
            vermin: 0.55,
            cultist: 0.35,
            abyssal: 0.10,
        }
    }
}

/// Tuning knobs of the population spawner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Distance from the player at which enemies appear.
    pub spawn_radius: f32,
    /// Fractional health gained per minute of survival.
    pub health_growth_per_minute: f32,
    /// Ambient interval schedule, sorted by `after_secs`.
    pub schedule: Vec<IntervalStep>,
    /// Survival time in seconds before cultists may appear.
    pub cultist_after_secs: u64,
    /// Chance of a cultist while only vermin and cultists are unlocked.
    pub cultist_early_chance: f32,
    /// Survival time in seconds before every faction is unlocked.
    pub abyssal_after_secs: u64,
    /// Late-run faction weights.
    pub late_weights: FactionWeights,
    /// Chance that an ambient spawn is replaced by a fleeing courier.
    pub courier_chance: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            spawn_radius: 600.0,
            health_growth_per_minute: 0.15,
            schedule: vec![
                IntervalStep {
                    after_secs: 0,
                    interval_ms: 1_000,
                },
                IntervalStep {
                    after_secs: 60,
                    interval_ms: 800,
                },
                IntervalStep {
                    after_secs: 120,
                    interval_ms: 500,
                },
                IntervalStep {
                    after_secs: 300,
                    interval_ms: 200,
                },
            ],
            cultist_after_secs: 60,
            cultist_early_chance: 0.2,
            abyssal_after_secs: 180,
            late_weights: FactionWeights::default(),
            courier_chance: 0.02,
        }
    }
}

/// Read-only inputs describing the world at the time of a spawn attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnContext {
    /// Player position the spawn ring is centred on.
    pub player_position: Vec2,
    /// Time survived in the current run.
    pub survival_time: Duration,
    /// Enemies currently alive.
    pub live_enemies: usize,
    /// Ceiling on simultaneously live enemies.
    pub population_cap: usize,
}

impl SpawnContext {
    fn has_room(&self, pending: usize) -> bool {
        self.live_enemies.saturating_add(pending) < self.population_cap
    }
}

/// Pure system that turns purchases and elapsed time into spawn commands.
#[derive(Debug)]
pub struct Spawning {
    tuning: SpawnTuning,
    accumulator: Duration,
    seed: u64,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a spawner using the provided tuning and random seed.
    #[must_use]
    pub fn new(mut tuning: SpawnTuning, seed: u64) -> Self {
        tuning.schedule.sort_by_key(|step| step.after_secs);
        Self {
            tuning,
            accumulator: Duration::ZERO,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Clears accumulated time so a new run starts from a clean timer.
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }

    /// Ambient spawn interval in effect at the provided survival time.
    #[must_use]
    pub fn interval_at(&self, survival_time: Duration) -> Duration {
        let seconds = survival_time.as_secs();
        self.tuning
            .schedule
            .iter()
            .take_while(|step| step.after_secs <= seconds)
            .last()
            .map_or(Duration::ZERO, |step| Duration::from_millis(step.interval_ms))
    }

    /// Fulfils a director purchase, returning `None` when the cap is reached.
    pub fn fulfil(&mut self, request: SpawnRequest, context: &SpawnContext) -> Option<Command> {
        if !context.has_room(0) {
            log::debug!(
                "population cap {} reached, refusing {:?}",
                context.population_cap,
                request.tier
            );
            return None;
        }
        let (archetype, faction, rank) = self.purchase_profile(request.tier);
        Some(self.spawn_command(archetype, faction, rank, context))
    }

    /// Consumes time events and emits ambient spawn commands.
    pub fn handle(&mut self, events: &[Event], context: &SpawnContext, out: &mut Vec<Command>) {
        let clock = StepClock::scan(events);
        if clock.run_started {
            self.reset();
        }
        let accumulated = clock.elapsed;
        if accumulated.is_zero() {
            return;
        }

        let interval = self.interval_at(context.survival_time);
        if interval.is_zero() {
            return;
        }
        self.accumulator = self.accumulator.saturating_add(accumulated);

        let mut pending = 0;
        while self.accumulator >= interval {
            self.accumulator -= interval;
            if !context.has_room(pending) {
                continue;
            }
            let (archetype, faction, rank) = self.ambient_profile(context.survival_time);
            out.push(self.spawn_command(archetype, faction, rank, context));
            pending += 1;
        }
    }

    fn spawn_command(
        &mut self,
        archetype: Archetype,
        faction: Faction,
        rank: Rank,
        context: &SpawnContext,
    ) -> Command {
        let minutes = context.survival_time.as_secs_f32() / 60.0;
        let health_scale = 1.0 + self.tuning.health_growth_per_minute * minutes;
        let angle = self.rng.gen_range(0.0..TAU);
        Command::SpawnEnemy {
            config: EnemyConfig::new(archetype, faction, rank, health_scale),
            position: context.player_position + Vec2::from_angle(angle) * self.tuning.spawn_radius,
        }
    }

    fn purchase_profile(&mut self, tier: SpawnTier) -> (Archetype, Faction, Rank) {
        let (roster, rank): (&[Archetype], Rank) = match tier {
            SpawnTier::Fodder => (&VERMIN_ROSTER[..4], Rank::Normal),
            SpawnTier::Skirmisher => (&SKIRMISHER_ROSTER, Rank::Normal),
            SpawnTier::Elite => (&ELITE_ROSTER, Rank::Elite),
            SpawnTier::Heavy => (&HEAVY_ROSTER, Rank::Heavy),
            SpawnTier::Boss => (&BOSS_ROSTER, Rank::Boss),
        };
        let archetype = self.pick(roster);
        let faction = match (tier, archetype) {
            (SpawnTier::Fodder, _) => Faction::Vermin,
            (_, Archetype::Teleporter) | (SpawnTier::Heavy | SpawnTier::Boss, _) => {
                Faction::Abyssal
            }
            _ => Faction::Cultist,
        };
        (archetype, faction, rank)
    }

    fn ambient_profile(&mut self, survival_time: Duration) -> (Archetype, Faction, Rank) {
        let faction = self.ambient_faction(survival_time);
        if self.rng.gen::<f32>() < self.tuning.courier_chance {
            return (Archetype::Flee, faction, Rank::Elite);
        }
        let archetype = match faction {
            Faction::Vermin => self.pick(&VERMIN_ROSTER),
            Faction::Cultist => self.pick(&CULTIST_ROSTER),
            Faction::Abyssal => self.pick(&ABYSSAL_ROSTER),
        };
        (archetype, faction, Rank::Normal)
    }

    fn ambient_faction(&mut self, survival_time: Duration) -> Faction {
        let seconds = survival_time.as_secs();
        let roll = self.rng.gen::<f32>();
        if seconds < self.tuning.cultist_after_secs {
            return Faction::Vermin;
        }
        if seconds < self.tuning.abyssal_after_secs {
            return if roll < self.tuning.cultist_early_chance {
                Faction::Cultist
            } else {
                Faction::Vermin
            };
        }

        let weights = self.tuning.late_weights;
        let total = weights.vermin + weights.cultist + weights.abyssal;
        if total <= 0.0 {
            return Faction::Vermin;
        }
        let scaled = roll * total;
        if scaled < weights.vermin {
            Faction::Vermin
        } else if scaled < weights.vermin + weights.cultist {
            Faction::Cultist
        } else {
            Faction::Abyssal
        }
    }

    fn pick(&mut self, roster: &[Archetype]) -> Archetype {
        roster
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Archetype::Chaser)
    }
}

impl Default for Spawning {
    fn default() -> Self {
        Self::new(SpawnTuning::default(), 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavebreak_core::PacingPhase;

    fn context(survival_secs: u64, live_enemies: usize) -> SpawnContext {
        SpawnContext {
            player_position: Vec2::new(100.0, -50.0),
            survival_time: Duration::from_secs(survival_secs),
            live_enemies,
            population_cap: 300,
        }
    }

    #[test]
    fn interval_shrinks_at_thresholds() {
        let spawning = Spawning::default();
        assert_eq!(spawning.interval_at(Duration::ZERO), Duration::from_millis(1_000));
        assert_eq!(
            spawning.interval_at(Duration::from_secs(59)),
            Duration::from_millis(1_000)
        );
        assert_eq!(
            spawning.interval_at(Duration::from_secs(60)),
            Duration::from_millis(800)
        );
        assert_eq!(
            spawning.interval_at(Duration::from_secs(150)),
            Duration::from_millis(500)
        );
        assert_eq!(
            spawning.interval_at(Duration::from_secs(900)),
            Duration::from_millis(200)
        );
    }

    #[test]
    fn early_spawns_are_vermin_only() {
        let mut spawning = Spawning::new(
            SpawnTuning {
                courier_chance: 0.0,
                ..SpawnTuning::default()
            },
            11,
        );
        for _ in 0..200 {
            let (_, faction, _) = spawning.ambient_profile(Duration::from_secs(30));
            assert_eq!(faction, Faction::Vermin);
        }
    }

    #[test]
    fn cultists_join_between_one_and_three_minutes() {
        let mut spawning = Spawning::new(SpawnTuning::default(), 29);
        let tally = |spawning: &mut Spawning, secs: u64| {
            let mut counts = [0usize; 3];
            for _ in 0..4_000 {
                let index = match spawning.ambient_faction(Duration::from_secs(secs)) {
                    Faction::Vermin => 0,
                    Faction::Cultist => 1,
                    Faction::Abyssal => 2,
                };
                counts[index] += 1;
            }
            counts
        };

        assert_eq!(tally(&mut spawning, 59), [4_000, 0, 0]);
        for secs in [60, 120, 179] {
            let [vermin, cultist, abyssal] = tally(&mut spawning, secs);
            assert_eq!(abyssal, 0, "no abyssal spawns at {secs}s");
            assert_eq!(vermin + cultist, 4_000);
            let share = cultist as f32 / 4_000.0;
            assert!((0.16..0.24).contains(&share), "cultist share {share} at {secs}s");
        }
        let [_, _, abyssal] = tally(&mut spawning, 180);
        assert!(abyssal > 0, "abyssal spawns open at three minutes");
    }

    #[test]
    fn late_spawns_favour_vermin_over_abyssal() {
        let mut spawning = Spawning::new(SpawnTuning::default(), 5);
        let mut counts = [0usize; 3];
        for _ in 0..5_000 {
            let index = match spawning.ambient_faction(Duration::from_secs(600)) {
                Faction::Vermin => 0,
                Faction::Cultist => 1,
                Faction::Abyssal => 2,
            };
            counts[index] += 1;
        }
        assert!(counts[0] > counts[1]);
        assert!(counts[1] > counts[2]);
        assert!(counts[2] > 0);
    }

    #[test]
    fn spawns_land_on_the_ring() {
        let mut spawning = Spawning::default();
        let ctx = context(0, 0);
        let request = SpawnRequest {
            tier: SpawnTier::Elite,
            phase: PacingPhase::Peak,
            difficulty: 1.0,
        };
        let Some(Command::SpawnEnemy { config, position }) = spawning.fulfil(request, &ctx) else {
            panic!("expected a spawn command");
        };
        assert_eq!(config.rank, Rank::Elite);
        assert!((position.distance(ctx.player_position) - 600.0).abs() < 0.01);
    }

    #[test]
    fn fulfil_refuses_at_cap() {
        let mut spawning = Spawning::default();
        let request = SpawnRequest {
            tier: SpawnTier::Fodder,
            phase: PacingPhase::Buildup,
            difficulty: 1.0,
        };
        assert!(spawning.fulfil(request, &context(0, 300)).is_none());
        assert!(spawning.fulfil(request, &context(0, 299)).is_some());
    }

    #[test]
    fn health_scales_with_survival_minutes() {
        let mut spawning = Spawning::default();
        let request = SpawnRequest {
            tier: SpawnTier::Fodder,
            phase: PacingPhase::Buildup,
            difficulty: 1.0,
        };
        let Some(Command::SpawnEnemy { config, .. }) = spawning.fulfil(request, &context(600, 0))
        else {
            panic!("expected a spawn command");
        };
        let base = EnemyConfig::new(config.archetype, config.faction, config.rank, 1.0);
        assert!((config.max_health - base.max_health * 2.5).abs() < 0.01);
    }
}
