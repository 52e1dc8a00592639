//! Fixed-step orchestration of the world and its systems.

use std::time::Duration;

use glam::Vec2;
use wavebreak_core::{
    Command, Event, HitEvent, PlayerClass, RunEndReason, RunOutcome, Skill, StatsSnapshot,
    StepClock,
};
use wavebreak_system_behavior::{BehaviorContext, Behaviors};
use wavebreak_system_combat::Combat;
use wavebreak_system_pacing::Director;
use wavebreak_system_progression::{Progression, RunProgress};
use wavebreak_system_spawning::{SpawnContext, Spawning};
use wavebreak_system_weapons::Weapons;
use wavebreak_world::{self as world, query, World};

use crate::{
    bus::{Bus, Notification, SubscriptionId},
    clock::FixedStep,
    config::{ConfigError, SessionConfig},
    StatSource,
};

/// A playable session: one world, its systems and the outbound bus.
#[derive(Debug)]
pub struct Session<S> {
    config: SessionConfig,
    stats: S,
    world: World,
    director: Director,
    spawning: Spawning,
    behaviors: Behaviors,
    weapons: Weapons,
    combat: Combat,
    progression: Progression,
    bus: Bus,
    clock: FixedStep,
    class: Option<PlayerClass>,
    paused: bool,
    since_stats: Duration,
    tick_events: Vec<Event>,
    applied: Vec<Event>,
    notices: Vec<Event>,
    commands: Vec<Command>,
    hits: Vec<HitEvent>,
}

impl<S: StatSource> Session<S> {
    /// Validates `config` and builds an idle session.
    pub fn new(config: SessionConfig, stats: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.run.seed;
        Ok(Self {
            world: World::new(config.world.clone()),
            director: Director::new(config.pacing.clone(), stream_seed(seed, "pacing")),
            spawning: Spawning::new(config.spawning.clone(), stream_seed(seed, "spawning")),
            behaviors: Behaviors::new(config.behavior.clone(), stream_seed(seed, "behavior")),
            weapons: Weapons::new(config.weapons.clone()),
            combat: Combat::new(config.combat.clone(), stream_seed(seed, "combat")),
            progression: Progression::new(config.progression.clone()),
            bus: Bus::new(),
            clock: FixedStep::new(config.run.fixed_step(), config.run.max_steps_per_tick),
            class: None,
            paused: false,
            since_stats: Duration::ZERO,
            tick_events: Vec::new(),
            applied: Vec::new(),
            notices: Vec::new(),
            commands: Vec::new(),
            hits: Vec::new(),
            config,
            stats,
        })
    }

    /// Begins a run with `class`, aborting any run still in progress.
    pub fn start_run(&mut self, class: PlayerClass) {
        if self.is_run_active() {
            let _ = self.finish(RunEndReason::Aborted);
        }
        self.reset_systems();
        let stats = self.stats.effective_stats();
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::StartRun { class, stats }, &mut events);
        self.class = Some(class);
        self.paused = false;
        log::info!(
            "run started as {class:?} (seed {:#x}, {}s)",
            self.config.run.seed,
            self.config.run.duration_secs
        );
    }

    /// Advances the simulation by the wall-clock time `elapsed`.
    pub fn tick(&mut self, elapsed: Duration) {
        if !self.is_run_active() || self.paused {
            return;
        }
        let steps = self.clock.accumulate(elapsed);
        for _ in 0..steps {
            if !self.step() {
                break;
            }
        }
    }

    /// Queues a skill for the next step. Returns `false` when it is unavailable.
    pub fn request_skill(&mut self, skill: Skill) -> bool {
        self.is_run_active() && self.weapons.request_skill(skill)
    }

    /// Sets the direction the player moves in; zero stops the player.
    pub fn set_move_intent(&mut self, direction: Vec2) {
        world::apply(
            &mut self.world,
            Command::SetPlayerIntent { direction },
            &mut Vec::new(),
        );
    }

    /// Freezes the simulation clock.
    pub fn pause(&mut self) {
        self.set_paused(true);
    }

    /// Resumes the simulation clock exactly where it stopped.
    pub fn resume(&mut self) {
        self.set_paused(false);
    }

    /// Ends the active run immediately, returning its outcome.
    pub fn abort_run(&mut self) -> Option<RunOutcome> {
        self.is_run_active()
            .then(|| self.finish(RunEndReason::Aborted))
    }

    /// Re-reads effective statistics after the loadout changed.
    pub fn notify_loadout_changed(&mut self) {
        let stats = self.stats.effective_stats();
        world::apply(
            &mut self.world,
            Command::UpdatePlayerStats { stats },
            &mut Vec::new(),
        );
    }

    /// Registers a notification subscriber.
    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&Notification) + 'static,
    {
        self.bus.subscribe(subscriber)
    }

    /// Removes a notification subscriber.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Current UI-facing statistics.
    #[must_use]
    pub fn stats_snapshot(&self) -> StatsSnapshot {
        let player = query::player(&self.world);
        let progress = self.progression.progress();
        StatsSnapshot {
            hp: player.health,
            max_hp: player.max_health,
            level: progress.level,
            xp: progress.xp,
            xp_to_next_level: progress.xp_to_next,
            score: progress.score,
            survival_time: query::survival_time(&self.world),
            enemies_alive: query::live_enemy_count(&self.world),
        }
    }

    /// Progress of the current run.
    #[must_use]
    pub fn progress(&self) -> &RunProgress {
        self.progression.progress()
    }

    /// Read-only access to the authoritative world for queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Reports whether a run is in progress.
    #[must_use]
    pub fn is_run_active(&self) -> bool {
        query::is_run_active(&self.world)
    }

    /// Reports whether the session is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// The stat aggregator backing this session.
    pub fn stat_source_mut(&mut self) -> &mut S {
        &mut self.stats
    }

    fn set_paused(&mut self, paused: bool) {
        if !self.is_run_active() || self.paused == paused {
            return;
        }
        self.paused = paused;
        world::apply(
            &mut self.world,
            Command::SetPaused { paused },
            &mut Vec::new(),
        );
        log::debug!("session {}", if paused { "paused" } else { "resumed" });
    }

    /// Runs one fixed step. Returns `false` once the run has ended.
    fn step(&mut self) -> bool {
        let Self {
            config,
            world,
            director,
            spawning,
            behaviors,
            weapons,
            combat,
            progression,
            clock,
            tick_events,
            applied,
            notices,
            commands,
            hits,
            ..
        } = &mut *self;
        tick_events.clear();
        applied.clear();
        notices.clear();
        commands.clear();

        world::apply(world, Command::Tick { dt: clock.step() }, tick_events);
        if tick_events.is_empty() {
            // Hit-stop swallowed the whole step.
            return true;
        }

        let enemies = query::enemy_view(world);
        let player = query::player(world);

        director.handle(
            tick_events,
            |request| {
                let context = spawn_context(world);
                let Some(command) = spawning.fulfil(request, &context) else {
                    return false;
                };
                let before = applied.len();
                world::apply(world, command, applied);
                applied[before..]
                    .iter()
                    .any(|event| matches!(event, Event::EnemySpawned { .. }))
            },
            notices,
        );

        spawning.handle(tick_events, &spawn_context(world), commands);
        apply_all(world, commands, applied);

        {
            let loot = query::loot(world);
            let context = BehaviorContext {
                player: player.alive.then_some(player.position),
                loot: &loot,
                extraction_points: query::extraction_points(world),
            };
            behaviors.handle(tick_events, &enemies, &context, commands);
        }
        apply_all(world, commands, applied);

        weapons.handle(tick_events, &player, &enemies, commands, hits);
        apply_all(world, commands, applied);

        combat.queue_all(hits);
        let projectiles = query::projectiles(world);
        combat.handle(tick_events, &enemies, &projectiles, &player, commands);
        apply_all(world, commands, applied);

        progression.set_score_multiplier(weapons.is_frenzied());
        let player = query::player(world);
        let mut level_ups = Vec::new();
        progression.handle(tick_events, &player, commands, hits, &mut level_ups);
        progression.handle(applied, &player, commands, hits, &mut level_ups);
        apply_all(world, commands, applied);
        if !level_ups.is_empty() {
            director.handle(&level_ups, |_| false, notices);
            notices.append(&mut level_ups);
        }

        let survival = query::survival_time(world);
        if survival >= config.run.finale_at() && director.force_finale() {
            log::info!("finale at {:.1}s", survival.as_secs_f32());
        }

        self.publish_step();

        let died = self
            .applied
            .iter()
            .any(|event| matches!(event, Event::PlayerDied { .. }));
        if died {
            let _ = self.finish(RunEndReason::Defeated);
            return false;
        }
        if query::survival_time(&self.world) >= self.config.run.duration() {
            let _ = self.finish(RunEndReason::Extracted);
            return false;
        }
        true
    }

    fn publish_step(&mut self) {
        let stepped = StepClock::scan(&self.tick_events).elapsed;

        let mut outbound = Vec::new();
        for event in self.applied.iter().chain(&self.notices) {
            if let Some(notification) = notification_for(event) {
                outbound.push(notification);
            }
        }

        self.since_stats = self.since_stats.saturating_add(stepped);
        let interval = Duration::from_millis(self.config.run.stats_interval_ms);
        if self.since_stats >= interval {
            self.since_stats -= interval;
            outbound.push(Notification::Stats(self.stats_snapshot()));
        }

        for notification in &outbound {
            self.bus.publish(notification);
        }
    }

    fn finish(&mut self, reason: RunEndReason) -> RunOutcome {
        let progress = *self.progression.progress();
        let outcome = RunOutcome {
            class: self.class.unwrap_or(PlayerClass::Gunner),
            reason,
            score: progress.score,
            survival_time: query::survival_time(&self.world),
            level: progress.level,
            kills: progress.kills,
            loot_collected: query::loot_collected(&self.world),
        };
        world::apply(&mut self.world, Command::EndRun { reason }, &mut Vec::new());
        self.reset_systems();
        self.class = None;
        self.paused = false;
        log::info!(
            "run ended ({reason:?}): score {} after {:.1}s, level {}, {} kills",
            outcome.score,
            outcome.survival_time.as_secs_f32(),
            outcome.level,
            outcome.kills
        );
        self.bus.publish(&Notification::RunEnded(outcome));
        outcome
    }

    fn reset_systems(&mut self) {
        self.director.reset();
        self.spawning.reset();
        self.behaviors.reset();
        self.weapons.reset();
        self.combat.reset();
        self.progression.reset();
        self.clock.reset();
        self.since_stats = Duration::ZERO;
        self.hits.clear();
        log::debug!("systems reset");
    }
}

fn spawn_context(world: &World) -> SpawnContext {
    SpawnContext {
        player_position: query::player(world).position,
        survival_time: query::survival_time(world),
        live_enemies: query::live_enemy_count(world),
        population_cap: query::population_cap(world),
    }
}

fn apply_all(world: &mut World, commands: &mut Vec<Command>, events: &mut Vec<Event>) {
    for command in commands.drain(..) {
        world::apply(world, command, events);
    }
}

fn notification_for(event: &Event) -> Option<Notification> {
    match *event {
        Event::EnemyKilled {
            position,
            reward,
            archetype,
            faction,
            rank,
            ..
        } => Some(Notification::EnemyKilled {
            position,
            reward,
            archetype,
            faction,
            rank,
        }),
        Event::DamageApplied {
            position,
            amount,
            is_crit,
            lethal,
            ..
        } => Some(Notification::DamageApplied {
            position,
            amount,
            is_crit,
            lethal,
        }),
        Event::PacingPhaseChanged { phase, message, .. } => {
            Some(Notification::PacingPhaseChanged { phase, message })
        }
        Event::PlayerLeveledUp { level, xp_to_next } => {
            Some(Notification::PlayerLeveledUp { level, xp_to_next })
        }
        _ => None,
    }
}

/// Derives an independent random stream for the system named `label`.
fn stream_seed(seed: u64, label: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    label
        .bytes()
        .fold(FNV_OFFSET ^ seed, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_seeds_differ_per_label() {
        assert_ne!(stream_seed(1, "pacing"), stream_seed(1, "spawning"));
        assert_ne!(stream_seed(1, "pacing"), stream_seed(2, "pacing"));
        assert_eq!(stream_seed(9, "combat"), stream_seed(9, "combat"));
    }
}
