#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Run progression: score, experience, levels and loot drops.
//!
//! [`RunProgress`] is only ever mutated here. The tracker itself is reactive:
//! [`Progression::handle`] accumulates experience from kill payloads and is the
//! only caller of [`Progression::level_up`] once a threshold is crossed.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use wavebreak_core::{Command, Event, HitEvent, HitId, HitShape, Owner, PlayerSnapshot};

const HIT_STREAM: u16 = 2;

/// Tuning knobs for levelling, scoring and loot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionTuning {
    /// Experience required to reach level two.
    pub initial_xp_to_next: u32,
    /// Growth factor of the threshold per level.
    pub xp_growth: f32,
    /// Health multiplier gained per level above one.
    pub health_per_level: f32,
    /// Damage multiplier gained per level above one.
    pub damage_per_level: f32,
    /// Reach of the level-up shockwave.
    pub shockwave_radius: f32,
    /// Damage of the level-up shockwave.
    pub shockwave_damage: f32,
    /// Score awarded per point of kill reward.
    pub score_per_reward: u64,
    /// Kills worth at least this much always drop loot.
    pub loot_reward_threshold: u32,
    /// Every n-th kill drops loot regardless of reward.
    pub loot_every_nth_kill: u32,
    /// Factor applied to score while the multiplier flag is set.
    pub score_multiplier: u64,
}

impl Default for ProgressionTuning {
    fn default() -> Self {
        Self {
            initial_xp_to_next: 10,
            xp_growth: 1.5,
            health_per_level: 0.1,
            damage_per_level: 0.05,
            shockwave_radius: 250.0,
            shockwave_damage: 5.0,
            score_per_reward: 10,
            loot_reward_threshold: 3,
            loot_every_nth_kill: 10,
            score_multiplier: 2,
        }
    }
}

/// Progress of the active run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProgress {
    /// Current level, starting at one.
    pub level: u32,
    /// Experience gathered toward the next level.
    pub xp: u32,
    /// Experience required for the next level.
    pub xp_to_next: u32,
    /// Accumulated score.
    pub score: u64,
    /// Simulated time survived.
    pub survival_time: Duration,
    /// Enemies killed.
    pub kills: u32,
    /// Whether score gains are currently multiplied.
    pub score_multiplier: bool,
}

impl RunProgress {
    fn new(xp_to_next: u32) -> Self {
        Self {
            level: 1,
            xp: 0,
            xp_to_next: xp_to_next.max(1),
            score: 0,
            survival_time: Duration::ZERO,
            kills: 0,
            score_multiplier: false,
        }
    }
}

/// Side effects produced by a level-up.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelUp {
    /// Level reached.
    pub level: u32,
    /// Threshold for the following level.
    pub xp_to_next: u32,
    /// Heal-to-full and rescale command for the player.
    pub rescale: Command,
    /// Shockwave to hand to the combat pipeline.
    pub shockwave: HitEvent,
}

/// Reactive progression tracker.
#[derive(Debug)]
pub struct Progression {
    tuning: ProgressionTuning,
    progress: RunProgress,
    next_hit: u64,
}

impl Progression {
    /// Creates a tracker for a fresh run.
    #[must_use]
    pub fn new(tuning: ProgressionTuning) -> Self {
        let progress = RunProgress::new(tuning.initial_xp_to_next);
        Self {
            tuning,
            progress,
            next_hit: 0,
        }
    }

    /// Current run progress.
    #[must_use]
    pub fn progress(&self) -> &RunProgress {
        &self.progress
    }

    /// Restores level one and clears score, experience and counters.
    pub fn reset(&mut self) {
        self.progress = RunProgress::new(self.tuning.initial_xp_to_next);
    }

    /// Toggles the score multiplier flag.
    pub fn set_score_multiplier(&mut self, active: bool) {
        self.progress.score_multiplier = active;
    }

    /// Adds score, doubled while the multiplier flag is set. Returns the gain.
    pub fn add_score(&mut self, amount: u64) -> u64 {
        let gain = if self.progress.score_multiplier {
            amount.saturating_mul(self.tuning.score_multiplier)
        } else {
            amount
        };
        self.progress.score = self.progress.score.saturating_add(gain);
        gain
    }

    /// Advances to the next level, centring the shockwave on `position`.
    pub fn level_up(&mut self, position: Vec2) -> LevelUp {
        let progress = &mut self.progress;
        progress.level = progress.level.saturating_add(1);
        progress.xp = 0;
        let grown = (progress.xp_to_next as f32 * self.tuning.xp_growth).floor();
        progress.xp_to_next = (grown as u32).max(progress.xp_to_next.saturating_add(1));

        let steps = (progress.level - 1) as f32;
        let rescale = Command::RescalePlayer {
            level: progress.level,
            health_multiplier: 1.0 + self.tuning.health_per_level * steps,
            damage_multiplier: 1.0 + self.tuning.damage_per_level * steps,
        };

        self.next_hit = self.next_hit.wrapping_add(1);
        let shockwave = HitEvent {
            id: HitId::from_parts(HIT_STREAM, self.next_hit),
            owner: Owner::Player,
            damage: self.tuning.shockwave_damage,
            origin: position,
            shape: HitShape::Area {
                center: position,
                radius: self.tuning.shockwave_radius,
                arc: None,
            },
            can_crit: false,
            knockback: true,
        };

        log::debug!(
            "level up to {} (next at {} xp)",
            self.progress.level,
            self.progress.xp_to_next
        );
        LevelUp {
            level: self.progress.level,
            xp_to_next: self.progress.xp_to_next,
            rescale,
            shockwave,
        }
    }

    /// Folds world events into the run progress.
    ///
    /// Kill rewards feed score and experience; crossing the threshold pushes
    /// the rescale command to `out`, the shockwave to `hits` and a
    /// [`Event::PlayerLeveledUp`] notice to `notices`. Qualifying kills also
    /// drop loot at the kill position.
    pub fn handle(
        &mut self,
        events: &[Event],
        player: &PlayerSnapshot,
        out: &mut Vec<Command>,
        hits: &mut Vec<HitEvent>,
        notices: &mut Vec<Event>,
    ) {
        for event in events {
            match *event {
                Event::RunStarted { .. } => self.reset(),
                Event::TimeAdvanced { dt } => {
                    self.progress.survival_time = self.progress.survival_time.saturating_add(dt);
                }
                Event::EnemyKilled {
                    position, reward, ..
                } => {
                    self.progress.kills = self.progress.kills.saturating_add(1);
                    let _ = self.add_score(u64::from(reward) * self.tuning.score_per_reward);
                    if self.drops_loot(reward) {
                        out.push(Command::DropLoot {
                            position,
                            value: reward,
                        });
                    }

                    self.progress.xp = self.progress.xp.saturating_add(reward);
                    if self.progress.xp >= self.progress.xp_to_next && player.alive {
                        let level_up = self.level_up(player.position);
                        out.push(level_up.rescale);
                        hits.push(level_up.shockwave);
                        notices.push(Event::PlayerLeveledUp {
                            level: level_up.level,
                            xp_to_next: level_up.xp_to_next,
                        });
                    }
                }
                Event::LootCollected { value, .. } => {
                    let _ = self.add_score(u64::from(value));
                }
                _ => {}
            }
        }
    }

    fn drops_loot(&self, reward: u32) -> bool {
        let every = self.tuning.loot_every_nth_kill;
        reward >= self.tuning.loot_reward_threshold
            || (every > 0 && self.progress.kills % every == 0)
    }
}

impl Default for Progression {
    fn default() -> Self {
        Self::new(ProgressionTuning::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_grow_by_half() {
        let mut progression = Progression::default();
        let mut thresholds = vec![progression.progress().xp_to_next];
        for _ in 0..3 {
            thresholds.push(progression.level_up(Vec2::ZERO).xp_to_next);
        }
        assert_eq!(thresholds, vec![10, 15, 22, 33]);
        assert_eq!(progression.progress().level, 4);
        assert_eq!(progression.progress().xp, 0);
    }

    #[test]
    fn level_up_rescales_and_emits_shockwave() {
        let mut progression = Progression::default();
        let _ = progression.level_up(Vec2::ZERO);
        let level_up = progression.level_up(Vec2::new(5.0, 5.0));

        match level_up.rescale {
            Command::RescalePlayer {
                level,
                health_multiplier,
                damage_multiplier,
            } => {
                assert_eq!(level, 3);
                assert!((health_multiplier - 1.2).abs() < 1e-6);
                assert!((damage_multiplier - 1.1).abs() < 1e-6);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(matches!(
            level_up.shockwave.shape,
            HitShape::Area { center, radius, arc: None }
                if center == Vec2::new(5.0, 5.0) && (radius - 250.0).abs() < f32::EPSILON
        ));
        assert!(!level_up.shockwave.can_crit);
    }

    #[test]
    fn score_multiplier_doubles_gains() {
        let mut progression = Progression::default();
        assert_eq!(progression.add_score(10), 10);
        progression.set_score_multiplier(true);
        assert_eq!(progression.add_score(10), 20);
        assert_eq!(progression.progress().score, 30);
    }

    #[test]
    fn reset_restores_a_fresh_run() {
        let mut progression = Progression::default();
        let _ = progression.level_up(Vec2::ZERO);
        let _ = progression.add_score(99);
        progression.set_score_multiplier(true);
        progression.reset();
        assert_eq!(
            *progression.progress(),
            RunProgress::new(ProgressionTuning::default().initial_xp_to_next)
        );
    }
}
