#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pacing director that converts elapsed time into spawn purchases.
//!
//! The director cycles through a Buildup, Peak and Relax tension curve. Each
//! phase accrues spawn credits at its own rate, scaled by a difficulty scalar
//! that grows every time the cycle wraps back to Buildup. On a fixed cadence
//! the accrued credits are spent on weighted purchases that are handed to a
//! spawn callback; a rejected purchase ends the spending attempt without
//! costing anything.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use wavebreak_core::{Event, PacingPhase};

/// Upper bound on purchases made during a single spend tick.
const MAX_PURCHASES_PER_SPEND: usize = 256;

/// Aggregated tuning knobs controlling the director's tension curve and economy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingTuning {
    /// Length of the Buildup phase in seconds.
    pub buildup_secs: f32,
    /// Length of the Peak phase in seconds.
    pub peak_secs: f32,
    /// Length of the Relax phase in seconds.
    pub relax_secs: f32,
    /// Difficulty added every time the cycle re-enters Buildup.
    pub difficulty_step: f32,
    /// Difficulty added whenever the player levels up.
    pub level_up_nudge: f32,
    /// Credits accrued per second at difficulty 1 before the phase multiplier.
    pub base_rate: f32,
    /// Accrual multiplier during Buildup.
    pub buildup_multiplier: f32,
    /// Accrual multiplier during Peak.
    pub peak_multiplier: f32,
    /// Accrual multiplier during Relax.
    pub relax_multiplier: f32,
    /// Milliseconds between spend attempts.
    pub spend_interval_ms: u64,
    /// Accrual never pushes credits above this value.
    pub credit_ceiling: f32,
    /// Credits deposited once by the finale, ignoring the ceiling.
    pub finale_budget: f32,
    /// Credit reserve that unlocks heavy purchases outside of Peak.
    pub heavy_reserve: f32,
    /// Preference bands applied when several tiers are affordable.
    pub bands: PurchaseBands,
}

impl Default for PacingTuning {
    fn default() -> Self {
        Self {
            buildup_secs: 20.0,
            peak_secs: 10.0,
            relax_secs: 5.0,
            difficulty_step: 0.2,
            level_up_nudge: 0.05,
            base_rate: 1.0,
            buildup_multiplier: 1.0,
            peak_multiplier: 3.0,
            relax_multiplier: 0.1,
            spend_interval_ms: 500,
            credit_ceiling: 100.0,
            finale_budget: 500.0,
            heavy_reserve: 60.0,
            bands: PurchaseBands::default(),
        }
    }
}

/// Probability mass reserved for each tier while walking eligible tiers from
/// the most expensive downward. The cheapest eligible tier absorbs whatever
/// mass remains.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurchaseBands {
    /// Band of [`SpawnTier::Boss`].
    pub boss: f32,
    /// Band of [`SpawnTier::Heavy`].
    pub heavy: f32,
    /// Band of [`SpawnTier::Elite`].
    pub elite: f32,
    /// Band of [`SpawnTier::Skirmisher`].
    pub skirmisher: f32,
}

impl Default for PurchaseBands {
    fn default() -> Self {
        Self {
            boss: 0.10,
            heavy: 0.20,
            elite: 0.30,
            skirmisher: 0.40,
        }
    }
}

impl PurchaseBands {
    fn band(&self, tier: SpawnTier) -> f32 {
        match tier {
            SpawnTier::Fodder => 0.0,
            SpawnTier::Skirmisher => self.skirmisher,
            SpawnTier::Elite => self.elite,
            SpawnTier::Heavy => self.heavy,
            SpawnTier::Boss => self.boss,
        }
    }
}

/// Purchasable spawn tiers ordered from cheapest to most expensive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpawnTier {
    /// Single weak enemy.
    Fodder,
    /// Ranged or mobile enemy.
    Skirmisher,
    /// Elite-ranked enemy.
    Elite,
    /// Heavy-ranked enemy; gated to Peak or a large reserve.
    Heavy,
    /// Boss-ranked enemy; gated to Peak or the finale.
    Boss,
}

impl SpawnTier {
    /// Every tier from cheapest to most expensive.
    pub const ALL: [SpawnTier; 5] = [
        Self::Fodder,
        Self::Skirmisher,
        Self::Elite,
        Self::Heavy,
        Self::Boss,
    ];

    /// Credits debited when a purchase of this tier succeeds.
    #[must_use]
    pub const fn cost(self) -> f32 {
        match self {
            Self::Fodder => 1.0,
            Self::Skirmisher => 3.0,
            Self::Elite => 8.0,
            Self::Heavy => 20.0,
            Self::Boss => 40.0,
        }
    }
}

/// Purchase handed to the spawn callback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnRequest {
    /// Tier that was bought.
    pub tier: SpawnTier,
    /// Phase active at the time of purchase.
    pub phase: PacingPhase,
    /// Difficulty scalar at the time of purchase.
    pub difficulty: f32,
}

/// Observable state of the director.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PacingState {
    /// Active phase.
    pub phase: PacingPhase,
    /// Time spent in the active phase.
    pub phase_elapsed: Duration,
    /// Spendable credits; never negative.
    pub credits: f32,
    /// Global difficulty scalar; never decreases.
    pub difficulty: f32,
    /// Time accumulated toward the next spend attempt.
    pub spend_elapsed: Duration,
    /// Whether the finale budget has been deposited.
    pub finale: bool,
}

impl Default for PacingState {
    fn default() -> Self {
        Self {
            phase: PacingPhase::Buildup,
            phase_elapsed: Duration::ZERO,
            credits: 0.0,
            difficulty: 1.0,
            spend_elapsed: Duration::ZERO,
            finale: false,
        }
    }
}

/// Phase- and budget-driven spawn controller.
#[derive(Debug)]
pub struct Director {
    tuning: PacingTuning,
    state: PacingState,
    seed: u64,
    rng: ChaCha8Rng,
}

impl Director {
    /// Creates a director using the provided tuning and random seed.
    #[must_use]
    pub fn new(tuning: PacingTuning, seed: u64) -> Self {
        Self {
            tuning,
            state: PacingState::default(),
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Returns the current director state.
    #[must_use]
    pub fn state(&self) -> &PacingState {
        &self.state
    }

    /// Returns the tuning surface in use.
    #[must_use]
    pub fn tuning(&self) -> &PacingTuning {
        &self.tuning
    }

    /// Restores the initial state so a new run starts from Buildup at difficulty 1.
    pub fn reset(&mut self) {
        self.state = PacingState::default();
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }

    /// Overrides the credit balance, clamped at zero.
    pub fn set_credits(&mut self, credits: f32) {
        self.state.credits = credits.max(0.0);
    }

    /// Forces the director into the given phase without emitting an announcement.
    pub fn set_phase(&mut self, phase: PacingPhase) {
        self.state.phase = phase;
        self.state.phase_elapsed = Duration::ZERO;
    }

    /// Deposits the finale budget. Returns `false` when the finale already happened.
    pub fn force_finale(&mut self) -> bool {
        if self.state.finale {
            return false;
        }
        self.state.finale = true;
        self.state.credits += self.tuning.finale_budget;
        log::debug!(
            "finale forced: {:.1} credits at difficulty {:.2}",
            self.state.credits,
            self.state.difficulty
        );
        true
    }

    /// Consumes world events, advancing the tension curve and spending credits.
    ///
    /// Phase announcements are appended to `out`. Each purchase is offered to
    /// `spawn`; returning `false` ends the current spend attempt without a debit.
    pub fn handle<F>(&mut self, events: &[Event], mut spawn: F, out: &mut Vec<Event>)
    where
        F: FnMut(SpawnRequest) -> bool,
    {
        for event in events {
            match event {
                Event::RunStarted { .. } => self.reset(),
                Event::PlayerLeveledUp { .. } => {
                    self.state.difficulty += self.tuning.level_up_nudge.max(0.0);
                }
                Event::TimeAdvanced { dt } => self.advance(*dt, &mut spawn, out),
                _ => {}
            }
        }
    }

    fn advance<F>(&mut self, dt: Duration, spawn: &mut F, out: &mut Vec<Event>)
    where
        F: FnMut(SpawnRequest) -> bool,
    {
        self.state.phase_elapsed = self.state.phase_elapsed.saturating_add(dt);
        loop {
            let length = self.phase_length(self.state.phase);
            if length.is_zero() || self.state.phase_elapsed < length {
                break;
            }
            self.state.phase_elapsed -= length;
            self.enter(next_phase(self.state.phase), out);
        }

        let gain = self.tuning.base_rate
            * self.state.difficulty
            * self.multiplier(self.state.phase)
            * dt.as_secs_f32();
        if self.state.credits < self.tuning.credit_ceiling {
            self.state.credits = (self.state.credits + gain.max(0.0)).min(self.tuning.credit_ceiling);
        }

        let interval = Duration::from_millis(self.tuning.spend_interval_ms);
        if interval.is_zero() {
            return;
        }
        self.state.spend_elapsed = self.state.spend_elapsed.saturating_add(dt);
        while self.state.spend_elapsed >= interval {
            self.state.spend_elapsed -= interval;
            self.spend(spawn);
        }
    }

    fn enter(&mut self, phase: PacingPhase, out: &mut Vec<Event>) {
        if phase == PacingPhase::Buildup {
            self.state.difficulty += self.tuning.difficulty_step;
        }
        self.state.phase = phase;
        log::debug!(
            "pacing phase {phase:?} at difficulty {:.2}",
            self.state.difficulty
        );
        out.push(Event::PacingPhaseChanged {
            phase,
            difficulty: self.state.difficulty,
            message: phase_message(phase),
        });
    }

    fn spend<F>(&mut self, spawn: &mut F)
    where
        F: FnMut(SpawnRequest) -> bool,
    {
        for _ in 0..MAX_PURCHASES_PER_SPEND {
            if self.state.credits < SpawnTier::Fodder.cost() {
                return;
            }
            let roll = self.rng.gen::<f32>();
            let Some(tier) = self.choose(roll) else {
                return;
            };
            let request = SpawnRequest {
                tier,
                phase: self.state.phase,
                difficulty: self.state.difficulty,
            };
            if !spawn(request) {
                return;
            }
            self.state.credits = (self.state.credits - tier.cost()).max(0.0);
        }
    }

    /// Picks a tier for the uniform `roll` in `[0, 1)`.
    ///
    /// Eligible tiers are walked from most to least expensive, each claiming
    /// its band of the roll; the cheapest eligible tier takes the remainder.
    fn choose(&self, roll: f32) -> Option<SpawnTier> {
        let mut cumulative = 0.0;
        let mut cheapest = None;
        for tier in SpawnTier::ALL.into_iter().rev() {
            if !self.is_eligible(tier) {
                continue;
            }
            cheapest = Some(tier);
            cumulative += self.tuning.bands.band(tier);
            if roll < cumulative {
                return Some(tier);
            }
        }
        cheapest
    }

    fn is_eligible(&self, tier: SpawnTier) -> bool {
        let state = &self.state;
        if tier.cost() > state.credits {
            return false;
        }
        match tier {
            SpawnTier::Heavy => {
                state.phase == PacingPhase::Peak || state.credits >= self.tuning.heavy_reserve
            }
            SpawnTier::Boss => state.phase == PacingPhase::Peak || state.finale,
            SpawnTier::Fodder | SpawnTier::Skirmisher | SpawnTier::Elite => true,
        }
    }

    fn phase_length(&self, phase: PacingPhase) -> Duration {
        let seconds = match phase {
            PacingPhase::Buildup => self.tuning.buildup_secs,
            PacingPhase::Peak => self.tuning.peak_secs,
            PacingPhase::Relax => self.tuning.relax_secs,
        };
        Duration::from_secs_f32(seconds.max(0.0))
    }

    fn multiplier(&self, phase: PacingPhase) -> f32 {
        match phase {
            PacingPhase::Buildup => self.tuning.buildup_multiplier,
            PacingPhase::Peak => self.tuning.peak_multiplier,
            PacingPhase::Relax => self.tuning.relax_multiplier,
        }
    }
}

impl Default for Director {
    fn default() -> Self {
        Self::new(PacingTuning::default(), 0)
    }
}

const fn next_phase(phase: PacingPhase) -> PacingPhase {
    match phase {
        PacingPhase::Buildup => PacingPhase::Peak,
        PacingPhase::Peak => PacingPhase::Relax,
        PacingPhase::Relax => PacingPhase::Buildup,
    }
}

const fn phase_message(phase: PacingPhase) -> &'static str {
    match phase {
        PacingPhase::Buildup => "Something stirs in the dark.",
        PacingPhase::Peak => "They're coming!",
        PacingPhase::Relax => "A moment to breathe.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn director_with_credits(credits: f32, phase: PacingPhase) -> Director {
        let mut director = Director::new(PacingTuning::default(), 7);
        director.set_phase(phase);
        director.set_credits(credits);
        director
    }

    #[test]
    fn expensive_tiers_require_their_gates() {
        let buildup = director_with_credits(50.0, PacingPhase::Buildup);
        assert!(!buildup.is_eligible(SpawnTier::Heavy));
        assert!(!buildup.is_eligible(SpawnTier::Boss));
        assert!(buildup.is_eligible(SpawnTier::Elite));

        let reserve = director_with_credits(70.0, PacingPhase::Buildup);
        assert!(reserve.is_eligible(SpawnTier::Heavy));
        assert!(!reserve.is_eligible(SpawnTier::Boss));

        let peak = director_with_credits(45.0, PacingPhase::Peak);
        assert!(peak.is_eligible(SpawnTier::Boss));
    }

    #[test]
    fn rolls_walk_bands_from_most_expensive() {
        let peak = director_with_credits(45.0, PacingPhase::Peak);
        assert_eq!(peak.choose(0.05), Some(SpawnTier::Boss));
        assert_eq!(peak.choose(0.25), Some(SpawnTier::Heavy));
        assert_eq!(peak.choose(0.55), Some(SpawnTier::Elite));
        assert_eq!(peak.choose(0.95), Some(SpawnTier::Skirmisher));

        let poor = director_with_credits(2.0, PacingPhase::Peak);
        assert_eq!(poor.choose(0.0), Some(SpawnTier::Fodder));

        let broke = director_with_credits(0.5, PacingPhase::Peak);
        assert_eq!(broke.choose(0.0), None);
    }

    #[test]
    fn rejected_spawn_keeps_credits() {
        let mut director = director_with_credits(10.0, PacingPhase::Buildup);
        let mut offered = 0;
        director.spend(&mut |_: SpawnRequest| {
            offered += 1;
            false
        });
        assert_eq!(offered, 1);
        assert!((director.state().credits - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn accrual_is_capped_by_ceiling_but_finale_exceeds_it() {
        let mut director = Director::new(
            PacingTuning {
                spend_interval_ms: 0,
                ..PacingTuning::default()
            },
            1,
        );
        let mut out = Vec::new();
        for _ in 0..400 {
            director.handle(
                &[Event::TimeAdvanced {
                    dt: Duration::from_millis(500),
                }],
                |_| true,
                &mut out,
            );
        }
        assert!(director.state().credits <= 100.0);

        assert!(director.force_finale());
        assert!(!director.force_finale());
        assert!(director.state().credits > 500.0);
    }

    #[test]
    fn level_up_nudges_difficulty() {
        let mut director = Director::default();
        let mut out = Vec::new();
        director.handle(
            &[Event::PlayerLeveledUp {
                level: 2,
                xp_to_next: 15,
            }],
            |_| true,
            &mut out,
        );
        assert!((director.state().difficulty - 1.05).abs() < 1e-5);
    }
}
