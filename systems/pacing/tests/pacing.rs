use std::time::Duration;

use wavebreak_core::{Event, PacingPhase};
use wavebreak_system_pacing::{Director, PacingTuning, SpawnRequest};

fn tick(director: &mut Director, dt: Duration, requests: &mut Vec<SpawnRequest>) -> Vec<Event> {
    let mut out = Vec::new();
    director.handle(
        &[Event::TimeAdvanced { dt }],
        |request| {
            requests.push(request);
            true
        },
        &mut out,
    );
    out
}

#[test]
fn peak_spend_never_overdraws_credits() {
    for seed in 0..64 {
        let mut director = Director::new(PacingTuning::default(), seed);
        director.set_phase(PacingPhase::Peak);
        director.set_credits(45.0);

        let mut requests = Vec::new();
        let _ = tick(&mut director, Duration::from_millis(500), &mut requests);

        let accrued = 3.0 * 0.5;
        let spent: f32 = requests.iter().map(|request| request.tier.cost()).sum();
        assert!(!requests.is_empty());
        assert!(spent <= 45.0 + accrued, "seed {seed} spent {spent}");
        assert!(director.state().credits >= 0.0);
        assert!(director.state().credits < 1.0);
    }
}

#[test]
fn difficulty_grows_by_step_per_completed_cycle() {
    let tuning = PacingTuning::default();
    let cycle = tuning.buildup_secs + tuning.peak_secs + tuning.relax_secs;
    let mut director = Director::new(tuning, 3);
    let mut requests = Vec::new();

    for cycles in 1..=5u32 {
        let steps = (cycle * 10.0).round() as u32;
        for _ in 0..steps {
            let _ = tick(&mut director, Duration::from_millis(100), &mut requests);
        }
        let expected = 1.0 + 0.2 * cycles as f32;
        let difficulty = director.state().difficulty;
        assert!(
            (difficulty - expected).abs() < 1e-3,
            "after {cycles} cycles difficulty was {difficulty}"
        );
        assert_eq!(director.state().phase, PacingPhase::Buildup);
    }
}

#[test]
fn phases_are_announced_in_order() {
    let mut director = Director::default();
    let mut requests = Vec::new();
    let mut phases = Vec::new();
    for _ in 0..360 {
        for event in tick(&mut director, Duration::from_millis(100), &mut requests) {
            if let Event::PacingPhaseChanged { phase, .. } = event {
                phases.push(phase);
            }
        }
    }
    assert_eq!(
        phases,
        vec![PacingPhase::Peak, PacingPhase::Relax, PacingPhase::Buildup]
    );
}

#[test]
fn rejected_spawn_stops_the_spend_attempt() {
    let mut director = Director::default();
    director.set_credits(30.0);
    let mut offered = 0;
    let mut out = Vec::new();
    director.handle(
        &[Event::TimeAdvanced {
            dt: Duration::from_millis(500),
        }],
        |_| {
            offered += 1;
            false
        },
        &mut out,
    );
    assert_eq!(offered, 1);
    assert!(director.state().credits >= 30.0);
}

#[test]
fn run_start_resets_the_director() {
    let mut director = Director::default();
    let mut requests = Vec::new();
    for _ in 0..400 {
        let _ = tick(&mut director, Duration::from_millis(100), &mut requests);
    }
    assert!(director.state().difficulty > 1.0);

    let mut out = Vec::new();
    director.handle(
        &[Event::RunStarted {
            class: wavebreak_core::PlayerClass::Gunner,
        }],
        |_| true,
        &mut out,
    );
    assert_eq!(director.state().phase, PacingPhase::Buildup);
    assert!((director.state().difficulty - 1.0).abs() < f32::EPSILON);
    assert!(director.state().credits.abs() < f32::EPSILON);
}
