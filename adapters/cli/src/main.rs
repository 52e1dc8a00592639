#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless driver that plays a scripted Wavebreak run and reports its outcome.

mod logging;

use std::{cell::RefCell, path::PathBuf, rc::Rc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use glam::Vec2;
use serde::Serialize;
use wavebreak_core::{EffectiveStats, PlayerClass, RunOutcome, Skill};
use wavebreak_host::{Notification, Session, SessionConfig};

const FRAME: Duration = Duration::from_millis(16);
const SKILLS: [Skill; 3] = [Skill::Nova, Skill::Volley, Skill::Frenzy];

/// Runs a Wavebreak encounter without a renderer.
#[derive(Parser, Debug)]
#[command(name = "wavebreak", author, version, about, long_about = None)]
struct Args {
    /// Run length in seconds; overrides the config file.
    #[arg(long)]
    seconds: Option<u64>,
    /// Simulation seed; overrides the config file.
    #[arg(long)]
    seed: Option<u64>,
    /// Player class.
    #[arg(long, value_enum, default_value_t = ClassArg::Gunner)]
    class: ClassArg,
    /// TOML session configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Use every skill as soon as it is ready.
    #[arg(long)]
    skills: bool,
    /// Circle the arena instead of standing still.
    #[arg(long)]
    kite: bool,
    /// Pretty-print the JSON report.
    #[arg(long)]
    pretty: bool,
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ClassArg {
    Gunner,
    Lancer,
    Warden,
}

impl From<ClassArg> for PlayerClass {
    fn from(value: ClassArg) -> Self {
        match value {
            ClassArg::Gunner => PlayerClass::Gunner,
            ClassArg::Lancer => PlayerClass::Lancer,
            ClassArg::Warden => PlayerClass::Warden,
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    outcome: Option<RunOutcome>,
    phase_changes: u32,
    level_ups: u32,
    crits: u32,
}

#[derive(Debug, Serialize)]
struct Report {
    seed: u64,
    outcome: RunOutcome,
    phase_changes: u32,
    level_ups: u32,
    crits: u32,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("failed to load session config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(seconds) = args.seconds {
        config.run.duration_secs = seconds;
    }
    if let Some(seed) = args.seed {
        config.run.seed = seed;
    }
    let seed = config.run.seed;
    let frame_budget = frame_budget(config.run.duration_secs);

    let mut session =
        Session::new(config, EffectiveStats::default()).context("invalid session config")?;
    let tally = Rc::new(RefCell::new(Tally::default()));
    let sink = Rc::clone(&tally);
    let _ = session.subscribe(move |notification| {
        let mut tally = sink.borrow_mut();
        match notification {
            Notification::RunEnded(outcome) => tally.outcome = Some(*outcome),
            Notification::PacingPhaseChanged { phase, message } => {
                tally.phase_changes += 1;
                log::info!("{phase:?}: {message}");
            }
            Notification::PlayerLeveledUp { level, .. } => {
                tally.level_ups += 1;
                log::info!("reached level {level}");
            }
            Notification::DamageApplied { is_crit: true, .. } => tally.crits += 1,
            _ => {}
        }
    });

    session.start_run(args.class.into());
    for frame in 0..frame_budget {
        if !session.is_run_active() {
            break;
        }
        if args.kite {
            let angle = frame as f32 * FRAME.as_secs_f32() * 0.5;
            session.set_move_intent(Vec2::from_angle(angle).perp());
        }
        if args.skills {
            for skill in SKILLS {
                let _ = session.request_skill(skill);
            }
        }
        session.tick(FRAME);
    }
    if session.is_run_active() {
        log::warn!("run still active after {frame_budget} frames; aborting");
        let _ = session.abort_run();
    }

    let tally = tally.borrow();
    let Some(outcome) = tally.outcome else {
        bail!("run finished without reporting an outcome");
    };
    let report = Report {
        seed,
        outcome,
        phase_changes: tally.phase_changes,
        level_ups: tally.level_ups,
        crits: tally.crits,
    };
    let json = if args.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .context("failed to serialise run report")?;
    println!("{json}");
    Ok(())
}

/// Wall-clock frames allowed for a run, leaving headroom for hit-stop.
fn frame_budget(duration_secs: u64) -> u64 {
    let frames_per_second = 1_000 / FRAME.as_millis() as u64;
    duration_secs
        .saturating_mul(frames_per_second)
        .saturating_mul(2)
        .max(1)
}
