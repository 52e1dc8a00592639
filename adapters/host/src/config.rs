//! Session configuration loaded from TOML.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wavebreak_system_behavior::BehaviorTuning;
use wavebreak_system_combat::CombatTuning;
use wavebreak_system_pacing::PacingTuning;
use wavebreak_system_progression::ProgressionTuning;
use wavebreak_system_spawning::SpawnTuning;
use wavebreak_system_weapons::WeaponTuning;
use wavebreak_world::WorldConfig;

/// Errors raised while loading or validating a [`SessionConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config at {path}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The configuration is not valid TOML for this schema.
    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
    /// A value is outside its accepted range.
    #[error("invalid `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Human-readable constraint that was violated.
        reason: String,
    },
}

/// Run-level parameters owned by the host loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Length of a full run in seconds; surviving it extracts the player.
    pub duration_secs: u64,
    /// Length of a simulation step in milliseconds.
    pub fixed_step_ms: f64,
    /// Most simulation steps run for a single host tick.
    pub max_steps_per_tick: u32,
    /// Milliseconds between stats notifications.
    pub stats_interval_ms: u64,
    /// Seconds before the end of the run at which the finale is forced.
    pub finale_lead_secs: u64,
    /// Seed every random stream is derived from.
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration_secs: 600,
            fixed_step_ms: 1_000.0 / 60.0,
            max_steps_per_tick: 5,
            stats_interval_ms: 250,
            finale_lead_secs: 60,
            seed: 0x5eed_0f_7a1d,
        }
    }
}

impl RunConfig {
    /// Length of a simulation step.
    #[must_use]
    pub fn fixed_step(&self) -> Duration {
        Duration::from_secs_f64(self.fixed_step_ms / 1_000.0)
    }

    /// Length of a full run.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    /// Survival time at which the finale starts.
    #[must_use]
    pub fn finale_at(&self) -> Duration {
        Duration::from_secs(self.duration_secs.saturating_sub(self.finale_lead_secs))
    }
}

/// Every tunable of a session, grouped by owning system.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Host loop parameters.
    pub run: RunConfig,
    /// Authoritative world parameters.
    pub world: WorldConfig,
    /// Pacing director tuning.
    pub pacing: PacingTuning,
    /// Population spawner tuning.
    pub spawning: SpawnTuning,
    /// Enemy behaviour tuning.
    pub behavior: BehaviorTuning,
    /// Player weapon tuning.
    pub weapons: WeaponTuning,
    /// Damage resolution tuning.
    pub combat: CombatTuning,
    /// Progression tuning.
    pub progression: ProgressionTuning,
}

impl SessionConfig {
    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Rejects values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.run.fixed_step_ms.is_finite() && self.run.fixed_step_ms > 0.0) {
            return Err(invalid("run.fixed_step_ms", "must be a positive number"));
        }
        if self.run.max_steps_per_tick == 0 {
            return Err(invalid("run.max_steps_per_tick", "must be at least 1"));
        }
        if self.run.duration_secs == 0 {
            return Err(invalid("run.duration_secs", "must be at least 1"));
        }
        if self.run.stats_interval_ms == 0 {
            return Err(invalid("run.stats_interval_ms", "must be at least 1"));
        }
        if self.world.population_cap == 0 {
            return Err(invalid("world.population_cap", "must be at least 1"));
        }
        let phases = [
            self.pacing.buildup_secs,
            self.pacing.peak_secs,
            self.pacing.relax_secs,
        ];
        if phases.iter().any(|secs| !(secs.is_finite() && *secs > 0.0)) {
            return Err(invalid("pacing", "phase lengths must be positive"));
        }
        if self.pacing.spend_interval_ms == 0 {
            return Err(invalid("pacing.spend_interval_ms", "must be at least 1"));
        }
        if self.spawning.schedule.is_empty() {
            return Err(invalid("spawning.schedule", "needs at least one step"));
        }
        if self
            .spawning
            .schedule
            .iter()
            .any(|step| step.interval_ms == 0)
        {
            return Err(invalid("spawning.schedule", "intervals must be positive"));
        }
        if self.spawning.spawn_radius <= 0.0 {
            return Err(invalid("spawning.spawn_radius", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.spawning.courier_chance) {
            return Err(invalid("spawning.courier_chance", "must lie in 0..=1"));
        }
        if self.progression.xp_growth < 1.0 {
            return Err(invalid("progression.xp_growth", "must be at least 1"));
        }
        if self.combat.ledger_capacity == 0 {
            return Err(invalid("combat.ledger_capacity", "must be at least 1"));
        }
        if self.run.finale_lead_secs >= self.run.duration_secs {
            log::warn!(
                "finale lead of {}s covers the whole {}s run; the finale starts immediately",
                self.run.finale_lead_secs,
                self.run.duration_secs
            );
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_owned(),
    }
}
