//! ---
//! fmon_section: "01-core-functionality"
//! fmon_subsection: "module"
//! fmon_type: "source"
//! fmon_scope: "code"
//! fmon_description: "Shared primitives and utilities for the simulator runtime."
//! fmon_version: "v0.1.0"
//! fmon_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::debug;

use crate::logging::LogFormat;

/// Named defaults for every probability, step, clamp bound, and window cap used by
/// the telemetry generator.
pub mod tuning {
    pub const TICK_INTERVAL_SECS: u64 = 15;

    pub const PERSONNEL_DELTA_MAX: u32 = 2;
    pub const PERSONNEL_OVERFLOW: u32 = 3;

    pub const SYSTEM_EFFICIENCY_STEP: f64 = 0.5;
    pub const SYSTEM_EFFICIENCY_MIN: f64 = 85.0;
    pub const SYSTEM_EFFICIENCY_MAX: f64 = 98.0;
    pub const DEFECT_PROBABILITY: f64 = 0.15;

    pub const MACHINE_EFFICIENCY_STEP: f64 = 2.0;
    pub const MACHINE_EFFICIENCY_MIN: f64 = 70.0;
    pub const MACHINE_EFFICIENCY_MAX: f64 = 100.0;
    pub const MACHINE_WARNING_PROBABILITY: f64 = 0.02;
    pub const MACHINE_WARNING_THRESHOLD: f64 = 80.0;
    pub const MAINTENANCE_RECOVERY_PROBABILITY: f64 = 0.10;
    pub const MAINTENANCE_RESTART_MIN: f64 = 90.0;
    pub const WARNING_RECOVERY_PROBABILITY: f64 = 0.20;
    pub const WARNING_RECOVERY_FLOOR: f64 = 85.0;

    pub const ENERGY_NOISE: f64 = 50.0;
    pub const ENERGY_FLOOR: f64 = 200.0;

    pub const ACTION_PROBABILITY: f64 = 0.30;
    pub const NOTIFICATION_PROBABILITY: f64 = 0.15;

    pub const ACTION_LOG_CAPACITY: usize = 50;
    pub const NOTIFICATION_LOG_CAPACITY: usize = 30;
    pub const ENERGY_WINDOW_CAPACITY: usize = 24;
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(tuning::TICK_INTERVAL_SECS)
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

fn default_file_output() -> bool {
    true
}

/// Primary configuration object for the FMON runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    /// `None` when no file was found and built-in defaults are in effect.
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &'static str = "FMON_CONFIG";

    /// Load configuration from disk, respecting the `FMON_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    ///
    /// Fails when neither `FMON_CONFIG` nor any candidate points at a file.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        Self::discover(candidates)?.ok_or_else(|| {
            anyhow!(
                "no configuration files found. inspected: {}",
                candidates
                    .iter()
                    .map(|p| p.as_ref().display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })
    }

    /// Like [`AppConfig::load_with_source`] but falls back to defaults when no file exists.
    /// A file that exists but fails to parse or validate is still an error.
    pub fn load_or_default<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        match Self::discover(candidates)? {
            Some(loaded) => Ok(loaded),
            None => {
                debug!("no configuration file found; using built-in defaults");
                Ok(LoadedAppConfig {
                    config: AppConfig::default(),
                    source: None,
                })
            }
        }
    }

    fn discover<P: AsRef<Path>>(candidates: &[P]) -> Result<Option<LoadedAppConfig>> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(Some(LoadedAppConfig {
                    config,
                    source: Some(path),
                }));
            }
        }

        for candidate in candidates {
            let path = candidate.as_ref();
            if path.exists() {
                let config = Self::from_path(path)?;
                return Ok(Some(LoadedAppConfig {
                    config,
                    source: Some(path.to_path_buf()),
                }));
            }
        }
        Ok(None)
    }

    fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_tick_interval")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub tick_interval: Duration,
    /// Seed for the pseudo-random source. Unset means a fresh seed per process.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Site offset from UTC used to classify shifts. Unset means the host's local offset.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
    #[serde(default)]
    pub tuning: TuningConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            random_seed: None,
            utc_offset_minutes: None,
            tuning: TuningConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval.is_zero() {
            return Err(anyhow!("simulation.tick_interval must be greater than zero"));
        }
        if let Some(offset) = self.utc_offset_minutes {
            if offset.abs() >= 24 * 60 {
                return Err(anyhow!(
                    "simulation.utc_offset_minutes {} is outside a single day",
                    offset
                ));
            }
        }
        self.tuning.validate()
    }
}

/// Overridable copy of the [`tuning`] constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    pub personnel_delta_max: u32,
    pub personnel_overflow: u32,
    pub system_efficiency_step: f64,
    pub system_efficiency_min: f64,
    pub system_efficiency_max: f64,
    pub defect_probability: f64,
    pub machine_efficiency_step: f64,
    pub machine_efficiency_min: f64,
    pub machine_efficiency_max: f64,
    pub machine_warning_probability: f64,
    pub machine_warning_threshold: f64,
    pub maintenance_recovery_probability: f64,
    pub maintenance_restart_min: f64,
    pub warning_recovery_probability: f64,
    pub warning_recovery_floor: f64,
    pub energy_noise: f64,
    pub energy_floor: f64,
    pub action_probability: f64,
    pub notification_probability: f64,
    pub action_log_capacity: usize,
    pub notification_log_capacity: usize,
    pub energy_window_capacity: usize,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            personnel_delta_max: tuning::PERSONNEL_DELTA_MAX,
            personnel_overflow: tuning::PERSONNEL_OVERFLOW,
            system_efficiency_step: tuning::SYSTEM_EFFICIENCY_STEP,
            system_efficiency_min: tuning::SYSTEM_EFFICIENCY_MIN,
            system_efficiency_max: tuning::SYSTEM_EFFICIENCY_MAX,
            defect_probability: tuning::DEFECT_PROBABILITY,
            machine_efficiency_step: tuning::MACHINE_EFFICIENCY_STEP,
            machine_efficiency_min: tuning::MACHINE_EFFICIENCY_MIN,
            machine_efficiency_max: tuning::MACHINE_EFFICIENCY_MAX,
            machine_warning_probability: tuning::MACHINE_WARNING_PROBABILITY,
            machine_warning_threshold: tuning::MACHINE_WARNING_THRESHOLD,
            maintenance_recovery_probability: tuning::MAINTENANCE_RECOVERY_PROBABILITY,
            maintenance_restart_min: tuning::MAINTENANCE_RESTART_MIN,
            warning_recovery_probability: tuning::WARNING_RECOVERY_PROBABILITY,
            warning_recovery_floor: tuning::WARNING_RECOVERY_FLOOR,
            energy_noise: tuning::ENERGY_NOISE,
            energy_floor: tuning::ENERGY_FLOOR,
            action_probability: tuning::ACTION_PROBABILITY,
            notification_probability: tuning::NOTIFICATION_PROBABILITY,
            action_log_capacity: tuning::ACTION_LOG_CAPACITY,
            notification_log_capacity: tuning::NOTIFICATION_LOG_CAPACITY,
            energy_window_capacity: tuning::ENERGY_WINDOW_CAPACITY,
        }
    }
}

impl TuningConfig {
    pub fn validate(&self) -> Result<()> {
        let probabilities = [
            ("defect_probability", self.defect_probability),
            ("machine_warning_probability", self.machine_warning_probability),
            (
                "maintenance_recovery_probability",
                self.maintenance_recovery_probability,
            ),
            ("warning_recovery_probability", self.warning_recovery_probability),
            ("action_probability", self.action_probability),
            ("notification_probability", self.notification_probability),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!(
                    "tuning.{} must be within [0, 1], got {}",
                    name,
                    value
                ));
            }
        }
        let reals = [
            ("system_efficiency_step", self.system_efficiency_step),
            ("system_efficiency_min", self.system_efficiency_min),
            ("system_efficiency_max", self.system_efficiency_max),
            ("defect_probability", self.defect_probability),
            ("machine_efficiency_step", self.machine_efficiency_step),
            ("machine_efficiency_min", self.machine_efficiency_min),
            ("machine_efficiency_max", self.machine_efficiency_max),
            ("machine_warning_probability", self.machine_warning_probability),
            ("machine_warning_threshold", self.machine_warning_threshold),
            (
                "maintenance_recovery_probability",
                self.maintenance_recovery_probability,
            ),
            ("maintenance_restart_min", self.maintenance_restart_min),
            ("warning_recovery_probability", self.warning_recovery_probability),
            ("warning_recovery_floor", self.warning_recovery_floor),
            ("energy_noise", self.energy_noise),
            ("energy_floor", self.energy_floor),
            ("action_probability", self.action_probability),
            ("notification_probability", self.notification_probability),
        ];
        for (name, value) in reals {
            if !value.is_finite() {
                return Err(anyhow!("tuning.{} must be a finite number, got {}", name, value));
            }
        }
        if self.system_efficiency_min > self.system_efficiency_max {
            return Err(anyhow!(
                "tuning.system_efficiency_min must not exceed system_efficiency_max"
            ));
        }
        if self.machine_efficiency_min > self.machine_efficiency_max {
            return Err(anyhow!(
                "tuning.machine_efficiency_min must not exceed machine_efficiency_max"
            ));
        }
        if self.maintenance_restart_min < self.machine_efficiency_min
            || self.maintenance_restart_min > self.machine_efficiency_max
        {
            return Err(anyhow!(
                "tuning.maintenance_restart_min must lie within [machine_efficiency_min, machine_efficiency_max]"
            ));
        }
        if self.warning_recovery_floor < self.machine_efficiency_min
            || self.warning_recovery_floor > self.machine_efficiency_max
        {
            return Err(anyhow!(
                "tuning.warning_recovery_floor must lie within [machine_efficiency_min, machine_efficiency_max]"
            ));
        }
        if self.energy_noise < 0.0 || self.system_efficiency_step < 0.0 {
            return Err(anyhow!("tuning steps and noise must be non-negative"));
        }
        if self.personnel_overflow == 0 {
            return Err(anyhow!(
                "tuning.personnel_overflow must allow at least one person over capacity"
            ));
        }
        if self.action_log_capacity == 0
            || self.notification_log_capacity == 0
            || self.energy_window_capacity == 0
        {
            return Err(anyhow!("tuning window capacities must be greater than zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
    /// Write the daily rolling JSON log file in addition to stdout.
    #[serde(default = "default_file_output")]
    pub file_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
            file_output: default_file_output(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_tuning_constants() {
        let config = AppConfig::default();
        assert_eq!(config.simulation.tick_interval, Duration::from_secs(15));
        assert_eq!(config.simulation.tuning.action_log_capacity, 50);
        assert_eq!(config.simulation.tuning.notification_log_capacity, 30);
        assert_eq!(config.simulation.tuning.energy_window_capacity, 24);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_partial_toml() {
        let config: AppConfig = r#"
            [simulation]
            tick_interval = 2
            random_seed = 42

            [simulation.tuning]
            action_probability = 1.0

            [logging]
            format = "pretty"
            file_output = false
        "#
        .parse()
        .unwrap();
        assert_eq!(config.simulation.tick_interval, Duration::from_secs(2));
        assert_eq!(config.simulation.random_seed, Some(42));
        assert_eq!(config.simulation.tuning.action_probability, 1.0);
        assert_eq!(config.simulation.tuning.notification_probability, 0.15);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(!config.logging.file_output);
    }

    #[test]
    fn rejects_zero_tick_interval() {
        let err = "[simulation]\ntick_interval = 0\n"
            .parse::<AppConfig>()
            .unwrap_err();
        assert!(err.to_string().contains("tick_interval"));
    }

    #[test]
    fn rejects_probability_out_of_range() {
        let mut tuning = TuningConfig::default();
        tuning.defect_probability = 1.5;
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn rejects_inverted_bounds() {
        let mut tuning = TuningConfig::default();
        tuning.system_efficiency_min = 99.0;
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn rejects_non_finite_tuning() {
        let err = "[simulation.tuning]\nsystem_efficiency_min = nan\n"
            .parse::<AppConfig>()
            .unwrap_err();
        assert!(err.to_string().contains("system_efficiency_min"));

        let mut tuning = TuningConfig::default();
        tuning.energy_noise = f64::INFINITY;
        assert!(tuning.validate().is_err());
        let mut tuning = TuningConfig::default();
        tuning.machine_efficiency_max = f64::NAN;
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn recovery_efficiencies_stay_within_machine_bounds() {
        let mut tuning = TuningConfig::default();
        tuning.warning_recovery_floor = 150.0;
        let err = tuning.validate().unwrap_err();
        assert!(err.to_string().contains("warning_recovery_floor"));

        let mut tuning = TuningConfig::default();
        tuning.warning_recovery_floor = 60.0;
        assert!(tuning.validate().is_err());

        let mut tuning = TuningConfig::default();
        tuning.maintenance_restart_min = 50.0;
        let err = tuning.validate().unwrap_err();
        assert!(err.to_string().contains("maintenance_restart_min"));

        let mut tuning = TuningConfig::default();
        tuning.maintenance_restart_min = 70.0;
        tuning.warning_recovery_floor = 100.0;
        assert!(tuning.validate().is_ok());
    }

    #[test]
    fn load_with_source_reads_first_existing_candidate() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[simulation]\ntick_interval = 5")?;
        file.flush()?;
        let missing = PathBuf::from("does/not/exist.toml");
        let loaded = AppConfig::load_with_source(&[missing, file.path().to_path_buf()])?;
        assert_eq!(loaded.config.simulation.tick_interval, Duration::from_secs(5));
        assert_eq!(loaded.source.as_deref(), Some(file.path()));
        Ok(())
    }

    #[test]
    fn load_or_default_falls_back_when_nothing_exists() -> Result<()> {
        let loaded = AppConfig::load_or_default(&[PathBuf::from("does/not/exist.toml")])?;
        assert!(loaded.source.is_none());
        assert_eq!(loaded.config.simulation.tick_interval, Duration::from_secs(15));
        Ok(())
    }

    #[test]
    fn load_with_source_errors_when_nothing_exists() {
        assert!(AppConfig::load_with_source(&[PathBuf::from("does/not/exist.toml")]).is_err());
    }
}
