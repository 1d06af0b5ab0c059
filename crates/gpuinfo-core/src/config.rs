//! gpuinfo.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuInfoConfig {
    pub state: StateConfig,
    pub inventory: InventoryConfig,
    pub simulation: SimulationConfig,
    pub controller: ControllerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Path of the redb file holding requests and nodes.
    pub path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("gpuinfo.redb"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Snapshot file describing VMs and hosts.
    pub snapshot: PathBuf,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            snapshot: PathBuf::from("inventory.toml"),
        }
    }
}

/// Parameters of the simulated accelerator attribute feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Lower bound (inclusive) of hours until next maintenance.
    pub min_hours: u32,
    /// Upper bound (inclusive) of hours until next maintenance.
    pub max_hours: u32,
    /// Probability that a host reports an accelerator.
    pub accelerator_probability: f64,
    /// Fixed seed. When absent each pass is seeded from the wall clock.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            min_hours: 300,
            max_hours: 400,
            accelerator_probability: 0.5,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// How often request objects are re-listed (e.g. "5s", "1m").
    pub resync_interval: String,
    /// Upper bound on reconciliations running at once.
    pub max_concurrent_reconciles: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            resync_interval: "5s".to_string(),
            max_concurrent_reconciles: 4,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("simulation.min_hours ({min}) exceeds simulation.max_hours ({max})")]
    HoursRange { min: u32, max: u32 },
    #[error("simulation.accelerator_probability must be within [0, 1], got {0}")]
    Probability(f64),
    #[error("controller.max_concurrent_reconciles must be at least 1")]
    NoWorkers,
    #[error("invalid duration: {0:?}")]
    Duration(String),
    #[error("controller.resync_interval must be greater than zero")]
    ZeroInterval,
}

impl GpuInfoConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GpuInfoConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        if sim.min_hours > sim.max_hours {
            return Err(ConfigError::HoursRange {
                min: sim.min_hours,
                max: sim.max_hours,
            });
        }
        if !(0.0..=1.0).contains(&sim.accelerator_probability) {
            return Err(ConfigError::Probability(sim.accelerator_probability));
        }
        if self.controller.max_concurrent_reconciles == 0 {
            return Err(ConfigError::NoWorkers);
        }
        self.controller.resync_interval()?;
        Ok(())
    }
}

impl ControllerConfig {
    pub fn resync_interval(&self) -> Result<Duration, ConfigError> {
        let interval = parse_duration(&self.resync_interval)?;
        if interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(interval)
    }
}

/// Parse a duration string like "30s", "5m" or "10".
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let s = s.trim();
    let (digits, scale) = if let Some(secs) = s.strip_suffix('s') {
        (secs, 1)
    } else if let Some(mins) = s.strip_suffix('m') {
        (mins, 60)
    } else {
        (s, 1)
    };
    digits
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(scale))
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::Duration(s.to_string()))
}
