//! Configuration types for the simulation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Grid construction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Width of the grid in cells
    pub width: i32,
    /// Height of the grid in cells
    pub height: i32,
    /// Number of particles placed at setup
    pub particle_count: u32,
    /// Number of detectors placed at setup
    pub detector_count: u32,
    /// Energy every particle starts with
    pub initial_energy: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 16,
            height: 16,
            particle_count: 12,
            detector_count: 8,
            initial_energy: 100,
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width <= 0 || self.height <= 0 {
            return Err(Error::InvalidConfig(format!(
                "grid dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Beat clock and event delivery parameters for the tick scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Tempo in beats per minute
    pub bpm: f64,
    /// Grid ticks per beat (4 = sixteenth notes)
    pub ticks_per_beat: u32,
    /// Stop after this many ticks; `None` runs until cancelled
    pub max_ticks: Option<u64>,
    /// Seed for the simulation RNG; `None` seeds from entropy
    pub seed: Option<u64>,
    /// Capacity of the bounded collision event queue
    pub event_capacity: usize,
    /// The listener stops after this long without an event (milliseconds)
    pub listen_idle_ms: u64,
    /// Emit grid metrics every N ticks (0 disables)
    pub metrics_interval: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            ticks_per_beat: 4,
            max_ticks: None,
            seed: None,
            event_capacity: 256,
            listen_idle_ms: 5_000,
            metrics_interval: 64,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "tempo must be a positive number of beats per minute, got {}",
                self.bpm
            )));
        }
        if self.ticks_per_beat == 0 {
            return Err(Error::InvalidConfig(
                "ticks_per_beat must be at least 1".to_string(),
            ));
        }
        self.tick_period()?;
        if self.event_capacity == 0 {
            return Err(Error::InvalidConfig(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Seconds between two consecutive ticks
    pub fn tick_period_secs(&self) -> f64 {
        60.0 / (self.bpm * self.ticks_per_beat as f64)
    }

    /// Time between two consecutive ticks; tempos too slow to express as a
    /// `Duration` are rejected
    pub fn tick_period(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.tick_period_secs()).map_err(|e| {
            Error::InvalidConfig(format!(
                "tempo {} bpm gives an unusable tick period: {}",
                self.bpm, e
            ))
        })
    }
}

/// Complete runner configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub grid: GridConfig,
    pub scheduler: SchedulerConfig,
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        self.scheduler.validate()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: RunConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "Loaded run configuration");
        Self::from_json(&contents)
    }
}
