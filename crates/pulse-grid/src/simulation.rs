//! Simulation driver that owns a grid and its random source.

use crate::collision::CollisionStats;
use crate::events::EventSink;
use crate::grid::{create_grid, Grid};
use crate::tick::tick;
use pulse_core::{GridConfig, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, event, info, instrument, warn, Level};

pub struct Simulation {
    grid: Grid,
    rng: ChaCha8Rng,
    tick: u64,
    totals: CollisionStats,
    metrics_interval: u64,
}

impl Simulation {
    /// Randomly populate a grid from `config`, seeding every draw from `seed`
    pub fn new(config: &GridConfig, seed: u64) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let grid = create_grid(config, &mut rng)?;
        Ok(Self::with_rng(grid, rng))
    }

    /// Start from a hand-built grid
    pub fn from_grid(grid: Grid, seed: u64) -> Self {
        Self::with_rng(grid, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(grid: Grid, rng: ChaCha8Rng) -> Self {
        Self {
            grid,
            rng,
            tick: 0,
            totals: CollisionStats::default(),
            metrics_interval: 0,
        }
    }

    /// Emit a metrics snapshot every `interval` ticks (0 disables)
    pub fn with_metrics_interval(mut self, interval: u64) -> Self {
        self.metrics_interval = interval;
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn totals(&self) -> &CollisionStats {
        &self.totals
    }

    /// Counts for everything this simulation has run so far
    pub fn summary(&self) -> SimulationResult {
        self.collect_results(self.tick)
    }

    /// Advance one tick
    pub fn step<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> CollisionStats {
        let outcome = tick(&self.grid, &mut self.rng, sink);
        self.grid = outcome.grid;
        self.tick += 1;
        self.totals.merge(&outcome.stats);

        if outcome.stats.events_dropped > 0 {
            warn!(
                tick = self.tick,
                dropped = outcome.stats.events_dropped,
                "Event sink rejected collision events"
            );
        }
        debug!(
            tick = self.tick,
            detector_hits = outcome.stats.detector_hits,
            particle_hits = outcome.stats.particle_hits,
            "Tick complete"
        );

        if self.metrics_interval > 0 && self.tick % self.metrics_interval == 0 {
            self.emit_grid_metrics();
        }

        outcome.stats
    }

    /// Run for a fixed number of ticks
    #[instrument(skip(self, sink))]
    pub fn run<S: EventSink + ?Sized>(&mut self, ticks: u64, sink: &mut S) -> SimulationResult {
        info!("Starting simulation for {} ticks", ticks);
        let start_tick = self.tick;

        for _ in 0..ticks {
            self.step(&mut *sink);
        }

        let result = self.collect_results(self.tick - start_tick);
        info!(
            event = "run_summary",
            ticks = result.ticks,
            particles = result.particles,
            detectors = result.detectors,
            remaining_energy = result.remaining_energy,
            events_emitted = result.totals.events_emitted,
            events_dropped = result.totals.events_dropped,
            "Simulation run complete"
        );
        result
    }

    fn emit_grid_metrics(&self) {
        let spent = self.grid.particles().filter(|(_, p)| p.is_spent()).count();

        info!(
            event = "grid_metrics",
            tick = self.tick,
            particles = self.grid.particle_count(),
            spent_particles = spent,
            occupied_cells = self.grid.occupied_cells(),
            total_energy = self.grid.total_energy(),
            detector_hits = self.totals.detector_hits,
            particle_hits = self.totals.particle_hits,
            events_dropped = self.totals.events_dropped,
            "Grid metrics snapshot"
        );

        event!(
            Level::INFO,
            gauge_name = "total_energy",
            gauge_value = self.grid.total_energy(),
            tick = self.tick,
            "Total particle energy"
        );

        event!(
            Level::INFO,
            counter_name = "events_dropped",
            counter_value = self.totals.events_dropped,
            tick = self.tick,
            "Dropped collision events"
        );
    }

    fn collect_results(&self, ticks: u64) -> SimulationResult {
        SimulationResult {
            ticks,
            particles: self.grid.particle_count(),
            detectors: self.grid.detector_count(),
            remaining_energy: self.grid.total_energy(),
            totals: self.totals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub ticks: u64,
    pub particles: usize,
    pub detectors: usize,
    pub remaining_energy: u64,
    pub totals: CollisionStats,
}
