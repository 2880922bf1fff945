//! Tempo-locked tick scheduler.
//!
//! Tick `n` fires at `origin + n * period`, where the period comes from the
//! tempo. Deadlines are computed from the beat counter rather than by sleeping a
//! fixed amount after each tick, so processing latency never accumulates into
//! drift. A tick that overruns makes the following deadlines fire immediately
//! until the schedule is caught up.

use parking_lot::RwLock;
use pulse_core::{Result, SchedulerConfig};
use pulse_grid::{EventSink, Grid, Simulation, SimulationResult};
use std::sync::Arc;
use tokio::time::{sleep_until, Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Absolute timeline of tick deadlines
#[derive(Debug, Clone, Copy)]
pub struct BeatClock {
    origin: Instant,
    period: Duration,
}

impl BeatClock {
    pub fn new(origin: Instant, period: Duration) -> Self {
        Self { origin, period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// When tick `n` is due, or `None` once the timeline runs past what an
    /// `Instant` can hold
    pub fn deadline(&self, n: u64) -> Option<Instant> {
        let offset = Duration::try_from_secs_f64(self.period.as_secs_f64() * n as f64).ok()?;
        self.origin.checked_add(offset)
    }
}

/// Summary of a scheduler run
#[derive(Debug, Clone)]
pub struct SchedulerReport {
    /// Ticks that started after their deadline by more than one period
    pub late_ticks: u64,
    pub max_lateness: Duration,
    pub cancelled: bool,
    /// Grid and collision counts from the simulation the scheduler drove
    pub result: SimulationResult,
}

impl SchedulerReport {
    pub fn ticks(&self) -> u64 {
        self.result.ticks
    }
}

/// Steps a [`Simulation`] on the beat clock and publishes each new grid.
pub struct Scheduler<S> {
    simulation: Simulation,
    grid: Arc<RwLock<Grid>>,
    sink: S,
    period: Duration,
    config: SchedulerConfig,
}

impl<S: EventSink> Scheduler<S> {
    /// Build a scheduler over the grid currently held in `grid`
    pub fn new(grid: Arc<RwLock<Grid>>, sink: S, config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        let period = config.tick_period()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        let simulation = Simulation::from_grid(grid.read().clone(), seed)
            .with_metrics_interval(config.metrics_interval);
        Ok(Self {
            simulation,
            grid,
            sink,
            period,
            config,
        })
    }

    /// Run until `max_ticks` is reached or `cancel` fires.
    ///
    /// Cancellation is only observed between ticks; a tick in progress always
    /// completes and publishes its grid.
    #[instrument(skip_all, fields(bpm = self.config.bpm, ticks_per_beat = self.config.ticks_per_beat))]
    pub async fn run(mut self, cancel: CancellationToken) -> SchedulerReport {
        let clock = BeatClock::new(Instant::now(), self.period);
        let mut late_ticks = 0;
        let mut max_lateness = Duration::ZERO;
        let mut cancelled = false;

        info!(period_ms = clock.period().as_secs_f64() * 1000.0, "Scheduler started");

        let mut beat: u64 = 0;
        loop {
            if self.config.max_ticks.is_some_and(|max| beat >= max) {
                break;
            }

            let Some(deadline) = clock.deadline(beat) else {
                warn!(beat, "Beat clock exhausted");
                break;
            };
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                _ = sleep_until(deadline) => {}
            }

            let lateness = Instant::now().saturating_duration_since(deadline);
            if lateness > clock.period() {
                late_ticks += 1;
                warn!(beat, lateness_ms = lateness.as_millis() as u64, "Tick fired late");
            }
            max_lateness = max_lateness.max(lateness);

            self.simulation.step(&mut self.sink);
            *self.grid.write() = self.simulation.grid().clone();

            beat += 1;
        }

        let report = SchedulerReport {
            late_ticks,
            max_lateness,
            cancelled,
            result: self.simulation.summary(),
        };
        info!(
            ticks = report.ticks(),
            late_ticks = report.late_ticks,
            max_lateness_ms = report.max_lateness.as_millis() as u64,
            cancelled = report.cancelled,
            "Scheduler stopped"
        );
        report
    }
}
