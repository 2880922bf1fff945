//! Runs the particle grid on a musical beat and reports detector hits.

mod listener;
mod scheduler;
mod sink;
mod telemetry;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use pulse_core::RunConfig;
use pulse_grid::create_grid;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tokio::signal;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Environment variable naming a JSON configuration file
const CONFIG_ENV: &str = "PULSE_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_telemetry()?;

    let config = load_config()?;
    info!(
        width = config.grid.width,
        height = config.grid.height,
        particles = config.grid.particle_count,
        detectors = config.grid.detector_count,
        bpm = config.scheduler.bpm,
        "Starting pulse runner"
    );

    // Seeded runs derive the setup seed from the scheduler seed so they reproduce exactly
    let mut setup_rng = match config.scheduler.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)),
        None => ChaCha8Rng::from_entropy(),
    };
    let grid = Arc::new(RwLock::new(create_grid(&config.grid, &mut setup_rng)?));

    let (sink, mut rx) = sink::ChannelSink::bounded(config.scheduler.event_capacity);
    let dropped = sink.dropped_counter();
    let scheduler = scheduler::Scheduler::new(grid.clone(), sink, config.scheduler.clone())?;

    let idle = Duration::from_millis(config.scheduler.listen_idle_ms);
    let listener = tokio::spawn(async move {
        listener::listen_until_idle(&mut rx, idle, listener::log_trigger).await
    });

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match stop_signal().await {
            Ok(name) => {
                info!(signal = name, "Shutting down scheduler");
                signal_cancel.cancel();
            }
            Err(e) => error!("Cannot listen for stop signals: {}", e),
        }
    });

    match scheduler.run(cancel).await {
        report if report.cancelled => info!(ticks = report.ticks(), "Scheduler cancelled"),
        report => info!(
            ticks = report.ticks(),
            late_ticks = report.late_ticks,
            detector_hits = report.result.totals.detector_hits,
            "Scheduler finished"
        ),
    }

    match listener.await {
        Ok(summary) => info!(
            received = summary.received,
            reason = ?summary.reason,
            dropped = dropped.load(std::sync::atomic::Ordering::Relaxed),
            "Event listener finished"
        ),
        Err(e) => error!("Event listener failed: {}", e),
    }

    let final_grid = grid.read();
    info!(
        particles = final_grid.particle_count(),
        remaining_energy = final_grid.total_energy(),
        "Final grid"
    );

    Ok(())
}

fn load_config() -> Result<RunConfig> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => RunConfig::load(&path).with_context(|| format!("loading config from {}", path)),
        Err(_) => {
            let config = RunConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

/// Resolves with the name of the first stop signal delivered to the process
async fn stop_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            res = signal::ctrl_c() => res.map(|()| "interrupt"),
            _ = terminate.recv() => Ok("terminate"),
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.map(|()| "interrupt")
    }
}
