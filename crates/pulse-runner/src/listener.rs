//! Consumer side of the collision event queue.

use pulse_grid::CollisionEvent;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No event arrived within the idle window
    Idle,
    /// Every sender was dropped
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenSummary {
    pub received: u64,
    pub reason: StopReason,
}

/// Drain events until the queue stays quiet for `idle` or closes.
pub async fn listen_until_idle<F>(
    rx: &mut mpsc::Receiver<CollisionEvent>,
    idle: Duration,
    mut on_event: F,
) -> ListenSummary
where
    F: FnMut(&CollisionEvent),
{
    let mut received = 0;

    let reason = loop {
        match timeout(idle, rx.recv()).await {
            Ok(Some(event)) => {
                received += 1;
                on_event(&event);
            }
            Ok(None) => break StopReason::Closed,
            Err(_) => break StopReason::Idle,
        }
    };

    debug!(received, ?reason, "Event listener stopped");
    ListenSummary { received, reason }
}

/// Default consumer: log each hit as a trigger for the downstream audio layer
pub fn log_trigger(event: &CollisionEvent) {
    info!(
        event = "detector_trigger",
        detector = event.detector.id,
        slice = event.particle.slice,
        energy_consumed = event.energy_consumed,
        remaining_energy = event.particle.energy,
        x = event.position.x,
        y = event.position.y,
        "Detector triggered"
    );
}
