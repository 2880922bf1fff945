//! Pairwise reactions between objects sharing a cell.

use crate::events::{CollisionEvent, Delivery, EventSink};
use crate::grid::{Cell, Grid};
use crate::object::{GridObject, Particle};
use pulse_core::{Direction, Position};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Counters accumulated while resolving collisions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionStats {
    /// Particle reactions against a detector
    pub detector_hits: u64,
    /// Particle reactions against another particle
    pub particle_hits: u64,
    /// Total energy removed from particles
    pub energy_consumed: u64,
    pub events_emitted: u64,
    pub events_dropped: u64,
}

impl CollisionStats {
    pub fn merge(&mut self, other: &CollisionStats) {
        self.detector_hits += other.detector_hits;
        self.particle_hits += other.particle_hits;
        self.energy_consumed += other.energy_consumed;
        self.events_emitted += other.events_emitted;
        self.events_dropped += other.events_dropped;
    }
}

/// Uniform draw from `[0, bound)`, or 0 when the range is empty
fn draw_below<R: Rng + ?Sized>(rng: &mut R, bound: u32) -> u32 {
    if bound == 0 {
        0
    } else {
        rng.gen_range(0..bound)
    }
}

/// Resolve one cell.
///
/// Each particle, in cell order, reacts against every other occupant in cell
/// order. "Other" is decided by slot index, so two particles with identical
/// fields still see each other. Effects accumulate across a reactor's
/// reactions; the occupants it reacts against are the cell as it was before
/// resolution began.
pub fn resolve_cell<R, S>(pos: Position, cell: &Cell, rng: &mut R, sink: &mut S) -> (Cell, CollisionStats)
where
    R: Rng + ?Sized,
    S: EventSink + ?Sized,
{
    let mut stats = CollisionStats::default();
    if cell.len() < 2 {
        return (cell.clone(), stats);
    }

    let resolved = cell
        .iter()
        .enumerate()
        .map(|(index, object)| match object {
            GridObject::Detector(d) => GridObject::Detector(*d),
            GridObject::Particle(p) => {
                let mut reactor = *p;
                for (_, other) in cell.iter().enumerate().filter(|(j, _)| *j != index) {
                    react(&mut reactor, other, pos, &mut *rng, &mut *sink, &mut stats);
                }
                GridObject::Particle(reactor)
            }
        })
        .collect();

    (resolved, stats)
}

fn react<R, S>(
    reactor: &mut Particle,
    other: &GridObject,
    pos: Position,
    rng: &mut R,
    sink: &mut S,
    stats: &mut CollisionStats,
) where
    R: Rng + ?Sized,
    S: EventSink + ?Sized,
{
    match other {
        GridObject::Detector(detector) => {
            let used = draw_below(rng, reactor.energy);
            reactor.consume_energy(used);
            stats.detector_hits += 1;
            stats.energy_consumed += used as u64;

            let event = CollisionEvent {
                particle: *reactor,
                detector: *detector,
                energy_consumed: used,
                position: pos,
            };
            match sink.emit(event) {
                Delivery::Delivered => stats.events_emitted += 1,
                Delivery::Dropped => stats.events_dropped += 1,
            }
            trace!(
                slice = reactor.slice,
                detector = detector.id,
                used,
                remaining = reactor.energy,
                "Particle struck detector"
            );
        }
        GridObject::Particle(_) => {
            let used = draw_below(rng, reactor.energy / 10);
            reactor.consume_energy(used);
            reactor.direction = Direction::random(rng);
            stats.particle_hits += 1;
            stats.energy_consumed += used as u64;
        }
    }
}

/// Second pass of a tick: resolve every cell, row-major.
pub fn resolve_collisions<R, S>(grid: &Grid, rng: &mut R, sink: &mut S) -> (Grid, CollisionStats)
where
    R: Rng + ?Sized,
    S: EventSink + ?Sized,
{
    let mut stats = CollisionStats::default();
    let resolved = grid.map_cells(|pos, cell| {
        let (cell, cell_stats) = resolve_cell(pos, cell, &mut *rng, &mut *sink);
        stats.merge(&cell_stats);
        cell
    });
    (resolved, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Detector;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    #[test]
    fn test_single_occupant_is_noop() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut events: Vec<CollisionEvent> = Vec::new();
        let cell: Cell = vec![Particle::new(0, Direction::North, 100).into()];

        let (out, stats) = resolve_cell(Position::new(0, 0), &cell, &mut rng, &mut events);
        assert_eq!(out, cell);
        assert_eq!(stats, CollisionStats::default());
        assert!(events.is_empty());
    }

    #[test]
    fn test_particle_hits_detector() {
        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut events: Vec<CollisionEvent> = Vec::new();
            let cell: Cell = vec![
                Particle::new(0, Direction::East, 100).into(),
                Detector::new(7).into(),
            ];

            let (out, stats) = resolve_cell(Position::new(1, 2), &cell, &mut rng, &mut events);

            assert_eq!(events.len(), 1);
            let event = events[0];
            assert!(event.energy_consumed < 100);
            assert_eq!(event.detector, Detector::new(7));
            assert_eq!(event.position, Position::new(1, 2));

            let particle = out[0].as_particle().unwrap();
            assert_eq!(particle.energy, 100 - event.energy_consumed);
            assert_eq!(particle.direction, Direction::East);
            assert_eq!(event.particle, *particle);
            assert_eq!(out[1], Detector::new(7).into());

            assert_eq!(stats.detector_hits, 1);
            assert_eq!(stats.events_emitted, 1);
            assert_eq!(stats.energy_consumed, event.energy_consumed as u64);
        }
    }

    #[test]
    fn test_spent_particle_consumes_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut events: Vec<CollisionEvent> = Vec::new();
        let cell: Cell = vec![
            Particle::new(0, Direction::East, 0).into(),
            Detector::new(0).into(),
        ];

        resolve_cell(Position::new(0, 0), &cell, &mut rng, &mut events);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].energy_consumed, 0);
        assert_eq!(events[0].particle.energy, 0);
    }

    #[test]
    fn test_two_particles_lose_little_and_turn() {
        let mut seen = HashSet::new();
        for seed in 0..400 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut events: Vec<CollisionEvent> = Vec::new();
            let cell: Cell = vec![
                Particle::new(0, Direction::North, 50).into(),
                Particle::new(1, Direction::South, 50).into(),
            ];

            let (out, stats) = resolve_cell(Position::new(3, 3), &cell, &mut rng, &mut events);

            assert!(events.is_empty());
            assert_eq!(stats.particle_hits, 2);
            for object in &out {
                let p = object.as_particle().unwrap();
                assert!(p.energy > 45 && p.energy <= 50);
                seen.insert(p.direction);
            }
        }
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn test_low_energy_particles_keep_energy() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut events: Vec<CollisionEvent> = Vec::new();
        let cell: Cell = vec![
            Particle::new(0, Direction::North, 9).into(),
            Particle::new(1, Direction::North, 9).into(),
        ];

        let (out, _) = resolve_cell(Position::new(0, 0), &cell, &mut rng, &mut events);
        assert!(out.iter().all(|o| o.as_particle().unwrap().energy == 9));
    }

    #[test]
    fn test_identical_particles_still_react() {
        // Field-equal particles must not exclude each other from the "others" set
        let twin = Particle::new(0, Direction::West, 100);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut events: Vec<CollisionEvent> = Vec::new();
        let cell: Cell = vec![twin.into(), twin.into()];

        let (_, stats) = resolve_cell(Position::new(0, 0), &cell, &mut rng, &mut events);
        assert_eq!(stats.particle_hits, 2);
    }

    #[test]
    fn test_reactor_accumulates_against_every_other() {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let mut events: Vec<CollisionEvent> = Vec::new();
        let cell: Cell = vec![
            Particle::new(0, Direction::North, 100).into(),
            Detector::new(0).into(),
            Detector::new(1).into(),
            Particle::new(1, Direction::South, 100).into(),
        ];

        let (out, stats) = resolve_cell(Position::new(0, 0), &cell, &mut rng, &mut events);

        // Two particles, each against two detectors and one particle
        assert_eq!(stats.detector_hits, 4);
        assert_eq!(stats.particle_hits, 2);
        assert_eq!(events.len(), 4);

        // Events for one reactor carry its running energy
        let first: Vec<_> = events.iter().filter(|e| e.particle.slice == 0).collect();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].detector.id, 0);
        assert_eq!(first[1].detector.id, 1);
        assert_eq!(
            first[1].particle.energy,
            first[0].particle.energy - first[1].energy_consumed
        );

        // Detectors stay in their slots
        assert!(out[1].is_detector() && out[2].is_detector());

        let total_before = 200u64;
        let total_after: u64 = out
            .iter()
            .filter_map(GridObject::as_particle)
            .map(|p| p.energy as u64)
            .sum();
        assert_eq!(total_before - total_after, stats.energy_consumed);
    }

    #[test]
    fn test_dropped_events_are_counted() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut sink = crate::events::NullSink;
        let cell: Cell = vec![
            Particle::new(0, Direction::East, 100).into(),
            Detector::new(0).into(),
        ];

        let (out, stats) = resolve_cell(Position::new(0, 0), &cell, &mut rng, &mut sink);
        assert_eq!(stats.events_dropped, 1);
        assert_eq!(stats.events_emitted, 0);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let mut grid = Grid::new(3, 3).unwrap();
        let pos = Position::new(1, 1);
        grid.insert(pos, Particle::new(0, Direction::North, 100)).unwrap();
        grid.insert(pos, Particle::new(1, Direction::East, 80)).unwrap();
        grid.insert(pos, Detector::new(0)).unwrap();

        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut events: Vec<CollisionEvent> = Vec::new();
            let (out, _) = resolve_collisions(&grid, &mut rng, &mut events);
            (out, events)
        };
        assert_eq!(run(21), run(21));
    }
}
