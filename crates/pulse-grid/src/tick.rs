//! One full grid transition.

use crate::advection::advect;
use crate::boundary::reflect_boundaries;
use crate::collision::{resolve_collisions, CollisionStats};
use crate::events::EventSink;
use crate::grid::Grid;
use rand::Rng;

/// The grid after a tick plus what happened during it
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub grid: Grid,
    pub stats: CollisionStats,
}

/// Reflect, resolve, then advect. The input grid is left untouched.
pub fn tick<R, S>(grid: &Grid, rng: &mut R, sink: &mut S) -> TickOutcome
where
    R: Rng + ?Sized,
    S: EventSink + ?Sized,
{
    let reflected = reflect_boundaries(grid);
    let (resolved, stats) = resolve_collisions(&reflected, rng, sink);
    TickOutcome {
        grid: advect(&resolved),
        stats,
    }
}
