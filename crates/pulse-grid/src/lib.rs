//! Grid simulation engine.
//!
//! Particles travel across a bounded 2D grid, bounce off its boundary, and
//! collide with each other and with stationary detectors. Every tick is a pure
//! transform from one grid snapshot to the next:
//!
//! ```text
//! grid' = advect(resolve_collisions(reflect_boundaries(grid)))
//! ```
//!
//! Particle/detector interactions are reported as [`CollisionEvent`]s through an
//! [`EventSink`] supplied by the caller.

pub mod object;
pub mod grid;
pub mod boundary;
pub mod collision;
pub mod advection;
pub mod events;
pub mod tick;
pub mod simulation;

pub use object::{Detector, GridObject, Particle};
pub use grid::{create_grid, Cell, Grid};
pub use boundary::{reflect_boundaries, BoundaryRegion};
pub use collision::{resolve_collisions, CollisionStats};
pub use advection::advect;
pub use events::{CollisionEvent, Delivery, EventSink, NullSink};
pub use tick::{tick, TickOutcome};
pub use simulation::{Simulation, SimulationResult};
