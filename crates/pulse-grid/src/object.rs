//! Objects that occupy grid cells.

use pulse_core::Direction;
use serde::{Deserialize, Serialize};

/// A mobile object carrying a heading and a pool of energy.
///
/// `slice` is assigned once at creation and identifies the particle across
/// ticks as it moves between cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Particle {
    pub slice: u32,
    pub direction: Direction,
    pub energy: u32,
}

impl Particle {
    pub fn new(slice: u32, direction: Direction, energy: u32) -> Self {
        Self {
            slice,
            direction,
            energy,
        }
    }

    /// Remove up to `amount` energy and return how much was actually taken.
    pub fn consume_energy(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.energy);
        self.energy -= taken;
        taken
    }

    pub fn is_spent(&self) -> bool {
        self.energy == 0
    }
}

/// A stationary target that absorbs energy from particles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Detector {
    pub id: u32,
}

impl Detector {
    pub fn new(id: u32) -> Self {
        Self { id }
    }
}

/// Anything that can sit in a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridObject {
    Particle(Particle),
    Detector(Detector),
}

impl GridObject {
    pub fn as_particle(&self) -> Option<&Particle> {
        match self {
            GridObject::Particle(p) => Some(p),
            GridObject::Detector(_) => None,
        }
    }

    pub fn as_detector(&self) -> Option<&Detector> {
        match self {
            GridObject::Detector(d) => Some(d),
            GridObject::Particle(_) => None,
        }
    }

    pub fn is_detector(&self) -> bool {
        matches!(self, GridObject::Detector(_))
    }
}

impl From<Particle> for GridObject {
    fn from(particle: Particle) -> Self {
        GridObject::Particle(particle)
    }
}

impl From<Detector> for GridObject {
    fn from(detector: Detector) -> Self {
        GridObject::Detector(detector)
    }
}
