//! Collision events and the sink they are handed to.

use crate::object::{Detector, Particle};
use pulse_core::Position;
use serde::{Deserialize, Serialize};

/// A particle/detector interaction.
///
/// `particle` is the reactor after the energy was deducted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub particle: Particle,
    pub detector: Detector,
    pub energy_consumed: u32,
    pub position: Position,
}

/// What happened to an emitted event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Dropped,
}

/// Destination for collision events.
///
/// Emission must never block the tick. Capacity and the drop policy belong
/// to the implementation; the engine only counts drops.
pub trait EventSink {
    fn emit(&mut self, event: CollisionEvent) -> Delivery;
}

impl EventSink for Vec<CollisionEvent> {
    fn emit(&mut self, event: CollisionEvent) -> Delivery {
        self.push(event);
        Delivery::Delivered
    }
}

/// Discards every event, counting each as dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: CollisionEvent) -> Delivery {
        Delivery::Dropped
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: CollisionEvent) -> Delivery {
        (**self).emit(event)
    }
}
