//! FIFO wait queue of vehicles blocked by a full lot.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::core::vehicle::{Vehicle, VehicleId};

/// Ordered holding area for vehicles waiting on a spot.
///
/// Insertion order is preserved and an id appears at most once. The queue
/// itself is not synchronized; the coordinator keeps it behind its own mutex,
/// always acquired after the pool lock.
#[derive(Debug, Default)]
pub struct WaitQueue {
    entries: VecDeque<Arc<Vehicle>>,
}

impl WaitQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `vehicle`. Returns `false` (and changes nothing) if its id is already queued.
    pub fn push(&mut self, vehicle: Arc<Vehicle>) -> bool {
        if self.contains(vehicle.id()) {
            return false;
        }
        self.entries.push_back(vehicle);
        true
    }

    /// Whether `id` is waiting.
    pub fn contains(&self, id: VehicleId) -> bool {
        self.entries.iter().any(|v| v.id() == id)
    }

    /// Remove `id` wherever it sits. Removing an absent id is a no-op returning `None`.
    pub fn remove(&mut self, id: VehicleId) -> Option<Arc<Vehicle>> {
        let index = self.entries.iter().position(|v| v.id() == id)?;
        self.entries.remove(index)
    }

    /// Id at the front of the queue.
    pub fn head(&self) -> Option<VehicleId> {
        self.entries.front().map(|v| v.id())
    }

    /// Whether `id` is first in line.
    pub fn is_head(&self, id: VehicleId) -> bool {
        self.head() == Some(id)
    }

    /// Number of waiting vehicles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nobody is waiting.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Waiting ids in queue order.
    pub fn ids(&self) -> Vec<VehicleId> {
        self.entries.iter().map(|v| v.id()).collect()
    }

    /// Remove and return every waiting vehicle, front first.
    pub fn drain(&mut self) -> Vec<Arc<Vehicle>> {
        self.entries.drain(..).collect()
    }
}
