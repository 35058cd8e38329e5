//! Spot accounting for the lot.
//!
//! The pool owns the spot map behind a single `parking_lot::Mutex`. Callers
//! that need several operations to be atomic (find a free spot, then assign
//! it) hold the [`Lot`] guard returned by [`ResourcePool::lock`] for the whole
//! sequence; that shared critical section is what keeps two requesters from
//! landing on the same spot.

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

use crate::core::vehicle::VehicleId;
use crate::core::ParkingError;

/// Spot map and occupancy counter. Only reachable through the pool lock.
#[derive(Debug)]
pub struct Lot {
    spots: Vec<Option<VehicleId>>,
    occupied: usize,
}

/// Point-in-time copy of the spot map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Number of spots.
    pub capacity: usize,
    /// Number of occupied spots.
    pub occupied: usize,
    /// Occupant of each spot, by index.
    pub spots: Vec<Option<VehicleId>>,
}

impl Lot {
    fn new(capacity: usize) -> Self {
        Self {
            spots: vec![None; capacity],
            occupied: 0,
        }
    }

    /// Number of spots.
    pub fn capacity(&self) -> usize {
        self.spots.len()
    }

    /// Number of occupied spots.
    pub const fn occupied(&self) -> usize {
        self.occupied
    }

    /// `occupied == capacity`.
    pub fn is_full(&self) -> bool {
        self.occupied >= self.spots.len()
    }

    /// Lowest-index free spot. Does not reserve it.
    pub fn find_free_spot(&self) -> Option<usize> {
        self.spots.iter().position(Option::is_none)
    }

    /// Spot currently held by `vehicle`, if any.
    pub fn spot_of(&self, vehicle: VehicleId) -> Option<usize> {
        self.spots.iter().position(|s| *s == Some(vehicle))
    }

    /// Whether `spot` is in bounds and occupied by `vehicle`.
    pub fn is_parked(&self, vehicle: VehicleId, spot: Option<usize>) -> bool {
        spot.and_then(|s| self.spots.get(s))
            .is_some_and(|occupant| *occupant == Some(vehicle))
    }

    /// Mark `spot` as occupied by `vehicle`.
    ///
    /// Fails without side effects when the spot is out of range or taken.
    pub fn assign(&mut self, vehicle: VehicleId, spot: usize) -> Result<(), ParkingError> {
        let Some(slot) = self.spots.get_mut(spot) else {
            return Err(ParkingError::AllocationInconsistency(format!(
                "spot {spot} out of range for vehicle {vehicle}"
            )));
        };
        if let Some(other) = *slot {
            return Err(ParkingError::AllocationInconsistency(format!(
                "spot {spot} already held by vehicle {other}, requested by {vehicle}"
            )));
        }
        *slot = Some(vehicle);
        self.occupied += 1;
        Ok(())
    }

    /// Free the spot `vehicle` holds. Returns the freed index.
    ///
    /// A vehicle without a valid assignment (never parked, already left,
    /// stale index) is rejected with [`ParkingError::InvalidSpot`].
    pub fn release(&mut self, vehicle: VehicleId, spot: Option<usize>) -> Result<usize, ParkingError> {
        match spot {
            Some(index) if self.is_parked(vehicle, spot) => {
                self.spots[index] = None;
                self.occupied -= 1;
                Ok(index)
            }
            _ => Err(ParkingError::InvalidSpot { vehicle, spot }),
        }
    }

    /// Verify `occupied <= capacity` and that the counter matches the map.
    pub fn check_invariants(&self) -> Result<(), ParkingError> {
        let counted = self.spots.iter().filter(|s| s.is_some()).count();
        if counted != self.occupied || self.occupied > self.spots.len() {
            return Err(ParkingError::AllocationInconsistency(format!(
                "occupied counter {} but {} spots taken of {}",
                self.occupied,
                counted,
                self.spots.len()
            )));
        }
        Ok(())
    }

    /// Copy the spot map.
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            capacity: self.spots.len(),
            occupied: self.occupied,
            spots: self.spots.clone(),
        }
    }
}

/// Fixed-capacity pool of spots guarded by one mutex.
#[derive(Debug)]
pub struct ResourcePool {
    capacity: usize,
    lot: Mutex<Lot>,
}

impl ResourcePool {
    /// Create a pool with `capacity` free spots. Capacity must be positive.
    pub fn new(capacity: usize) -> Result<Self, ParkingError> {
        if capacity == 0 {
            return Err(ParkingError::InvalidConfig(
                "capacity must be greater than 0".into(),
            ));
        }
        Ok(Self {
            capacity,
            lot: Mutex::new(Lot::new(capacity)),
        })
    }

    /// Number of spots, fixed at construction.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Acquire the pool lock. First lock in the process-wide order.
    pub fn lock(&self) -> MutexGuard<'_, Lot> {
        self.lot.lock()
    }

    /// Current occupancy.
    pub fn occupied(&self) -> usize {
        self.lock().occupied()
    }

    /// Whether every spot is taken.
    pub fn is_full(&self) -> bool {
        self.lock().is_full()
    }

    /// Lowest-index free spot.
    pub fn find_free_spot(&self) -> Option<usize> {
        self.lock().find_free_spot()
    }

    /// Whether `vehicle` occupies `spot`.
    pub fn is_parked(&self, vehicle: VehicleId, spot: Option<usize>) -> bool {
        self.lock().is_parked(vehicle, spot)
    }

    /// Copy the spot map.
    pub fn snapshot(&self) -> PoolSnapshot {
        self.lock().snapshot()
    }
}
