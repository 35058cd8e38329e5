//! Vehicles (requesters) and their lifecycle state machine.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::core::ParkingError;

/// Unique vehicle identifier.
pub type VehicleId = u64;

/// Lifecycle state of a vehicle.
///
/// `Requested -> {Admitted | Queued}`, `Queued -> {Admitted | TimedOut | Cancelled}`,
/// `Admitted -> Released`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleState {
    /// Arrived, no decision yet.
    Requested,
    /// Waiting for a free spot.
    Queued,
    /// Holding a spot.
    Admitted,
    /// Left its spot.
    Released,
    /// Gave up waiting after the configured timeout.
    TimedOut,
    /// Cancellation signal fired while waiting.
    Cancelled,
}

impl VehicleState {
    /// Whether no further transition is possible.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Released | Self::TimedOut | Self::Cancelled)
    }

    /// Whether `self -> next` is a legal move.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Requested, Self::Admitted | Self::Queued)
                | (Self::Queued, Self::Admitted | Self::TimedOut | Self::Cancelled)
                | (Self::Admitted, Self::Released)
        )
    }
}

/// Immutable copy of a vehicle's observable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    /// Vehicle identifier.
    pub id: VehicleId,
    /// Assigned spot, `None` when unassigned.
    pub spot: Option<usize>,
    /// Lifecycle state at the time of the snapshot.
    pub state: VehicleState,
}

#[derive(Debug)]
struct VehicleRecord {
    spot: Option<usize>,
    state: VehicleState,
}

/// A requester competing for one spot.
///
/// Shared as `Arc<Vehicle>` between the caller of
/// [`Coordinator::enter`](crate::core::Coordinator::enter), the timeout
/// watcher and the holding timer. Only the coordinator mutates the record.
#[derive(Debug)]
pub struct Vehicle {
    id: VehicleId,
    cancel: CancellationToken,
    record: Mutex<VehicleRecord>,
}

impl Vehicle {
    /// Create a vehicle in the `Requested` state with a fresh cancellation signal.
    pub fn new(id: VehicleId) -> Self {
        Self::with_cancellation(id, CancellationToken::new())
    }

    /// Create a vehicle observing an existing cancellation token.
    pub fn with_cancellation(id: VehicleId, cancel: CancellationToken) -> Self {
        Self {
            id,
            cancel,
            record: Mutex::new(VehicleRecord {
                spot: None,
                state: VehicleState::Requested,
            }),
        }
    }

    /// Vehicle identifier.
    pub const fn id(&self) -> VehicleId {
        self.id
    }

    /// Currently assigned spot.
    pub fn spot(&self) -> Option<usize> {
        self.record.lock().spot
    }

    /// Current lifecycle state.
    pub fn state(&self) -> VehicleState {
        self.record.lock().state
    }

    /// Consistent copy of id, spot and state.
    pub fn snapshot(&self) -> VehicleSnapshot {
        let record = self.record.lock();
        VehicleSnapshot {
            id: self.id,
            spot: record.spot,
            state: record.state,
        }
    }

    /// Fire the cancellation signal. Only has an effect while queued.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Clone of the cancellation token, for requesters that cancel from elsewhere.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub(crate) fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    /// Move to `next`, assigning or clearing the spot as the state requires.
    pub(crate) fn transition(
        &self,
        next: VehicleState,
        spot: Option<usize>,
    ) -> Result<(), ParkingError> {
        let mut record = self.record.lock();
        if !record.state.can_transition_to(next) {
            return Err(ParkingError::InvalidTransition {
                vehicle: self.id,
                from: record.state,
                to: next,
            });
        }
        record.state = next;
        record.spot = spot;
        Ok(())
    }
}
