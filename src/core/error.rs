//! Error types for admission and release operations.

use thiserror::Error;

use crate::core::vehicle::{VehicleId, VehicleState};

/// Errors produced by the lot, its wait queue and the admission coordinator.
///
/// Timeouts and cancellations are not errors: they are terminal
/// [`VehicleState`]s reported through events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParkingError {
    /// Exit requested for a vehicle that does not hold a valid spot.
    #[error("vehicle {vehicle} holds no valid spot (spot: {spot:?})")]
    InvalidSpot {
        /// Vehicle that asked to leave.
        vehicle: VehicleId,
        /// Spot the vehicle claimed to hold.
        spot: Option<usize>,
    },
    /// Lot bookkeeping contradicts itself; a contract violation, never ignored.
    #[error("allocation inconsistency: {0}")]
    AllocationInconsistency(String),
    /// Vehicle lifecycle state machine was asked for an illegal move.
    #[error("vehicle {vehicle} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        /// Vehicle whose state was touched.
        vehicle: VehicleId,
        /// State it was in.
        from: VehicleState,
        /// State that was requested.
        to: VehicleState,
    },
    /// A vehicle with the same id is already waiting or parked.
    #[error("vehicle {0} is already waiting or parked")]
    DuplicateRequest(VehicleId),
    /// Configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
