//! Tests for error types

use prometheus_parking_sim::core::{ParkingError, VehicleState};

#[test]
fn test_invalid_spot_error() {
    let err = ParkingError::InvalidSpot {
        vehicle: 4,
        spot: None,
    };
    assert_eq!(format!("{}", err), "vehicle 4 holds no valid spot (spot: None)");
}

#[test]
fn test_allocation_inconsistency_error() {
    let err = ParkingError::AllocationInconsistency("spot 0 already held".to_string());
    assert_eq!(format!("{}", err), "allocation inconsistency: spot 0 already held");
}

#[test]
fn test_invalid_transition_error() {
    let err = ParkingError::InvalidTransition {
        vehicle: 2,
        from: VehicleState::TimedOut,
        to: VehicleState::Admitted,
    };
    assert_eq!(format!("{}", err), "vehicle 2 cannot move from TimedOut to Admitted");
}

#[test]
fn test_duplicate_request_error() {
    let err = ParkingError::DuplicateRequest(9);
    assert_eq!(format!("{}", err), "vehicle 9 is already waiting or parked");
}

#[test]
fn test_invalid_config_error() {
    let err = ParkingError::InvalidConfig("capacity must be greater than 0".to_string());
    assert_eq!(format!("{}", err), "invalid configuration: capacity must be greater than 0");
}
