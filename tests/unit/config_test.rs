//! Tests for configuration validation

use std::collections::HashMap;
use std::time::Duration;

use prometheus_parking_sim::config::{HoldConfig, ParkingConfig};

fn valid() -> ParkingConfig {
    ParkingConfig {
        capacity: 20,
        wait_timeout_ms: 10_000,
        hold: Some(HoldConfig {
            min_ms: 0,
            max_ms: 10_000,
        }),
    }
}

#[test]
fn test_default_matches_simulation() {
    assert_eq!(ParkingConfig::default(), valid());
    assert!(ParkingConfig::default().validate().is_ok());
}

#[test]
fn test_invalid_capacity() {
    let cfg = ParkingConfig {
        capacity: 0,
        ..valid()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_timeout() {
    let cfg = ParkingConfig {
        wait_timeout_ms: 0,
        ..valid()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_inverted_hold_bounds() {
    let cfg = ParkingConfig {
        hold: Some(HoldConfig {
            min_ms: 500,
            max_ms: 100,
        }),
        ..valid()
    };
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("hold.min_ms"));
}

#[test]
fn test_from_json() {
    let json = r#"{
        "capacity": 5,
        "wait_timeout_ms": 250,
        "hold": { "min_ms": 10, "max_ms": 20 }
    }"#;

    let cfg = ParkingConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.capacity, 5);
    let limits = cfg.limits();
    assert_eq!(limits.wait_timeout, Duration::from_millis(250));
    let hold = limits.hold.unwrap();
    assert_eq!(hold.min, Duration::from_millis(10));
    assert_eq!(hold.max, Duration::from_millis(20));
}

#[test]
fn test_from_json_without_hold() {
    let cfg = ParkingConfig::from_json_str(r#"{ "capacity": 1, "wait_timeout_ms": 50 }"#).unwrap();
    assert_eq!(cfg.hold, None);
}

#[test]
fn test_from_json_rejects_invalid() {
    assert!(ParkingConfig::from_json_str(r#"{ "capacity": 0, "wait_timeout_ms": 50 }"#).is_err());
    assert!(ParkingConfig::from_json_str("not json").is_err());
}

#[test]
fn test_from_lookup_overrides_defaults() {
    let vars: HashMap<&str, &str> = [
        ("PARKING_CAPACITY", "3"),
        ("PARKING_WAIT_TIMEOUT_MS", "75"),
        ("PARKING_HOLD_MIN_MS", "5"),
        ("PARKING_HOLD_MAX_MS", "9"),
    ]
    .into_iter()
    .collect();

    let cfg = ParkingConfig::from_lookup(|k| vars.get(k).map(|v| (*v).to_string())).unwrap();
    assert_eq!(
        cfg,
        ParkingConfig {
            capacity: 3,
            wait_timeout_ms: 75,
            hold: Some(HoldConfig { min_ms: 5, max_ms: 9 }),
        }
    );
}

#[test]
fn test_from_lookup_disables_hold() {
    let cfg = ParkingConfig::from_lookup(|k| (k == "PARKING_HOLD_MAX_MS").then(|| "none".to_string()))
        .unwrap();
    assert_eq!(cfg.hold, None);
    assert_eq!(cfg.capacity, 20);
}

#[test]
fn test_from_lookup_rejects_garbage() {
    let err = ParkingConfig::from_lookup(|k| (k == "PARKING_CAPACITY").then(|| "lots".to_string()))
        .unwrap_err();
    assert!(err.starts_with("PARKING_CAPACITY"));
}
