//! Tests for coordinator builders

use std::sync::Arc;

use prometheus_parking_sim::builders::{build_coordinator, CoordinatorBuilder};
use prometheus_parking_sim::config::ParkingConfig;
use prometheus_parking_sim::core::ParkingError;
use prometheus_parking_sim::infra::{EventLog, LogObserver};
use prometheus_parking_sim::runtime::TokioSpawner;

#[tokio::test]
async fn test_build_coordinator_from_config() {
    let cfg = ParkingConfig {
        capacity: 4,
        wait_timeout_ms: 100,
        hold: None,
    };
    let lot = build_coordinator(&cfg, TokioSpawner::current()).unwrap();
    assert_eq!(lot.limits().capacity, 4);
    assert_eq!(lot.stats().capacity, 4);
    assert_eq!(lot.observer_count(), 0);
}

#[tokio::test]
async fn test_builder_registers_observers() {
    let lot = CoordinatorBuilder::new(ParkingConfig::default())
        .capacity(2)
        .wait_timeout_ms(500)
        .without_hold()
        .observer(Arc::new(EventLog::new(10)))
        .observer(Arc::new(LogObserver))
        .build(TokioSpawner::current())
        .unwrap();

    assert_eq!(lot.observer_count(), 2);
    assert_eq!(lot.limits().hold, None);
    assert_eq!(lot.snapshot().pool.spots, vec![None, None]);
}

#[tokio::test]
async fn test_builder_rejects_invalid_config() {
    let err = CoordinatorBuilder::new(ParkingConfig::default())
        .capacity(0)
        .build(TokioSpawner::current())
        .unwrap_err();
    assert!(matches!(err, ParkingError::InvalidConfig(msg) if msg.contains("capacity")));
}
