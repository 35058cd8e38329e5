//! Tests for runtime adapters

use std::time::Duration;

use prometheus_parking_sim::builders::CoordinatorBuilder;
use prometheus_parking_sim::config::ParkingConfig;
use prometheus_parking_sim::core::Spawn;
use prometheus_parking_sim::runtime::{ArrivalGenerator, TokioSpawner};

#[tokio::test]
async fn test_tokio_spawner_runs_future() {
    let spawner = TokioSpawner::current();
    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        let _ = tx.send(42);
    });
    assert_eq!(rx.await.unwrap(), 42);
}

#[test]
fn test_try_current_outside_runtime() {
    assert!(TokioSpawner::try_current().is_none());
}

#[test]
fn test_dedicated_runtime() {
    let (runtime, spawner) = TokioSpawner::with_worker_threads(Some(2)).unwrap();
    let (tx, rx) = std::sync::mpsc::channel();
    spawner.spawn(async move {
        tx.send("ran").unwrap();
    });
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "ran");
    drop(runtime);
}

#[tokio::test(start_paused = true)]
async fn test_generator_admits_everyone_when_lot_is_large() {
    let lot = CoordinatorBuilder::new(ParkingConfig::default())
        .capacity(10)
        .without_hold()
        .build(TokioSpawner::current())
        .unwrap();

    let report = ArrivalGenerator {
        count: 10,
        first_id: 1,
        min_gap: Duration::from_millis(1),
        max_gap: Duration::from_millis(3),
    }
    .run(&lot)
    .await;

    assert_eq!(report.admitted, 10);
    assert_eq!(report.total(), 10);
    assert_eq!(lot.stats().occupied, 10);
}
