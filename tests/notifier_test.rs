//! Integration tests for event fan-out.
//!
//! Observers are isolated from each other and from the publisher: a stalled,
//! failing or panicking observer must not hold up anything else.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use prometheus_parking_sim::core::{
    AppResult, Event, EventKind, EventNotifier, Observer, VehicleSnapshot, VehicleState,
};
use prometheus_parking_sim::infra::{ChannelObserver, EventLog, LogObserver};
use prometheus_parking_sim::runtime::TokioSpawner;
use tokio::sync::Semaphore;

fn snapshot(id: u64) -> VehicleSnapshot {
    VehicleSnapshot {
        id,
        spot: None,
        state: VehicleState::Requested,
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Observer that blocks on a gate before recording each event.
struct GatedObserver {
    gate: Arc<Semaphore>,
    log: EventLog,
}

#[async_trait]
impl Observer for GatedObserver {
    async fn update(&self, event: &Event) -> AppResult<()> {
        self.gate.acquire().await?.forget();
        self.log.record(event.clone());
        Ok(())
    }
}

/// Observer that always fails but counts how often it was called.
struct FailingObserver {
    calls: AtomicUsize,
}

#[async_trait]
impl Observer for FailingObserver {
    async fn update(&self, _event: &Event) -> AppResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("render surface unavailable")
    }
}

struct PanickingObserver;

#[async_trait]
impl Observer for PanickingObserver {
    async fn update(&self, _event: &Event) -> AppResult<()> {
        panic!("observer bug");
    }
}

#[tokio::test(start_paused = true)]
async fn test_events_reach_observer_in_publish_order() {
    let notifier = EventNotifier::new(TokioSpawner::current());
    let log = Arc::new(EventLog::new(1_000));
    notifier.register(log.clone());

    for id in 0..100 {
        notifier.publish(snapshot(id), EventKind::Arrived, None);
    }
    settle().await;

    let sequences: Vec<u64> = log.events().iter().map(|e| e.sequence).collect();
    assert_eq!(sequences, (0..100).collect::<Vec<_>>());
    assert_eq!(notifier.published(), 100);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_observer_does_not_block_others() {
    let notifier = EventNotifier::new(TokioSpawner::current());
    let gate = Arc::new(Semaphore::new(0));
    let slow = Arc::new(GatedObserver {
        gate: gate.clone(),
        log: EventLog::new(100),
    });
    let fast = Arc::new(EventLog::new(100));
    notifier.register(slow.clone());
    notifier.register(fast.clone());

    for id in 0..10 {
        notifier.publish(snapshot(id), EventKind::Waiting, None);
    }
    settle().await;

    assert_eq!(fast.len(), 10);
    assert!(slow.log.is_empty());

    gate.add_permits(10);
    settle().await;
    let ids: Vec<u64> = slow.log.events().iter().map(|e| e.vehicle.id).collect();
    assert_eq!(ids, (0..10).collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn test_failing_observer_keeps_receiving() {
    let notifier = EventNotifier::new(TokioSpawner::current());
    let failing = Arc::new(FailingObserver {
        calls: AtomicUsize::new(0),
    });
    let log = Arc::new(EventLog::new(100));
    notifier.register(failing.clone());
    notifier.register(log.clone());

    for id in 0..5 {
        notifier.publish(snapshot(id), EventKind::Parked, Some(0));
    }
    settle().await;

    assert_eq!(failing.calls.load(Ordering::SeqCst), 5);
    assert_eq!(log.len(), 5);
    assert_eq!(notifier.observer_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_observer_is_dropped() {
    let notifier = EventNotifier::new(TokioSpawner::current());
    let log = Arc::new(EventLog::new(100));
    notifier.register(Arc::new(PanickingObserver));
    notifier.register(log.clone());

    notifier.publish(snapshot(1), EventKind::Arrived, None);
    settle().await;
    notifier.publish(snapshot(2), EventKind::Arrived, None);
    settle().await;

    assert_eq!(notifier.observer_count(), 1);
    assert_eq!(log.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unregister_stops_delivery() {
    let notifier = EventNotifier::new(TokioSpawner::current());
    let log = Arc::new(EventLog::new(100));
    let id = notifier.register(log.clone());

    notifier.publish(snapshot(1), EventKind::Arrived, None);
    assert!(notifier.unregister(id));
    assert!(!notifier.unregister(id));
    notifier.publish(snapshot(2), EventKind::Arrived, None);
    settle().await;

    // Enqueued before unregistering, so still delivered.
    assert_eq!(log.kinds_for(1), vec![EventKind::Arrived]);
    assert!(log.for_vehicle(2).is_empty());
    assert_eq!(notifier.observer_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_channel_observer_forwards_events() {
    let notifier = EventNotifier::new(TokioSpawner::current());
    let (observer, mut rx) = ChannelObserver::channel();
    notifier.register(Arc::new(observer));
    notifier.register(Arc::new(LogObserver));

    notifier.publish(snapshot(4), EventKind::Exiting, Some(2));
    let event = rx.recv().await.unwrap();
    assert_eq!(event.vehicle.id, 4);
    assert_eq!(event.kind, EventKind::Exiting);
    assert_eq!(event.spot, Some(2));
}

#[test]
fn test_event_json_shape() {
    let event = Event {
        sequence: 7,
        vehicle: VehicleSnapshot {
            id: 3,
            spot: Some(1),
            state: VehicleState::Admitted,
        },
        kind: EventKind::Parked,
        spot: Some(1),
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["kind"], "parked");
    assert_eq!(json["vehicle"]["state"], "admitted");
    assert_eq!(json["spot"], 1);

    let back: Event = serde_json::from_value(json).unwrap();
    assert_eq!(back, event);
}
