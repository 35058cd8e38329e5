//! Tests for stock observers

use prometheus_parking_sim::core::{Event, EventKind, Observer, VehicleSnapshot, VehicleState};
use prometheus_parking_sim::infra::{ChannelObserver, EventLog};

fn event(sequence: u64, id: u64, kind: EventKind) -> Event {
    Event {
        sequence,
        vehicle: VehicleSnapshot {
            id,
            spot: None,
            state: VehicleState::Queued,
        },
        kind,
        spot: None,
    }
}

#[test]
fn test_event_log_records() {
    let log = EventLog::new(10);
    assert!(log.is_empty());

    log.record(event(0, 1, EventKind::Arrived));
    log.record(event(1, 2, EventKind::Arrived));
    log.record(event(2, 1, EventKind::Waiting));

    assert_eq!(log.len(), 3);
    assert_eq!(log.kinds_for(1), vec![EventKind::Arrived, EventKind::Waiting]);
    assert_eq!(log.for_vehicle(2).len(), 1);
}

#[test]
fn test_event_log_overflow() {
    let log = EventLog::new(2);

    log.record(event(0, 1, EventKind::Arrived));
    log.record(event(1, 2, EventKind::Arrived));
    log.record(event(2, 3, EventKind::Arrived));

    let events = log.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].sequence, 1); // First one popped
    assert_eq!(events[1].sequence, 2);
}

#[tokio::test]
async fn test_event_log_as_observer() {
    let log = EventLog::new(10);
    log.update(&event(5, 7, EventKind::TimedOut)).await.unwrap();
    assert_eq!(log.events()[0].kind, EventKind::TimedOut);
}

#[tokio::test]
async fn test_channel_observer_reports_dropped_receiver() {
    let (observer, rx) = ChannelObserver::channel();
    observer.update(&event(0, 1, EventKind::Parked)).await.unwrap();
    drop(rx);
    assert!(observer.update(&event(1, 1, EventKind::Exiting)).await.is_err());
}

#[test]
fn test_event_log_zero_capacity_keeps_nothing() {
    let log = EventLog::new(0);
    log.record(event(0, 1, EventKind::Arrived));
    log.record(event(1, 1, EventKind::Parked));
    assert!(log.is_empty());
    assert_eq!(log.len(), 0);
}
