//! In-memory event log.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{AppResult, Event, EventKind, Observer, VehicleId};

/// Bounded in-memory event log for testing and dev. Oldest events are dropped first.
pub struct EventLog {
    events: Mutex<VecDeque<Event>>,
    max_events: usize,
}

impl EventLog {
    /// Create a log holding at most `max_events`.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events,
        }
    }

    /// Store an event directly, bypassing the notifier. A zero-capacity log stores nothing.
    pub fn record(&self, event: Event) {
        if self.max_events == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Snapshot of stored events in delivery order.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().iter().cloned().collect()
    }

    /// Events concerning one vehicle.
    pub fn for_vehicle(&self, id: VehicleId) -> Vec<Event> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.vehicle.id == id)
            .cloned()
            .collect()
    }

    /// Kinds delivered for one vehicle, in order.
    pub fn kinds_for(&self, id: VehicleId) -> Vec<EventKind> {
        self.for_vehicle(id).iter().map(|e| e.kind).collect()
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing was stored.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

#[async_trait]
impl Observer for EventLog {
    async fn update(&self, event: &Event) -> AppResult<()> {
        self.record(event.clone());
        Ok(())
    }
}
