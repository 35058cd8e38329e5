//! Lifecycle events and their fan-out to observers.
//!
//! Each registered observer owns an unbounded channel and a delivery task.
//! [`EventNotifier::publish`] only enqueues, so a slow or failing observer
//! never holds up admission or the other observers. Events reach any single
//! observer in `publish` order.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use uuid::Uuid;

use crate::core::vehicle::{Vehicle, VehicleSnapshot};
use crate::core::{AppResult, Spawn};

/// Kind of lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Vehicle reached the gate.
    Arrived,
    /// Lot full, vehicle joined the wait queue.
    Waiting,
    /// Vehicle took a spot.
    Parked,
    /// Vehicle left its spot.
    Exiting,
    /// Vehicle gave up after the wait timeout.
    TimedOut,
    /// Vehicle's cancellation signal fired while waiting.
    Cancelled,
}

/// Immutable record of one transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Notifier-wide emission order.
    pub sequence: u64,
    /// Vehicle as it was right after the transition.
    pub vehicle: VehicleSnapshot,
    /// What happened.
    pub kind: EventKind,
    /// Spot taken (`Parked`) or vacated (`Exiting`); `None` otherwise.
    pub spot: Option<usize>,
}

/// Subscriber to lifecycle events, e.g. a presentation layer.
#[async_trait]
pub trait Observer: Send + Sync + 'static {
    /// Handle one event. Errors are logged; delivery continues.
    async fn update(&self, event: &Event) -> AppResult<()>;
}

/// Handle returned by [`EventNotifier::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObserverId(Uuid);

impl ObserverId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

struct Subscription {
    id: ObserverId,
    tx: UnboundedSender<Event>,
}

#[derive(Default)]
struct Registry {
    subscriptions: Vec<Subscription>,
    next_sequence: u64,
}

/// Fans events out to registered observers without blocking the publisher.
///
/// Stamping and enqueueing happen under one short lock, so every observer
/// sees strictly increasing sequence numbers.
pub struct EventNotifier<S> {
    registry: Mutex<Registry>,
    spawner: S,
}

impl<S> fmt::Debug for EventNotifier<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock();
        f.debug_struct("EventNotifier")
            .field("observers", &registry.subscriptions.len())
            .field("published", &registry.next_sequence)
            .finish()
    }
}

impl<S: Spawn> EventNotifier<S> {
    /// Create a notifier that spawns delivery loops on `spawner`.
    pub fn new(spawner: S) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            spawner,
        }
    }

    /// Register `observer` and start its delivery loop.
    pub fn register(&self, observer: Arc<dyn Observer>) -> ObserverId {
        let id = ObserverId::new();
        let (tx, mut rx) = unbounded_channel::<Event>();

        self.spawner.spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = observer.update(&event).await {
                    tracing::warn!("observer {} failed on event {}: {:#}", id, event.sequence, e);
                }
            }
            tracing::debug!("observer {} delivery loop finished", id);
        });

        self.registry.lock().subscriptions.push(Subscription { id, tx });
        tracing::debug!("registered observer {}", id);
        id
    }

    /// Stop delivering to `id`. Events already enqueued are still delivered.
    /// Returns `false` if `id` was not registered.
    pub fn unregister(&self, id: ObserverId) -> bool {
        let mut registry = self.registry.lock();
        let before = registry.subscriptions.len();
        registry.subscriptions.retain(|s| s.id != id);
        let removed = registry.subscriptions.len() != before;
        if removed {
            tracing::debug!("unregistered observer {}", id);
        }
        removed
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.registry.lock().subscriptions.len()
    }

    /// Number of events published so far.
    pub fn published(&self) -> u64 {
        self.registry.lock().next_sequence
    }

    /// Snapshot `vehicle` and publish an event of `kind`.
    pub fn emit(&self, vehicle: &Vehicle, kind: EventKind, spot: Option<usize>) -> u64 {
        self.publish(vehicle.snapshot(), kind, spot)
    }

    /// Stamp and enqueue an event for every observer. Never blocks.
    pub fn publish(&self, vehicle: VehicleSnapshot, kind: EventKind, spot: Option<usize>) -> u64 {
        let mut registry = self.registry.lock();
        let sequence = registry.next_sequence;
        registry.next_sequence += 1;
        let event = Event {
            sequence,
            vehicle,
            kind,
            spot,
        };

        // A closed channel means the delivery task is gone (observer panicked).
        let before = registry.subscriptions.len();
        registry
            .subscriptions
            .retain(|sub| sub.tx.send(event.clone()).is_ok());
        let dropped = before - registry.subscriptions.len();
        if dropped > 0 {
            tracing::warn!("dropped {} observer(s) whose delivery loop stopped", dropped);
        }
        sequence
    }
}
