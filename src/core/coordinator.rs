//! Admission coordinator: the enter/exit protocol over the pool and wait queue.
//!
//! Lock order is fixed process-wide: pool lock, then queue lock, then a
//! vehicle's own record. Neither lock is ever held across an `.await`.
//!
//! Admission is strict FIFO. The fast path is only taken when a spot is free
//! and nobody is waiting; otherwise the vehicle queues and may only admit
//! itself once it reaches the head of the queue while a spot is free. Every
//! removal from the queue is followed by a broadcast on `available`, so the
//! next head always re-checks.
//!
//! A queued vehicle is raced by three parties: its own wait loop, a timeout
//! watcher and its cancellation signal. Whoever removes it from the queue
//! first decides its fate; the others find it gone and do nothing.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::config::HoldRange;
use crate::core::notifier::{EventKind, EventNotifier, Observer, ObserverId};
use crate::core::resource_pool::{Lot, PoolSnapshot, ResourcePool};
use crate::core::vehicle::{Vehicle, VehicleId, VehicleState};
use crate::core::wait_queue::WaitQueue;
use crate::core::{ParkingError, Spawn};

/// Runtime limits for a coordinator, derived from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotLimits {
    /// Number of spots.
    pub capacity: usize,
    /// How long a queued vehicle waits before giving up.
    pub wait_timeout: Duration,
    /// How long an admitted vehicle stays; `None` keeps it until [`Coordinator::exit`].
    pub hold: Option<HoldRange>,
}

/// Occupancy and lifetime counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotStats {
    /// Number of spots.
    pub capacity: usize,
    /// Spots currently taken.
    pub occupied: usize,
    /// Vehicles currently waiting.
    pub queued: usize,
    /// Vehicles that called `enter`.
    pub arrived_total: u64,
    /// Vehicles that got a spot, immediately or after waiting.
    pub admitted_total: u64,
    /// Vehicles that had to wait.
    pub queued_total: u64,
    /// Vehicles evicted by the wait timeout.
    pub timed_out_total: u64,
    /// Vehicles evicted by cancellation or shutdown.
    pub cancelled_total: u64,
    /// Vehicles that left their spot.
    pub released_total: u64,
    /// Exit requests rejected for lack of a valid spot.
    pub rejected_exits_total: u64,
}

/// Spot map plus queue order, for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotSnapshot {
    /// Spot occupancy.
    pub pool: PoolSnapshot,
    /// Waiting vehicle ids, head first.
    pub queue: Vec<VehicleId>,
}

#[derive(Debug, Default)]
struct LotCounters {
    arrived: AtomicU64,
    admitted: AtomicU64,
    queued: AtomicU64,
    timed_out: AtomicU64,
    cancelled: AtomicU64,
    released: AtomicU64,
    rejected_exits: AtomicU64,
}

impl LotCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Why a watcher removed a vehicle from the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Eviction {
    Timeout,
    Cancelled,
    Shutdown,
    /// The `enter` future was dropped while the vehicle waited.
    Abandoned,
}

impl Eviction {
    const fn state(self) -> VehicleState {
        match self {
            Self::Timeout => VehicleState::TimedOut,
            Self::Cancelled | Self::Shutdown | Self::Abandoned => VehicleState::Cancelled,
        }
    }

    const fn event(self) -> EventKind {
        match self {
            Self::Timeout => EventKind::TimedOut,
            Self::Cancelled | Self::Shutdown | Self::Abandoned => EventKind::Cancelled,
        }
    }
}

struct Shared<S> {
    limits: LotLimits,
    pool: ResourcePool,
    queue: Mutex<WaitQueue>,
    /// Broadcast whenever a spot frees up or the queue loses a member.
    available: Notify,
    notifier: EventNotifier<S>,
    counters: LotCounters,
    shutdown: CancellationToken,
    spawner: S,
}

/// Orchestrates admission, waiting, eviction and release for one lot.
///
/// Cheap to clone; clones share the same lot. `enter` may be called
/// concurrently for distinct vehicles.
pub struct Coordinator<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for Coordinator<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S> fmt::Debug for Coordinator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("limits", &self.shared.limits)
            .field("pool", &self.shared.pool)
            .field("notifier", &self.shared.notifier)
            .finish_non_exhaustive()
    }
}

impl<S> Coordinator<S>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    /// Create a coordinator with an empty lot.
    pub fn new(limits: LotLimits, spawner: S) -> Result<Self, ParkingError> {
        if limits.wait_timeout.is_zero() {
            return Err(ParkingError::InvalidConfig(
                "wait timeout must be greater than 0".into(),
            ));
        }
        if let Some(hold) = limits.hold {
            if hold.min > hold.max {
                return Err(ParkingError::InvalidConfig(
                    "hold minimum exceeds maximum".into(),
                ));
            }
        }
        let pool = ResourcePool::new(limits.capacity)?;
        Ok(Self {
            shared: Arc::new(Shared {
                limits,
                pool,
                queue: Mutex::new(WaitQueue::new()),
                available: Notify::new(),
                notifier: EventNotifier::new(spawner.clone()),
                counters: LotCounters::default(),
                shutdown: CancellationToken::new(),
                spawner,
            }),
        })
    }

    /// Limits this coordinator was built with.
    pub fn limits(&self) -> &LotLimits {
        &self.shared.limits
    }

    /// Subscribe an observer to lifecycle events.
    pub fn register(&self, observer: Arc<dyn Observer>) -> ObserverId {
        self.shared.notifier.register(observer)
    }

    /// Unsubscribe an observer.
    pub fn unregister(&self, id: ObserverId) -> bool {
        self.shared.notifier.unregister(id)
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.shared.notifier.observer_count()
    }

    /// Admit `vehicle`, waiting for a spot if the lot is full.
    ///
    /// Resolves with `Admitted`, `TimedOut` or `Cancelled`. Errors only on
    /// misuse (re-entering a vehicle, duplicate ids) or a broken invariant.
    ///
    /// If this future is dropped while the vehicle waits, the vehicle is
    /// evicted as `Cancelled` right away so the vehicles behind it can move up.
    pub async fn enter(&self, vehicle: Arc<Vehicle>) -> Result<VehicleState, ParkingError> {
        let shared = &self.shared;
        let id = vehicle.id();

        {
            let mut lot = shared.pool.lock();
            let mut queue = shared.queue.lock();

            let state = vehicle.state();
            if state != VehicleState::Requested {
                return Err(ParkingError::InvalidTransition {
                    vehicle: id,
                    from: state,
                    to: VehicleState::Admitted,
                });
            }
            if queue.contains(id) || lot.spot_of(id).is_some() {
                return Err(ParkingError::DuplicateRequest(id));
            }

            LotCounters::bump(&shared.counters.arrived);
            shared.notifier.emit(&vehicle, EventKind::Arrived, None);

            if !lot.is_full() && queue.is_empty() {
                drop(queue);
                let spot = self.admit_locked(&mut lot, &vehicle)?;
                drop(lot);
                tracing::info!("vehicle {} parked at spot {}", id, spot);
                self.schedule_departure(vehicle);
                return Ok(VehicleState::Admitted);
            }

            vehicle.transition(VehicleState::Queued, None)?;
            queue.push(Arc::clone(&vehicle));
            LotCounters::bump(&shared.counters.queued);
            shared.notifier.emit(&vehicle, EventKind::Waiting, None);
            tracing::debug!(
                "lot full ({}/{}), vehicle {} waiting at position {}",
                lot.occupied(),
                lot.capacity(),
                id,
                queue.len()
            );
        }

        let settled = CancellationToken::new();
        self.spawn_watcher(Arc::clone(&vehicle), settled.clone());
        let mut guard = WaitGuard {
            coordinator: self,
            vehicle: &vehicle,
            settled,
            pending: true,
        };
        let outcome = self.wait_for_spot(&vehicle).await;
        guard.pending = false;
        outcome
    }

    /// Release the spot held by `vehicle` and wake waiters.
    ///
    /// Returns the vacated spot. A vehicle without a valid assignment is
    /// rejected with [`ParkingError::InvalidSpot`] and nothing changes.
    pub fn exit(&self, vehicle: &Vehicle) -> Result<usize, ParkingError> {
        let shared = &self.shared;
        let id = vehicle.id();
        let spot = {
            let mut lot = shared.pool.lock();
            let claimed = vehicle.spot();
            if !lot.is_parked(id, claimed) {
                LotCounters::bump(&shared.counters.rejected_exits);
                tracing::warn!("vehicle {} cannot exit: no valid spot ({:?})", id, claimed);
                return Err(ParkingError::InvalidSpot {
                    vehicle: id,
                    spot: claimed,
                });
            }
            let spot = lot.release(id, claimed)?;
            vehicle.transition(VehicleState::Released, None)?;
            LotCounters::bump(&shared.counters.released);
            shared.notifier.emit(vehicle, EventKind::Exiting, Some(spot));
            spot
        };
        tracing::info!("vehicle {} left spot {}", id, spot);
        shared.available.notify_waiters();
        Ok(spot)
    }

    /// Stop all watchers and holding timers. Waiting vehicles are evicted as `Cancelled`.
    pub fn shutdown(&self) {
        tracing::info!("coordinator shutting down");
        self.shared.shutdown.cancel();
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shared.shutdown.is_cancelled()
    }

    /// Occupancy and lifetime counters.
    pub fn stats(&self) -> LotStats {
        let (occupied, queued) = {
            let lot = self.shared.pool.lock();
            let queue = self.shared.queue.lock();
            (lot.occupied(), queue.len())
        };
        let c = &self.shared.counters;
        LotStats {
            capacity: self.shared.limits.capacity,
            occupied,
            queued,
            arrived_total: c.arrived.load(Ordering::Relaxed),
            admitted_total: c.admitted.load(Ordering::Relaxed),
            queued_total: c.queued.load(Ordering::Relaxed),
            timed_out_total: c.timed_out.load(Ordering::Relaxed),
            cancelled_total: c.cancelled.load(Ordering::Relaxed),
            released_total: c.released.load(Ordering::Relaxed),
            rejected_exits_total: c.rejected_exits.load(Ordering::Relaxed),
        }
    }

    /// Consistent copy of spot map and queue order.
    pub fn snapshot(&self) -> LotSnapshot {
        let lot = self.shared.pool.lock();
        let queue = self.shared.queue.lock();
        LotSnapshot {
            pool: lot.snapshot(),
            queue: queue.ids(),
        }
    }

    /// Verify the capacity invariant of the spot map.
    pub fn check_invariants(&self) -> Result<(), ParkingError> {
        self.shared.pool.lock().check_invariants()
    }

    /// Find, assign and record a spot. Caller holds the pool lock and not the queue lock.
    fn admit_locked(&self, lot: &mut Lot, vehicle: &Vehicle) -> Result<usize, ParkingError> {
        let id = vehicle.id();
        let spot = lot.find_free_spot().ok_or_else(|| {
            ParkingError::AllocationInconsistency(format!(
                "no free spot with {}/{} occupied",
                lot.occupied(),
                lot.capacity()
            ))
        });
        let result = spot.and_then(|spot| {
            lot.assign(id, spot)?;
            if let Err(e) = vehicle.transition(VehicleState::Admitted, Some(spot)) {
                lot.release(id, Some(spot))?;
                return Err(e);
            }
            Ok(spot)
        });
        match result {
            Ok(spot) => {
                LotCounters::bump(&self.shared.counters.admitted);
                self.shared.notifier.emit(vehicle, EventKind::Parked, Some(spot));
                Ok(spot)
            }
            Err(e) => {
                tracing::error!("admission of vehicle {} broke an invariant: {}", id, e);
                Err(e)
            }
        }
    }

    /// Block until `vehicle` is admitted or evicted by its watcher.
    async fn wait_for_spot(&self, vehicle: &Arc<Vehicle>) -> Result<VehicleState, ParkingError> {
        let shared = &self.shared;
        let id = vehicle.id();
        loop {
            // Register before checking so a broadcast after the check is not lost.
            let notified = shared.available.notified();

            {
                let mut lot = shared.pool.lock();
                let mut queue = shared.queue.lock();

                if !queue.contains(id) {
                    let state = vehicle.state();
                    tracing::debug!("vehicle {} left the queue as {:?}", id, state);
                    return Ok(state);
                }

                if queue.is_head(id) && !lot.is_full() {
                    queue.remove(id);
                    drop(queue);
                    let spot = match self.admit_locked(&mut lot, vehicle) {
                        Ok(spot) => spot,
                        Err(e) => {
                            // Out of the queue, so it must not stay Queued.
                            if vehicle.transition(VehicleState::Cancelled, None).is_ok() {
                                LotCounters::bump(&shared.counters.cancelled);
                                shared.notifier.emit(vehicle, EventKind::Cancelled, None);
                            }
                            drop(lot);
                            shared.available.notify_waiters();
                            return Err(e);
                        }
                    };
                    drop(lot);
                    tracing::info!("vehicle {} parked at spot {} after waiting", id, spot);
                    // The next head may be able to follow.
                    shared.available.notify_waiters();
                    self.schedule_departure(Arc::clone(vehicle));
                    return Ok(VehicleState::Admitted);
                }
            }

            notified.await;
        }
    }

    fn spawn_watcher(&self, vehicle: Arc<Vehicle>, settled: CancellationToken) {
        let coordinator = self.clone();
        let timeout = self.shared.limits.wait_timeout;
        self.shared.spawner.spawn(async move {
            let reason = tokio::select! {
                biased;
                () = settled.cancelled() => return,
                () = coordinator.shared.shutdown.cancelled() => Eviction::Shutdown,
                () = vehicle.cancelled() => Eviction::Cancelled,
                () = tokio::time::sleep(timeout) => Eviction::Timeout,
            };
            coordinator.evict(&vehicle, reason);
        });
    }

    /// Remove `vehicle` from the queue if it is still there. Returns whether this call won.
    fn evict(&self, vehicle: &Vehicle, reason: Eviction) -> bool {
        let shared = &self.shared;
        let id = vehicle.id();
        {
            let mut queue = shared.queue.lock();
            if queue.remove(id).is_none() {
                tracing::debug!("vehicle {} already left the queue, {:?} ignored", id, reason);
                return false;
            }
            if let Err(e) = vehicle.transition(reason.state(), None) {
                tracing::error!("evicting vehicle {} broke an invariant: {}", id, e);
            }
            let counter = match reason {
                Eviction::Timeout => &shared.counters.timed_out,
                Eviction::Cancelled | Eviction::Shutdown | Eviction::Abandoned => {
                    &shared.counters.cancelled
                }
            };
            LotCounters::bump(counter);
            shared.notifier.emit(vehicle, reason.event(), None);
        }
        match reason {
            Eviction::Timeout => tracing::info!(
                "vehicle {} timed out after {:?} in queue",
                id,
                shared.limits.wait_timeout
            ),
            Eviction::Cancelled => tracing::info!("vehicle {} cancelled while waiting", id),
            Eviction::Shutdown => tracing::info!("vehicle {} evicted by shutdown", id),
            Eviction::Abandoned => {
                tracing::info!("vehicle {} stopped waiting, its enter call was dropped", id);
            }
        }
        // Wakes the evicted waiter and lets a new head re-check.
        shared.available.notify_waiters();
        true
    }

    /// Start the holding timer that will drive the exit protocol.
    fn schedule_departure(&self, vehicle: Arc<Vehicle>) {
        let Some(hold) = self.shared.limits.hold else {
            return;
        };
        let stay = hold.sample();
        let coordinator = self.clone();
        tracing::debug!("vehicle {} will stay {:?}", vehicle.id(), stay);
        self.shared.spawner.spawn(async move {
            tokio::select! {
                biased;
                () = coordinator.shared.shutdown.cancelled() => {}
                () = tokio::time::sleep(stay) => {
                    // Already gone if someone called exit explicitly.
                    if let Err(e) = coordinator.exit(&vehicle) {
                        tracing::debug!("scheduled departure skipped: {}", e);
                    }
                }
            }
        });
    }
}

/// Evicts a still-queued vehicle when its `enter` future is dropped, and
/// stops its watcher either way.
struct WaitGuard<'a, S>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    coordinator: &'a Coordinator<S>,
    vehicle: &'a Vehicle,
    settled: CancellationToken,
    pending: bool,
}

impl<S> Drop for WaitGuard<'_, S>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if self.pending {
            self.coordinator.evict(self.vehicle, Eviction::Abandoned);
        }
        self.settled.cancel();
    }
}
