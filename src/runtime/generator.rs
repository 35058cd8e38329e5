//! Demand generator: a stream of arrivals at random intervals.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::core::{Coordinator, ParkingError, Spawn, Vehicle, VehicleId, VehicleState};

/// Produces `count` vehicles with uniformly random gaps between arrivals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrivalGenerator {
    /// Number of vehicles to generate.
    pub count: usize,
    /// Id of the first vehicle; the rest follow consecutively.
    pub first_id: VehicleId,
    /// Shortest gap between two arrivals.
    pub min_gap: Duration,
    /// Longest gap between two arrivals.
    pub max_gap: Duration,
}

impl Default for ArrivalGenerator {
    fn default() -> Self {
        Self {
            count: 100,
            first_id: 1,
            min_gap: Duration::ZERO,
            max_gap: Duration::from_secs(1),
        }
    }
}

/// Final outcome of every generated vehicle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalReport {
    /// Vehicles that got a spot.
    pub admitted: usize,
    /// Vehicles that gave up waiting.
    pub timed_out: usize,
    /// Vehicles cancelled while waiting.
    pub cancelled: usize,
    /// `enter` calls that returned an error.
    pub failed: usize,
}

impl ArrivalReport {
    /// Total vehicles accounted for.
    pub const fn total(&self) -> usize {
        self.admitted + self.timed_out + self.cancelled + self.failed
    }

    fn record(&mut self, outcome: Result<VehicleState, ParkingError>) {
        match outcome {
            Ok(VehicleState::Admitted) => self.admitted += 1,
            Ok(VehicleState::TimedOut) => self.timed_out += 1,
            Ok(VehicleState::Cancelled) => self.cancelled += 1,
            Ok(other) => {
                tracing::error!("enter resolved with non-terminal state {:?}", other);
                self.failed += 1;
            }
            Err(e) => {
                tracing::warn!("arrival failed: {}", e);
                self.failed += 1;
            }
        }
    }
}

impl ArrivalGenerator {
    /// Random gap in `[min_gap, max_gap]`.
    fn next_gap(&self) -> Duration {
        if self.max_gap <= self.min_gap {
            return self.min_gap;
        }
        let lo = u64::try_from(self.min_gap.as_millis()).unwrap_or(u64::MAX);
        let hi = u64::try_from(self.max_gap.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::rng().random_range(lo..=hi))
    }

    /// Feed arrivals into `coordinator` and wait until each has an admission outcome.
    ///
    /// Admitted vehicles may still be parked when this returns.
    pub async fn run<S>(&self, coordinator: &Coordinator<S>) -> ArrivalReport
    where
        S: Spawn + Clone + Send + Sync + 'static,
    {
        let mut pending = JoinSet::new();
        for offset in 0..self.count {
            let gap = self.next_gap();
            if !gap.is_zero() {
                tokio::time::sleep(gap).await;
            }
            let id = self.first_id + offset as VehicleId;
            tracing::debug!("generated vehicle {}", id);
            let coordinator = coordinator.clone();
            pending.spawn(async move { coordinator.enter(Arc::new(Vehicle::new(id))).await });
        }

        let mut report = ArrivalReport::default();
        while let Some(joined) = pending.join_next().await {
            match joined {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    tracing::error!("arrival task aborted: {}", e);
                    report.failed += 1;
                }
            }
        }
        tracing::info!(
            "generated {} arrivals: {} admitted, {} timed out, {} cancelled",
            self.count,
            report.admitted,
            report.timed_out,
            report.cancelled
        );
        report
    }
}
