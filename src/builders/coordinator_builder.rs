//! Builders to construct a coordinator from configuration.

use std::sync::Arc;

use crate::config::ParkingConfig;
use crate::core::{Coordinator, Observer, ParkingError, Spawn};

/// Validate `cfg` and build a coordinator running its background work on `spawner`.
pub fn build_coordinator<S>(cfg: &ParkingConfig, spawner: S) -> Result<Coordinator<S>, ParkingError>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    CoordinatorBuilder::new(cfg.clone()).build(spawner)
}

/// Assembles a coordinator with observers already registered.
pub struct CoordinatorBuilder {
    config: ParkingConfig,
    observers: Vec<Arc<dyn Observer>>,
}

impl CoordinatorBuilder {
    /// Start from a configuration.
    pub fn new(config: ParkingConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    /// Override the number of spots.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Override the wait timeout.
    #[must_use]
    pub fn wait_timeout_ms(mut self, wait_timeout_ms: u64) -> Self {
        self.config.wait_timeout_ms = wait_timeout_ms;
        self
    }

    /// Keep vehicles parked until they exit explicitly.
    #[must_use]
    pub fn without_hold(mut self) -> Self {
        self.config.hold = None;
        self
    }

    /// Register `observer` as soon as the coordinator exists.
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Validate and build.
    pub fn build<S>(self, spawner: S) -> Result<Coordinator<S>, ParkingError>
    where
        S: Spawn + Clone + Send + Sync + 'static,
    {
        self.config
            .validate()
            .map_err(|e| ParkingError::InvalidConfig(format!("config invalid: {e}")))?;

        let coordinator = Coordinator::new(self.config.limits(), spawner)?;
        for observer in self.observers {
            coordinator.register(observer);
        }
        tracing::info!(
            "lot ready: {} spots, {} ms wait timeout",
            self.config.capacity,
            self.config.wait_timeout_ms
        );
        Ok(coordinator)
    }
}
