//! # Prometheus Parking Sim
//!
//! A concurrent admission engine for a bounded parking lot.
//!
//! Vehicles arrive at arbitrary times and ask for one of `N` spots. When the
//! lot is full they join a FIFO wait queue and block until a spot frees up,
//! their wait timeout fires, or their cancellation signal is triggered.
//! Admitted vehicles hold their spot for a randomized duration and then leave,
//! waking the next vehicle in line. Every transition is published to
//! registered observers without slowing the admission path.
//!
//! ## Core Guarantees
//!
//! - **No double booking**: finding and assigning a spot happen under one lock
//! - **Capacity invariant**: `0 <= occupied <= capacity`, always matching the spot map
//! - **Exactly-once outcome**: a waiting vehicle is admitted, times out, or is
//!   cancelled; whichever removes it from the queue first wins
//! - **Strict FIFO**: newcomers never overtake waiting vehicles
//! - **Non-blocking events**: each observer has its own ordered delivery loop
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prometheus_parking_sim::builders::CoordinatorBuilder;
//! use prometheus_parking_sim::config::ParkingConfig;
//! use prometheus_parking_sim::core::{Vehicle, VehicleState};
//! use prometheus_parking_sim::infra::EventLog;
//! use prometheus_parking_sim::runtime::TokioSpawner;
//!
//! let log = Arc::new(EventLog::new(1_000));
//! let lot = CoordinatorBuilder::new(ParkingConfig::default())
//!     .capacity(2)
//!     .observer(log.clone())
//!     .build(TokioSpawner::current())?;
//!
//! let car = Arc::new(Vehicle::new(1));
//! assert_eq!(lot.enter(car.clone()).await?, VehicleState::Admitted);
//! lot.exit(&car)?;
//! ```
//!
//! For complete scenarios, see `tests/admission_scenarios.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Admission engine: spot accounting, wait queue, coordinator and events.
pub mod core;
/// Configuration models for the lot, timeouts and holding durations.
pub mod config;
/// Builders to construct coordinators from configuration.
pub mod builders;
/// Stock observers.
pub mod infra;
/// Runtime adapters and the demand generator.
pub mod runtime;
/// Shared utilities.
pub mod util;
