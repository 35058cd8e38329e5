//! Configuration models for the lot, wait timeout and holding durations.

pub mod lot;

pub use lot::{HoldConfig, HoldRange, ParkingConfig};
