//! Builders to construct coordinators from configuration.

pub mod coordinator_builder;

pub use coordinator_builder::{build_coordinator, CoordinatorBuilder};
