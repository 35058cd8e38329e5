//! Runtime adapters and the demand generator.

pub mod generator;
pub mod tokio_spawner;

pub use generator::{ArrivalGenerator, ArrivalReport};
pub use tokio_spawner::TokioSpawner;
