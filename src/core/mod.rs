//! Admission engine: spot accounting, wait queue, coordinator and event fan-out.

pub mod coordinator;
pub mod error;
pub mod notifier;
pub mod resource_pool;
pub mod spawn;
pub mod vehicle;
pub mod wait_queue;

pub use coordinator::{Coordinator, LotLimits, LotSnapshot, LotStats};
pub use error::{AppResult, ParkingError};
pub use notifier::{Event, EventKind, EventNotifier, Observer, ObserverId};
pub use resource_pool::{Lot, PoolSnapshot, ResourcePool};
pub use spawn::Spawn;
pub use vehicle::{Vehicle, VehicleId, VehicleSnapshot, VehicleState};
pub use wait_queue::WaitQueue;
