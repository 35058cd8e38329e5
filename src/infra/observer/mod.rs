//! Observer implementations.

pub mod channel;
pub mod log;
pub mod memory;

pub use channel::ChannelObserver;
pub use log::LogObserver;
pub use memory::EventLog;
