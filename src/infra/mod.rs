//! Infrastructure adapters: stock observers for the event stream.

pub mod observer;

pub use observer::{ChannelObserver, EventLog, LogObserver};
