//! Observer that forwards events into a channel, e.g. for a render loop.

use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::core::{AppResult, Event, Observer};

/// Forwards every event to an unbounded mpsc channel.
pub struct ChannelObserver {
    tx: UnboundedSender<Event>,
}

impl ChannelObserver {
    /// Wrap an existing sender.
    pub const fn new(tx: UnboundedSender<Event>) -> Self {
        Self { tx }
    }

    /// Create an observer together with the receiving end.
    pub fn channel() -> (Self, UnboundedReceiver<Event>) {
        let (tx, rx) = unbounded_channel();
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl Observer for ChannelObserver {
    async fn update(&self, event: &Event) -> AppResult<()> {
        self.tx
            .send(event.clone())
            .map_err(|_| anyhow::anyhow!("event receiver dropped"))
    }
}
