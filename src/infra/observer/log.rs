//! Observer that writes events to the tracing subscriber.

use async_trait::async_trait;

use crate::core::{AppResult, Event, Observer};

/// Emits one structured `tracing` record per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

#[async_trait]
impl Observer for LogObserver {
    async fn update(&self, event: &Event) -> AppResult<()> {
        tracing::info!(
            seq = event.sequence,
            vehicle = event.vehicle.id,
            kind = ?event.kind,
            spot = ?event.spot,
            "lot event"
        );
        Ok(())
    }
}
