//! Runtime seam for background work.

use std::future::Future;

/// Abstraction for spawning background futures on a runtime.
///
/// The coordinator spawns timeout watchers, holding timers and one delivery
/// loop per observer through this trait.
pub trait Spawn {
    /// Spawn a detached future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
