//! Tokio runtime spawner implementation.

use std::future::Future;
use std::sync::Arc;

use crate::core::Spawn;

/// Tokio-based spawner for watchers, holding timers and observer delivery.
#[derive(Clone, Debug)]
pub struct TokioSpawner {
    handle: Arc<tokio::runtime::Handle>,
}

impl TokioSpawner {
    /// Create a spawner from a tokio runtime handle.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }

    /// Spawner bound to the runtime the caller is running on.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }

    /// Spawner bound to the current runtime, if there is one.
    pub fn try_current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }

    /// Build a dedicated multi-threaded runtime and return it with its spawner.
    ///
    /// `worker_threads` defaults to the number of CPUs. The runtime must be
    /// kept alive for as long as the spawner is used.
    pub fn with_worker_threads(
        worker_threads: Option<usize>,
    ) -> Result<(tokio::runtime::Runtime, Self), std::io::Error> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(worker_threads.unwrap_or_else(num_cpus::get))
            .thread_name("parking-sim")
            .enable_all()
            .build()?;
        let spawner = Self::new(runtime.handle().clone());
        Ok((runtime, spawner))
    }
}

impl Spawn for TokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(fut);
    }
}
