//! Async Runtime for Mobile Platforms
//!
//! Swift and Kotlin callers do not drive Rust futures. The client owns a Tokio
//! runtime that runs readiness delivery and native completions, so every
//! callback reaches the mobile side from a runtime worker thread and never
//! inline from the call that registered it.

use tokio::runtime::{Builder, Handle, Runtime};

use crate::EntitlementMobileError;

/// Owned Tokio runtime for the entitlement client.
///
/// Host callbacks run on this runtime, so a callback may hold the last
/// reference to the client. Dropping the runtime from one of its own worker
/// threads therefore shuts it down in the background instead of blocking.
pub struct AsyncRuntime {
    runtime: Option<Runtime>,
    handle: Handle,
}

impl AsyncRuntime {
    /// Create a runtime with Tokio's default worker count.
    pub fn new() -> Result<Self, EntitlementMobileError> {
        Self::build(Builder::new_multi_thread())
    }

    /// Create with a fixed number of worker threads.
    pub fn with_threads(num_threads: usize) -> Result<Self, EntitlementMobileError> {
        if num_threads == 0 {
            return Err(EntitlementMobileError::InvalidArgument {
                msg: "worker_threads must be at least 1".to_string(),
            });
        }
        let mut builder = Builder::new_multi_thread();
        builder.worker_threads(num_threads);
        Self::build(builder)
    }

    /// Create from an optional worker count.
    pub fn from_worker_threads(
        worker_threads: Option<u32>,
    ) -> Result<Self, EntitlementMobileError> {
        match worker_threads {
            Some(n) => Self::with_threads(n as usize),
            None => Self::new(),
        }
    }

    fn build(mut builder: Builder) -> Result<Self, EntitlementMobileError> {
        let runtime = builder
            .thread_name("cqm-entitlement")
            .enable_all()
            .build()
            .map_err(|e| EntitlementMobileError::Internal {
                msg: format!("Failed to create runtime: {}", e),
            })?;
        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        })
    }

    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    /// Whether the calling thread is inside a Tokio runtime, where
    /// [`Self::block_on`] would panic.
    pub fn in_async_context() -> bool {
        Handle::try_current().is_ok()
    }

    /// Run a future to completion on the current thread.
    ///
    /// Must not be called from inside a Tokio runtime; it panics there. Call it
    /// from host threads (main thread, GCD queues, Android executors).
    pub fn block_on<F, T>(&self, future: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        self.handle.block_on(future)
    }
}

impl Drop for AsyncRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            if Self::in_async_context() {
                #[cfg(feature = "tracing")]
                tracing::debug!("runtime dropped from async context, shutting down in background");
                runtime.shutdown_background();
            }
        }
    }
}
