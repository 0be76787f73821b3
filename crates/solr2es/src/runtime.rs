//! Execution models for the pipeline.
//!
//! The pipeline is written once as async code. [`ExecutionMode`] picks how it
//! is driven:
//!
//! * `Blocking` runs it alone on a current-thread runtime, so every network
//!   call holds the thread until it returns.
//! * `Cooperative` runs it on a current-thread `LocalSet` next to other local
//!   tasks (the Ctrl-C watcher), which progress while the pipeline waits on
//!   I/O.
//!
//! Pipeline steps stay strictly ordered in both modes.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

use crate::error::Result;

/// How the pipeline is scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Sequential blocking calls on one thread of control.
    #[default]
    Blocking,
    /// Single-threaded cooperative scheduler; I/O waits yield.
    Cooperative,
}

/// Cancellation request observed at page boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a flag that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives `task` to completion under the given execution mode.
///
/// In cooperative mode Ctrl-C sets `cancel`; the pipeline stops before its
/// next page.
///
/// # Errors
///
/// Returns an IO error if the runtime cannot be built.
pub fn run<F>(mode: ExecutionMode, cancel: CancelFlag, task: F) -> Result<F::Output>
where
    F: Future,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match mode {
        ExecutionMode::Blocking => Ok(runtime.block_on(task)),
        ExecutionMode::Cooperative => {
            let local = tokio::task::LocalSet::new();
            let watcher = local.spawn_local(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupt received, stopping at the next page boundary");
                    cancel.cancel();
                }
            });
            let output = local.block_on(&runtime, task);
            watcher.abort();
            Ok(output)
        }
    }
}
