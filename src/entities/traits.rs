//! Abstract traits for dependency inversion.
//!
//! `entities` needs a thread pool to decode frames but must not depend on the
//! concrete pool in `core/`. Implementations live in `core/`.

use std::sync::Arc;

/// Abstract worker pool interface.
///
/// Allows the loader to schedule decode jobs without knowing
/// the concrete thread pool implementation.
pub trait WorkerPool: Send + Sync {
    /// Execute closure on a worker thread with epoch-based cancellation.
    ///
    /// If the epoch changed before execution, the closure is skipped.
    fn execute_with_epoch(&self, epoch: u64, f: Box<dyn FnOnce() + Send + 'static>);
}

/// Blanket impl: Arc<T> implements the trait if T does
impl<T: WorkerPool + ?Sized> WorkerPool for Arc<T> {
    fn execute_with_epoch(&self, epoch: u64, f: Box<dyn FnOnce() + Send + 'static>) {
        (**self).execute_with_epoch(epoch, f)
    }
}
