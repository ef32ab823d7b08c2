//! Thread pool for background frame decoding.
//!
//! Uses a crossbeam MPMC channel with closure-based task execution.
//! Epoch mechanism lets a reinitialized player skip decodes queued for the
//! sequence it just discarded.

use crossbeam_channel::{Sender, unbounded};
use log::{error, trace};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crate::entities::WorkerPool;
use crate::error::Result;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker pool for decode jobs.
///
/// # Example
/// ```ignore
/// let workers = Workers::new(4, epoch)?;
///
/// let frame = frame.clone();
/// workers.execute(move || {
///     if let Err(e) = frame.load() {
///         log::error!("Load failed: {}", e);
///     }
/// });
/// ```
pub struct Workers {
    sender: Option<Sender<Job>>,          // None once shutting down
    handles: Vec<thread::JoinHandle<()>>, // Joined on drop
    current_epoch: Arc<AtomicU64>,        // Shared with ImageLoader
}

impl Workers {
    /// Create worker pool with `num_threads` threads and shared epoch counter.
    ///
    /// Recommended: `num_cpus::get() * 3 / 4` (leave room for the caller).
    pub fn new(num_threads: usize, epoch: Arc<AtomicU64>) -> Result<Self> {
        let (tx, rx) = unbounded::<Job>();
        let mut handles = Vec::with_capacity(num_threads);

        for worker_id in 0..num_threads.max(1) {
            let rx = rx.clone();
            let handle = thread::Builder::new()
                .name(format!("seqplay-worker-{}", worker_id))
                .spawn(move || {
                    trace!("Worker {} started", worker_id);
                    // Execute closures until the channel closes
                    while let Ok(job) = rx.recv() {
                        job();
                    }
                    trace!("Worker {} stopped", worker_id);
                })?;
            handles.push(handle);
        }

        trace!("Workers initialized: {} threads", handles.len());

        Ok(Self {
            sender: Some(tx),
            handles,
            current_epoch: epoch,
        })
    }

    /// Execute closure on a worker thread.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Some(sender) = &self.sender else {
            return;
        };
        if let Err(e) = sender.send(Box::new(f)) {
            error!("Failed to enqueue job: {}", e);
        }
    }

    /// Execute closure only if `epoch` still matches when a worker picks it up.
    pub fn execute_with_epoch<F>(&self, epoch: u64, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let current_epoch = Arc::clone(&self.current_epoch);
        self.execute(move || {
            if current_epoch.load(Ordering::Relaxed) == epoch {
                f();
            }
        });
    }

    pub fn num_threads(&self) -> usize {
        self.handles.len()
    }
}

impl Drop for Workers {
    fn drop(&mut self) {
        trace!("Workers shutting down ({} threads)...", self.handles.len());
        // Sender drops → channel closes → workers drain and exit recv() loop
        self.sender.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
        trace!("All workers stopped");
    }
}

impl WorkerPool for Workers {
    fn execute_with_epoch(&self, epoch: u64, f: Box<dyn FnOnce() + Send + 'static>) {
        Workers::execute_with_epoch(self, epoch, f)
    }
}
