//! Asynchronous image loader
//!
//! Hands out pending [`Frame`]s immediately and decodes them on a worker
//! pool. The playback core never waits on a load; it polls the frames.
//!
//! Each request is tagged with the current epoch. `cancel_pending()` bumps
//! the epoch so decode jobs queued for a discarded sequence are skipped.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, error};

use super::frame::Frame;
use super::traits::WorkerPool;

/// Image loader backed by a worker pool
pub struct ImageLoader {
    pool: Arc<dyn WorkerPool>,
    epoch: Arc<AtomicU64>, // Shared with the pool's epoch check
}

impl ImageLoader {
    pub fn new(pool: Arc<dyn WorkerPool>, epoch: Arc<AtomicU64>) -> Self {
        Self { pool, epoch }
    }

    /// Current request epoch
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Relaxed)
    }

    /// Request one image. Returns a pending frame filled in the background.
    pub fn request(&self, path: &Path) -> Frame {
        let frame = Frame::new_unloaded(path.to_path_buf());
        let job = frame.clone();
        self.pool.execute_with_epoch(
            self.epoch(),
            Box::new(move || {
                if let Err(e) = job.load() {
                    error!("Failed to load {:?}: {}", job.file(), e);
                }
            }),
        );
        frame
    }

    /// Request every path, preserving order
    pub fn request_all(&self, paths: &[PathBuf]) -> Vec<Frame> {
        debug!("Requesting {} frames (epoch {})", paths.len(), self.epoch());
        paths.iter().map(|p| self.request(p)).collect()
    }

    /// Skip every queued decode that has not started yet
    pub fn cancel_pending(&self) {
        let epoch = self.epoch.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Loader epoch advanced to {}", epoch);
    }
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("epoch", &self.epoch())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::frame::FrameStatus;
    use std::sync::Mutex;

    type Job = Box<dyn FnOnce() + Send + 'static>;

    /// Pool that queues jobs until `run_all`, checking the epoch like the real one
    #[derive(Default)]
    struct ManualPool {
        current: Arc<AtomicU64>,
        jobs: Mutex<Vec<(u64, Job)>>,
    }

    impl ManualPool {
        fn run_all(&self) {
            let jobs = std::mem::take(&mut *self.jobs.lock().unwrap());
            for (epoch, job) in jobs {
                if epoch == self.current.load(Ordering::Relaxed) {
                    job();
                }
            }
        }
    }

    impl WorkerPool for ManualPool {
        fn execute_with_epoch(&self, epoch: u64, f: Job) {
            self.jobs.lock().unwrap().push((epoch, f));
        }
    }

    fn write_png(dir: &Path, name: &str, value: u8) -> PathBuf {
        let path = dir.join(name);
        image::RgbaImage::from_pixel(2, 2, image::Rgba([value, value, value, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_request_is_pending_until_job_runs() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![write_png(dir.path(), "a.png", 1), write_png(dir.path(), "b.png", 2)];

        let pool = Arc::new(ManualPool::default());
        let loader = ImageLoader::new(pool.clone(), Arc::clone(&pool.current));

        let frames = loader.request_all(&paths);
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.status() == FrameStatus::Pending));

        pool.run_all();
        assert!(frames.iter().all(Frame::is_ready));
        assert_eq!(frames[1].pixels()[0], [2, 2, 2, 255]);
    }

    #[test]
    fn test_cancel_pending_skips_stale_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "a.png", 1);

        let pool = Arc::new(ManualPool::default());
        let loader = ImageLoader::new(pool.clone(), Arc::clone(&pool.current));

        let frame = loader.request(&path);
        loader.cancel_pending();
        assert_eq!(loader.epoch(), 1);

        pool.run_all();
        assert_eq!(frame.status(), FrameStatus::Pending);
    }

    #[test]
    fn test_bad_file_marks_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        let pool = Arc::new(ManualPool::default());
        let loader = ImageLoader::new(pool.clone(), Arc::clone(&pool.current));

        let frame = loader.request(&path);
        pool.run_all();
        assert_eq!(frame.status(), FrameStatus::Error);
    }
}
