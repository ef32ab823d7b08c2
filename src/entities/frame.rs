//! Frame handle: shared pixel storage filled once by a loader
//!
//! **Why**: Frames are decoded on worker threads and become ready at
//! unpredictable times. The playback core only polls them, so a frame is a
//! cheap cloneable handle around `Arc<Mutex<..>>` shared by both sides.
//!
//! **Used by**: ImageLoader (writes), FrameSet/FrameSlot (reads)
//!
//! # Pixel Format
//!
//! Always 8-bit RGBA, one `[u8; 4]` per pixel. Decoded images are converted
//! with `to_rgba8()` regardless of their source format.
//!
//! # Atomic Loading
//!
//! `try_claim_for_loading()`: atomic Pending → Loading transition.
//! Prevents two workers from decoding the same frame.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, trace};

use crate::error::{Result, SequenceError};

/// One RGBA8 pixel
pub type Pixel = [u8; 4];

/// Frame loading status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Pending, // Nothing decoded yet
    Loading, // Claimed by a worker
    Loaded,  // Pixel data present
    Error,   // Decode failed, never becomes ready
}

/// Internal frame data protected by mutex
#[derive(Debug)]
struct FrameData {
    pixels: Vec<Pixel>,
    width: usize,
    height: usize,
    status: FrameStatus,
}

/// Shared handle to one image of a sequence
#[derive(Debug, Clone)]
pub struct Frame {
    data: Arc<Mutex<FrameData>>, // All mutable data in one mutex
    filename: Option<PathBuf>,   // Immutable after creation
}

impl Frame {
    /// Empty frame with no source file. Filled later through [`Frame::fill`].
    pub fn pending() -> Self {
        Self {
            data: Arc::new(Mutex::new(FrameData {
                pixels: Vec::new(),
                width: 0,
                height: 0,
                status: FrameStatus::Pending,
            })),
            filename: None,
        }
    }

    /// Unloaded frame that knows its source file
    pub fn new_unloaded(path: PathBuf) -> Self {
        Self {
            filename: Some(path),
            ..Self::pending()
        }
    }

    /// Already loaded frame from raw pixels
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Pixel>) -> Result<Self> {
        let frame = Self::pending();
        frame.fill(width, height, pixels)?;
        Ok(frame)
    }

    /// Get filename if set
    pub fn file(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, FrameData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomically claim frame for loading (Pending → Loading)
    ///
    /// Returns `false` if another worker already claimed it or it finished.
    fn try_claim_for_loading(&self) -> bool {
        let mut data = self.lock();
        if data.status == FrameStatus::Pending {
            data.status = FrameStatus::Loading;
            true
        } else {
            false
        }
    }

    /// Decode the source file into this frame.
    ///
    /// Marks the frame `Error` on failure so pollers stop waiting on it.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the frame has no source file
    /// - `Image` if the file cannot be opened or decoded
    pub fn load(&self) -> Result<()> {
        let path = self
            .filename
            .as_ref()
            .ok_or_else(|| SequenceError::InvalidArgument("frame has no source file".into()))?;

        if !self.try_claim_for_loading() {
            trace!("Frame {} already claimed, skipping", path.display());
            return Ok(());
        }

        debug!("Loading image: {}", path.display());
        let decoded = image::open(path).map(|img| img.to_rgba8());

        match decoded {
            Ok(rgba) => {
                let (width, height) = (rgba.width() as usize, rgba.height() as usize);
                let pixels: Vec<Pixel> = bytemuck::cast_slice(rgba.as_raw()).to_vec();
                self.store(width, height, pixels);
                debug!("Loaded {}: {}x{}", path.display(), width, height);
                Ok(())
            }
            Err(e) => {
                self.fail();
                Err(e.into())
            }
        }
    }

    /// Write decoded pixels. Pixel count must equal `width * height`.
    ///
    /// A frame is written once; filling a loaded frame, or one a worker is
    /// decoding, is rejected.
    pub fn fill(&self, width: usize, height: usize, pixels: Vec<Pixel>) -> Result<()> {
        let expected = width.checked_mul(height).ok_or_else(|| {
            SequenceError::InvalidArgument(format!("frame size {}x{} overflows", width, height))
        })?;
        if pixels.len() != expected {
            return Err(SequenceError::InvalidArgument(format!(
                "expected {} pixels for {}x{}, got {}",
                expected,
                width,
                height,
                pixels.len()
            )));
        }

        let mut data = self.lock();
        match data.status {
            FrameStatus::Loaded => Err(SequenceError::InvalidArgument(
                "frame is already loaded".into(),
            )),
            FrameStatus::Loading => Err(SequenceError::InvalidArgument(
                "frame is being decoded".into(),
            )),
            FrameStatus::Pending | FrameStatus::Error => {
                Self::write(&mut data, width, height, pixels);
                Ok(())
            }
        }
    }

    fn store(&self, width: usize, height: usize, pixels: Vec<Pixel>) {
        Self::write(&mut self.lock(), width, height, pixels);
    }

    fn write(data: &mut FrameData, width: usize, height: usize, pixels: Vec<Pixel>) {
        data.pixels = pixels;
        data.width = width;
        data.height = height;
        data.status = FrameStatus::Loaded;
    }

    /// Mark the frame as failed
    pub fn fail(&self) {
        self.lock().status = FrameStatus::Error;
    }

    /// Get status
    pub fn status(&self) -> FrameStatus {
        self.lock().status
    }

    /// Pixel data present with positive dimensions
    pub fn is_ready(&self) -> bool {
        let data = self.lock();
        data.status == FrameStatus::Loaded && data.width > 0 && data.height > 0
    }

    /// Get resolution as tuple, (0, 0) until loaded
    pub fn resolution(&self) -> (usize, usize) {
        let data = self.lock();
        (data.width, data.height)
    }

    /// Get pixels (cloned)
    pub fn pixels(&self) -> Vec<Pixel> {
        self.lock().pixels.clone()
    }

    /// Copy pixels into `dst` when sizes match. Returns whether a copy happened.
    pub(crate) fn copy_into(&self, dst: &mut [Pixel]) -> bool {
        let data = self.lock();
        if data.pixels.len() != dst.len() {
            return false;
        }
        dst.copy_from_slice(&data.pixels);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: pending frame is not ready and has no size
    #[test]
    fn test_pending_frame() {
        let frame = Frame::pending();

        assert_eq!(frame.status(), FrameStatus::Pending);
        assert!(!frame.is_ready());
        assert_eq!(frame.resolution(), (0, 0));
        assert!(frame.file().is_none());
    }

    /// Test: fill makes the frame ready, shared between clones
    #[test]
    fn test_fill_visible_through_clone() {
        let frame = Frame::pending();
        let loader_side = frame.clone();

        loader_side.fill(2, 1, vec![[1, 2, 3, 4], [5, 6, 7, 8]]).unwrap();

        assert!(frame.is_ready());
        assert_eq!(frame.resolution(), (2, 1));
        assert_eq!(frame.pixels(), vec![[1, 2, 3, 4], [5, 6, 7, 8]]);
    }

    /// Test: wrong pixel count and double fill are rejected
    #[test]
    fn test_fill_validation() {
        let frame = Frame::pending();
        assert!(matches!(
            frame.fill(2, 2, vec![[0; 4]; 3]),
            Err(SequenceError::InvalidArgument(_))
        ));
        assert!(!frame.is_ready());

        frame.fill(1, 1, vec![[9; 4]]).unwrap();
        assert!(frame.fill(1, 1, vec![[0; 4]]).is_err());
        assert_eq!(frame.pixels(), vec![[9; 4]]);
    }

    /// Test: concurrent fills on one frame, exactly one wins
    #[test]
    fn test_concurrent_fill_writes_once() {
        let frame = Frame::pending();
        let results: Vec<bool> = (0..8u8)
            .map(|i| {
                let frame = frame.clone();
                std::thread::spawn(move || frame.fill(1, 1, vec![[i; 4]]).is_ok())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        assert_eq!(results.iter().filter(|ok| **ok).count(), 1);
        let winner = results.iter().position(|ok| *ok).unwrap() as u8;
        assert_eq!(frame.pixels(), vec![[winner; 4]]);
    }

    /// Test: fill is rejected while a worker holds the frame
    #[test]
    fn test_fill_rejected_while_loading() {
        let frame = Frame::new_unloaded(PathBuf::from("shot.0001.png"));
        assert!(frame.try_claim_for_loading());

        assert!(matches!(
            frame.fill(1, 1, vec![[1; 4]]),
            Err(SequenceError::InvalidArgument(_))
        ));
        assert_eq!(frame.status(), FrameStatus::Loading);
    }

    /// Test: absurd dimensions are an error, not an overflow
    #[test]
    fn test_fill_size_overflow() {
        let frame = Frame::pending();
        assert!(matches!(
            frame.fill(usize::MAX, 2, Vec::new()),
            Err(SequenceError::InvalidArgument(_))
        ));
        assert_eq!(frame.status(), FrameStatus::Pending);
    }

    /// Test: zero-sized frame never counts as ready
    #[test]
    fn test_zero_size_not_ready() {
        let frame = Frame::from_pixels(0, 0, Vec::new()).unwrap();
        assert_eq!(frame.status(), FrameStatus::Loaded);
        assert!(!frame.is_ready());
    }

    /// Test: load missing file marks frame as Error
    #[test]
    fn test_load_missing_file() {
        let frame = Frame::new_unloaded(PathBuf::from("/nonexistent/path/test.png"));

        assert!(frame.load().is_err());
        assert_eq!(frame.status(), FrameStatus::Error);
        assert!(!frame.is_ready());
    }

    /// Test: load without a filename is an argument error
    #[test]
    fn test_load_without_file() {
        assert!(matches!(
            Frame::pending().load(),
            Err(SequenceError::InvalidArgument(_))
        ));
    }

    /// Test: load decodes a real PNG into RGBA pixels
    #[test]
    fn test_load_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let frame = Frame::new_unloaded(path);
        frame.load().unwrap();

        assert!(frame.is_ready());
        assert_eq!(frame.resolution(), (3, 2));
        assert_eq!(frame.pixels(), vec![[10, 20, 30, 255]; 6]);
    }

    /// Test: copy_into refuses mismatched buffers
    #[test]
    fn test_copy_into() {
        let frame = Frame::from_pixels(2, 1, vec![[1; 4], [2; 4]]).unwrap();

        let mut short = vec![[0; 4]; 1];
        assert!(!frame.copy_into(&mut short));
        assert_eq!(short, vec![[0; 4]]);

        let mut exact = vec![[0; 4]; 2];
        assert!(frame.copy_into(&mut exact));
        assert_eq!(exact, vec![[1; 4], [2; 4]]);
    }
}
