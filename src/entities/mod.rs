//! Sequence data: frames, the slot collection, and the image loader.

pub mod frame;
pub mod frame_set;
pub mod loader;
pub mod traits;

pub use frame::{Frame, FrameStatus, Pixel};
pub use frame_set::{FrameSet, FrameSlot, OutputBuffer};
pub use loader::ImageLoader;
pub use traits::WorkerPool;
