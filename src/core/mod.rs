//! Core engine modules - sequence state, tick loop, notifications, workers
//!
//! These modules form the playback engine, independent of any display.

pub mod callbacks;
pub mod load_tracker;
pub mod playback;
pub mod player;
pub mod scheduler;
pub mod sequence;
pub mod workers;

// Re-exports for convenience
pub use callbacks::{Callbacks, Handler, SequenceEvent};
pub use load_tracker::LoadTracker;
pub use playback::{PlaybackMode, PlaybackState};
pub use player::Player;
pub use scheduler::Scheduler;
pub use sequence::{SequenceHandle, SequenceState};
pub use workers::Workers;
