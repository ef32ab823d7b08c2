//! SEQPLAY - Image sequence playback engine
//!
//! Re-exports all modules for use by the binary target.

// Core engine (sequence, tick loop, notifications, workers)
pub mod core;

pub mod cli;
pub mod config;
pub mod entities;
pub mod error;
pub mod utils;

// Re-export commonly used types from core
pub use core::callbacks::{Callbacks, SequenceEvent};
pub use core::player::Player;
pub use core::sequence::SequenceHandle;

pub use config::PlayerConfig;
pub use entities::{Frame, OutputBuffer};
pub use error::{Result, SequenceError};
