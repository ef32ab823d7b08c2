//! Error types for sequence initialization, loading and notification dispatch.
//!
//! Errors raised by caller-invoked operations (`init_*`, `set_tick_interval`)
//! are returned synchronously. Errors raised inside the scheduler thread never
//! cross into the caller: they are logged and reflected in the loading /
//! finished state instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::callbacks::SequenceEvent;

/// Everything that can go wrong while building or running a sequence.
#[derive(Debug, Error)]
pub enum SequenceError {
    /// Directory missing (or not a directory) at init time.
    #[error("the location is not valid: {}; check that the path exists and is a directory", .0.display())]
    InvalidPath(PathBuf),

    /// Zero frames to play. Reported by the scheduler, which then halts.
    #[error("no frames to play in sequence '{0}', call init again with a different image sequence")]
    EmptySequence(String),

    /// A notification handler returned an error or panicked.
    #[error("{event} handler failed: {reason}")]
    Notification { event: SequenceEvent, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("frame index {index} out of range for a sequence of {len} frames")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SequenceError>;
