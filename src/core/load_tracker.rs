//! Load progress tracking with one-shot lifecycle requests.
//!
//! Counts ready slots each poll and requests `FirstFrameReady` /
//! `SequenceLoaded` at most once per sequence. Requests are only raised when a
//! poll observes the condition, so they lag the real event by up to one tick.

use log::debug;

use super::callbacks::SequenceEvent;
use crate::entities::FrameSet;

/// Aggregate load state for one sequence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadTracker {
    loaded_count: usize,
    total_count: usize,
    progress: f32,
    first_frame_ready_fired: bool,
    sequence_loaded_fired: bool,
}

impl LoadTracker {
    /// Start tracking a sequence of `total` frames
    pub fn new(total: usize) -> Self {
        Self {
            total_count: total,
            ..Self::default()
        }
    }

    /// Poll `frames` and recompute progress.
    ///
    /// Returns the notifications this poll requests, first-frame before loaded.
    pub fn update(&mut self, frames: &mut FrameSet) -> Vec<SequenceEvent> {
        let mut requests = Vec::new();

        frames.poll_readiness();
        self.loaded_count = frames.ready_count();
        self.progress = if self.total_count == 0 {
            0.0
        } else {
            self.loaded_count as f32 / self.total_count as f32
        };

        if !self.first_frame_ready_fired && frames.slots().first().is_some_and(|s| s.is_ready()) {
            self.first_frame_ready_fired = true;
            requests.push(SequenceEvent::FirstFrameReady);
        }

        if !self.sequence_loaded_fired && self.total_count > 0 && self.loaded_count == self.total_count {
            self.sequence_loaded_fired = true;
            debug!("All {} frames loaded", self.total_count);
            requests.push(SequenceEvent::SequenceLoaded);
        }

        requests
    }

    /// Every frame observed ready
    pub fn is_complete(&self) -> bool {
        self.sequence_loaded_fired
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded_count
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// Fraction of frames ready, 0.0 for an empty sequence
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn first_frame_ready_fired(&self) -> bool {
        self.first_frame_ready_fired
    }

    pub fn sequence_loaded_fired(&self) -> bool {
        self.sequence_loaded_fired
    }
}
