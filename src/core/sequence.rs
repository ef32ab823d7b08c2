//! Sequence state shared between the scheduler and the caller.
//!
//! **Why**: the tick and external commands (play/stop/jump/...) mutate the
//! same playhead and output buffer from different threads. Everything lives
//! in one `SequenceState` behind one mutex; each command and each tick step
//! holds it for its whole duration, so a reader never sees a half-copied
//! frame and a `stop()` racing the tick cannot be lost.
//!
//! **Used by**: Scheduler (tick), Player (lifecycle), notification handlers
//!
//! # Tick
//!
//! 1. Poll load progress until every frame is ready
//! 2. Halt on an empty sequence
//! 3. Size the output buffer once frame 0 is ready
//! 4. If playing, advance one frame; at the last frame request
//!    `SequenceFinished` then rewind (looping) or stop
//!
//! Exactly one advance per tick: no elapsed-time catch-up.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, trace, warn};

use super::callbacks::SequenceEvent;
use super::load_tracker::LoadTracker;
use super::playback::{PlaybackMode, PlaybackState};
use crate::entities::{Frame, FrameSet, OutputBuffer};
use crate::error::{Result, SequenceError};

/// Everything one sequence mutates, guarded as a unit
#[derive(Debug, Default)]
pub struct SequenceState {
    name: String,
    frames: FrameSet,
    tracker: LoadTracker,
    playback: PlaybackState,
    empty_reported: bool,
}

/// Result of one tick step: notifications to dispatch and whether to go on
#[derive(Debug)]
pub(crate) struct TickOutcome {
    pub events: Vec<SequenceEvent>,
    pub flow: ControlFlow<()>,
}

impl SequenceState {
    /// Replace the sequence with `frames`. Playback stops; loop mode and
    /// tick interval carry over.
    pub(crate) fn reset(&mut self, frames: Vec<Frame>, name: String) -> Result<()> {
        let n = frames.len();
        self.frames.initialize(n);
        for (i, frame) in frames.into_iter().enumerate() {
            self.frames.bind(i, frame)?;
        }
        self.tracker = LoadTracker::new(n);
        self.playback.stop();
        self.playback.finished_playing = false;
        self.playback.loading = n > 0;
        self.name = name;
        self.empty_reported = false;
        Ok(())
    }

    /// Stop and drop every frame reference
    pub(crate) fn clear(&mut self) {
        self.playback.stop();
        self.playback.finished_playing = false;
        self.playback.loading = false;
        self.frames.clear();
        self.tracker = LoadTracker::new(0);
    }

    /// Move the playhead to `index` and show that frame if it is ready.
    ///
    /// Out-of-range indices are ignored.
    pub(crate) fn jump(&mut self, index: usize) {
        let len = self.frames.len();
        if index >= len {
            trace!("Ignoring jump to {} (sequence has {} frames)", index, len);
            return;
        }
        self.playback.current_frame = index;
        self.frames.size_output_from_first();

        if self.frames.poll_slot(index) {
            self.frames.copy_to_output(index);
            if index == len - 1 {
                self.playback.loading = false;
            }
        }
    }

    /// One scheduler step
    pub(crate) fn tick(&mut self) -> TickOutcome {
        let mut events = Vec::new();

        if !self.tracker.is_complete() && !self.frames.is_empty() {
            events.extend(self.tracker.update(&mut self.frames));
            if self.tracker.is_complete() {
                self.playback.loading = false;
            }
        }

        if self.frames.is_empty() {
            if !self.empty_reported {
                warn!("{}", SequenceError::EmptySequence(self.name.clone()));
                self.empty_reported = true;
            }
            self.playback.stop();
            return TickOutcome {
                events,
                flow: ControlFlow::Break(()),
            };
        }

        self.frames.size_output_from_first();

        if self.playback.is_playing {
            let last = self.frames.len() - 1;
            self.playback.finished_playing = self.playback.current_frame == last;

            if self.playback.finished_playing {
                events.push(SequenceEvent::SequenceFinished);
                if self.playback.is_looping {
                    trace!("Frame loop: {} -> 0", last);
                    self.jump(0);
                } else {
                    trace!("Reached end of '{}', stopping", self.name);
                    self.playback.stop();
                }
            } else {
                self.jump(self.playback.current_frame + 1);
            }
        }

        TickOutcome {
            events,
            flow: ControlFlow::Continue(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frames(&self) -> &FrameSet {
        &self.frames
    }

    pub fn tracker(&self) -> &LoadTracker {
        &self.tracker
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }
}

/// Cloneable control handle onto one player's sequence state.
///
/// Handed to notification handlers; every call takes the state lock.
#[derive(Debug, Clone, Default)]
pub struct SequenceHandle {
    state: Arc<Mutex<SequenceState>>,
}

impl SequenceHandle {
    pub fn new(tick_interval_ms: u64) -> Self {
        let handle = Self::default();
        handle.lock().playback.tick_interval_ms = tick_interval_ms.max(1);
        handle
    }

    /// Lock the state. A poisoned lock is recovered: the state is plain data.
    pub(crate) fn lock(&self) -> MutexGuard<'_, SequenceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // === Commands ===

    pub fn play(&self) {
        self.lock().playback.play();
    }

    pub fn pause(&self) {
        self.lock().playback.pause();
    }

    pub fn stop(&self) {
        self.lock().playback.stop();
    }

    /// Play and loop
    pub fn loop_play(&self) {
        self.lock().playback.loop_play();
    }

    pub fn set_loop_only(&self) {
        self.lock().playback.set_loop_only();
    }

    pub fn no_loop(&self) {
        self.lock().playback.no_loop();
    }

    pub fn toggle_play(&self) {
        self.lock().playback.toggle_play();
    }

    /// Jump to `index`; ignored when out of range
    pub fn jump(&self, index: usize) {
        self.lock().jump(index);
    }

    /// Set the tick interval. Takes effect at the next wait.
    pub fn set_tick_interval(&self, ms: i64) -> Result<()> {
        if ms <= 0 {
            return Err(SequenceError::InvalidArgument(format!(
                "tick interval must be positive, got {}ms",
                ms
            )));
        }
        self.lock().playback.tick_interval_ms = ms as u64;
        debug!("Tick interval set to {}ms", ms);
        Ok(())
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.lock().name = name.into();
    }

    // === Accessors ===

    pub fn is_playing(&self) -> bool {
        self.lock().playback().is_playing
    }

    pub fn is_looping(&self) -> bool {
        self.lock().playback().is_looping
    }

    pub fn is_loading(&self) -> bool {
        self.lock().playback().loading
    }

    pub fn has_finished_playing(&self) -> bool {
        self.lock().playback().finished_playing
    }

    pub fn mode(&self) -> PlaybackMode {
        self.lock().playback().mode()
    }

    pub fn current_frame(&self) -> usize {
        self.lock().playback().current_frame
    }

    pub fn total_frames(&self) -> usize {
        self.lock().frames().len()
    }

    /// Fraction of frames ready, as of the latest tick
    pub fn load_progress(&self) -> f32 {
        self.lock().tracker().progress()
    }

    pub fn name(&self) -> String {
        self.lock().name().to_owned()
    }

    pub fn tick_interval_ms(&self) -> u64 {
        self.lock().playback().tick_interval_ms
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms())
    }

    /// Snapshot of the output buffer
    pub fn output(&self) -> OutputBuffer {
        self.lock().frames().output().clone()
    }

    /// Borrow the output buffer without copying. Holds the state lock, so
    /// keep `f` short and do not call back into the handle.
    pub fn with_output<R>(&self, f: impl FnOnce(&OutputBuffer) -> R) -> R {
        f(self.lock().frames().output())
    }

    /// Bound frame handles, in order
    pub fn frames(&self) -> Vec<Frame> {
        self.lock().frames().frames()
    }

    /// Run one tick step under the lock
    pub(crate) fn tick(&self) -> TickOutcome {
        self.lock().tick()
    }
}
