//! Ordered frame slots plus the output buffer they are copied into.
//!
//! The set is fixed-length for a sequence's lifetime. The output buffer is
//! sized once, from frame 0, and assumes every frame shares that size.

use log::{debug, warn};

use super::frame::{Frame, Pixel};
use crate::error::{Result, SequenceError};

/// One element of the sequence: a bound frame and its observed readiness.
///
/// `ready` is monotone: once observed ready, a slot never reverts.
#[derive(Debug, Clone, Default)]
pub struct FrameSlot {
    frame: Option<Frame>,
    ready: bool,
    width: usize,
    height: usize,
}

impl FrameSlot {
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Observe the backing frame. Returns current readiness.
    fn poll(&mut self) -> bool {
        if !self.ready
            && let Some(frame) = &self.frame
            && frame.is_ready()
        {
            (self.width, self.height) = frame.resolution();
            self.ready = true;
        }
        self.ready
    }
}

/// Output pixels, written by playback and read by the owner between ticks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
}

impl OutputBuffer {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Whether dimensions are known yet
    pub fn is_sized(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Fixed-length slot collection plus output buffer
#[derive(Debug, Default)]
pub struct FrameSet {
    slots: Vec<FrameSlot>,
    output: OutputBuffer,
}

impl FrameSet {
    /// Allocate `n` empty slots and reset the output buffer to unsized.
    pub fn initialize(&mut self, n: usize) {
        self.slots = vec![FrameSlot::default(); n];
        self.output = OutputBuffer::default();
    }

    /// Associate slot `index` with `frame`.
    pub fn bind(&mut self, index: usize, frame: Frame) -> Result<()> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(SequenceError::IndexOutOfRange { index, len })?;
        *slot = FrameSlot {
            frame: Some(frame),
            ..FrameSlot::default()
        };
        Ok(())
    }

    /// Observe every slot's frame and update readiness.
    pub fn poll_readiness(&mut self) {
        for slot in &mut self.slots {
            slot.poll();
        }
    }

    /// Drop all slots and the output buffer.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.output = OutputBuffer::default();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[FrameSlot] {
        &self.slots
    }

    pub fn output(&self) -> &OutputBuffer {
        &self.output
    }

    /// Number of slots observed ready
    pub fn ready_count(&self) -> usize {
        self.slots.iter().filter(|s| s.ready).count()
    }

    /// Bound frame handles, in order
    pub fn frames(&self) -> Vec<Frame> {
        self.slots.iter().filter_map(|s| s.frame.clone()).collect()
    }

    /// Poll one slot. Out-of-range indices are never ready.
    pub fn poll_slot(&mut self, index: usize) -> bool {
        self.slots.get_mut(index).is_some_and(FrameSlot::poll)
    }

    /// Size the output buffer from frame 0, once per sequence.
    ///
    /// Returns `true` only on the call that performs the sizing.
    pub fn size_output_from_first(&mut self) -> bool {
        if self.output.is_sized() || !self.poll_slot(0) {
            return false;
        }
        let first = &self.slots[0];
        self.output = OutputBuffer {
            width: first.width,
            height: first.height,
            pixels: vec![[0; 4]; first.width * first.height],
        };
        debug!("Output buffer sized to {}x{}", first.width, first.height);
        true
    }

    /// Copy slot `index` into the output buffer.
    ///
    /// Requires a ready slot and a sized buffer of the same dimensions; a
    /// frame with different dimensions is skipped with a warning.
    pub fn copy_to_output(&mut self, index: usize) -> bool {
        if !self.output.is_sized() || !self.poll_slot(index) {
            return false;
        }
        let slot = &self.slots[index];
        if (slot.width, slot.height) != (self.output.width, self.output.height) {
            warn!(
                "Frame {} is {}x{}, output is {}x{}; frames must share one size",
                index, slot.width, slot.height, self.output.width, self.output.height
            );
            return false;
        }
        slot.frame
            .as_ref()
            .is_some_and(|frame| frame.copy_into(&mut self.output.pixels))
    }
}
