//! Image sequence player: lifecycle and control surface
//!
//! **Architecture**: Player owns the lifecycle (init, reinit, dispose) and the
//! tick thread. The playhead itself lives in a [`SequenceHandle`] shared with
//! that thread; every control call here forwards to it.
//!
//! **Why**: frames become ready at unpredictable times on worker threads,
//! while commands arrive from the caller. Splitting lifecycle from state
//! means a notification handler can drive playback through the handle but
//! can never dispose the player from inside its own tick thread.
//!
//! # Timing Model
//!
//! Tick-based: one frame advance per tick, ticks every `tick_interval_ms`.
//! No wall-clock catch-up. If a frame is not loaded yet the playhead still
//! moves and the output keeps showing the last good frame.
//!
//! # Lifecycle
//!
//! `init_*` tears down any previous sequence first (stop + join the tick
//! thread, skip its queued decodes, drop its frames), so two tick loops
//! never share one output buffer. `dispose()` does the same teardown and
//! leaves the player ready for another `init_*`. Drop disposes.

use log::{debug, info};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use super::callbacks::Callbacks;
use super::playback::PlaybackMode;
use super::scheduler::Scheduler;
use super::sequence::SequenceHandle;
use super::workers::Workers;
use crate::config::PlayerConfig;
use crate::entities::{Frame, ImageLoader, OutputBuffer};
use crate::error::Result;
use crate::utils::media;

/// Playback controller for one image sequence at a time
#[derive(Debug)]
pub struct Player {
    sequence: SequenceHandle,
    callbacks: Callbacks,
    loader: Option<ImageLoader>, // Created on first folder init
    scheduler: Option<Scheduler>,
    config: PlayerConfig,
}

impl Player {
    /// Create a player with no notification handlers
    pub fn new(config: PlayerConfig) -> Self {
        Self::with_callbacks(config, Callbacks::new())
    }

    /// Create a player that reports lifecycle events to `callbacks`
    pub fn with_callbacks(config: PlayerConfig, callbacks: Callbacks) -> Self {
        let sequence = SequenceHandle::new(config.tick_interval_ms);
        if config.looping {
            sequence.set_loop_only();
        }
        debug!("Player created: {:?}, {:?}", config, callbacks);

        Self {
            sequence,
            callbacks,
            loader: None,
            scheduler: None,
            config,
        }
    }

    /// Load every supported image in `dir` asynchronously and start ticking.
    ///
    /// The sequence is named after the folder. On error the previous
    /// sequence (if any) keeps running.
    ///
    /// # Errors
    ///
    /// - `InvalidPath` if `dir` does not exist
    /// - `Io` if the folder cannot be read or threads cannot be spawned
    pub fn init_from_folder(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        let paths = media::scan_folder(dir)?;
        let name = media::folder_name(dir);

        self.teardown();
        let frames = self.loader()?.request_all(&paths);
        info!("Loading '{}': {} frames from {}", name, frames.len(), dir.display());
        self.start(frames, name)
    }

    /// Play already requested or loaded frames.
    ///
    /// Frames may still be pending; they are polled like folder loads.
    pub fn init_from_frames(&mut self, frames: Vec<Frame>, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.teardown();
        info!("Initializing '{}' from {} frames", name, frames.len());
        self.start(frames, name)
    }

    fn loader(&mut self) -> Result<&ImageLoader> {
        let loader = match self.loader.take() {
            Some(loader) => loader,
            None => {
                let epoch = Arc::new(AtomicU64::new(0));
                let workers = Workers::new(self.config.worker_threads(), Arc::clone(&epoch))?;
                ImageLoader::new(Arc::new(workers), epoch)
            }
        };
        Ok(self.loader.insert(loader))
    }

    fn start(&mut self, frames: Vec<Frame>, name: String) -> Result<()> {
        self.sequence.lock().reset(frames, name)?;
        if self.config.autoplay {
            self.sequence.play();
        }
        self.scheduler = Some(Scheduler::spawn(self.sequence.clone(), self.callbacks.fresh())?);
        Ok(())
    }

    /// Stop the tick thread, skip queued decodes, drop frame references
    fn teardown(&mut self) {
        if let Some(mut scheduler) = self.scheduler.take() {
            scheduler.shutdown();
        }
        if let Some(loader) = &self.loader {
            loader.cancel_pending();
        }
        self.sequence.lock().clear();
    }

    /// Terminate playback and release the sequence. Safe to call twice;
    /// the player can be initialized again afterwards.
    pub fn dispose(&mut self) {
        if self.scheduler.is_some() {
            info!("Disposing '{}'", self.sequence.name());
        }
        self.teardown();
    }

    /// Tick thread alive (false before init, after dispose, or after an
    /// empty sequence halted it)
    pub fn is_running(&self) -> bool {
        self.scheduler.as_ref().is_some_and(Scheduler::is_running)
    }

    /// Cloneable handle onto the same sequence, e.g. for another thread
    pub fn handle(&self) -> &SequenceHandle {
        &self.sequence
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    // === Commands ===

    pub fn play(&self) {
        self.sequence.play();
    }

    pub fn pause(&self) {
        self.sequence.pause();
    }

    /// Stop and rewind to frame 0
    pub fn stop(&self) {
        self.sequence.stop();
    }

    /// Play and loop
    pub fn loop_play(&self) {
        self.sequence.loop_play();
    }

    /// Enable looping without starting playback
    pub fn set_loop_only(&self) {
        self.sequence.set_loop_only();
    }

    pub fn no_loop(&self) {
        self.sequence.no_loop();
    }

    pub fn toggle_play(&self) {
        self.sequence.toggle_play();
    }

    /// Jump to `index`; out-of-range indices are ignored
    pub fn jump(&self, index: usize) {
        self.sequence.jump(index);
    }

    /// Set tick interval in milliseconds; rejects values below 1
    pub fn set_tick_interval(&self, ms: i64) -> Result<()> {
        self.sequence.set_tick_interval(ms)
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.sequence.set_name(name);
    }

    // === Accessors ===

    pub fn is_playing(&self) -> bool {
        self.sequence.is_playing()
    }

    pub fn is_looping(&self) -> bool {
        self.sequence.is_looping()
    }

    pub fn is_loading(&self) -> bool {
        self.sequence.is_loading()
    }

    pub fn has_finished_playing(&self) -> bool {
        self.sequence.has_finished_playing()
    }

    pub fn mode(&self) -> PlaybackMode {
        self.sequence.mode()
    }

    pub fn current_frame(&self) -> usize {
        self.sequence.current_frame()
    }

    pub fn total_frames(&self) -> usize {
        self.sequence.total_frames()
    }

    pub fn load_progress(&self) -> f32 {
        self.sequence.load_progress()
    }

    pub fn name(&self) -> String {
        self.sequence.name()
    }

    pub fn tick_interval_ms(&self) -> u64 {
        self.sequence.tick_interval_ms()
    }

    /// Snapshot of the output buffer
    pub fn output(&self) -> OutputBuffer {
        self.sequence.output()
    }

    /// Borrow the output buffer under the sequence lock
    pub fn with_output<R>(&self, f: impl FnOnce(&OutputBuffer) -> R) -> R {
        self.sequence.with_output(f)
    }

    /// Frame handles of the current sequence
    pub fn frames(&self) -> Vec<Frame> {
        self.sequence.frames()
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new(PlayerConfig::default())
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[Player name={}]", self.name())
    }
}
