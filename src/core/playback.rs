//! Playhead state: position plus two independent mode bits.
//!
//! `is_playing` and `is_looping` are independent; the effective mode is their
//! product (Stopped/Paused, Playing, Looping). Transitions that need frame
//! data (`jump`) live on `SequenceState`.

/// Default tick interval: 30 ticks per second, rounded down
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000 / 30;

/// Effective playback mode, derived from the two bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    Stopped,
    Paused,
    Playing,
    Looping,
}

/// Mutable playhead
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    pub current_frame: usize,
    pub is_playing: bool,
    pub is_looping: bool,
    /// Playhead sat on the last frame at the latest playing tick
    pub finished_playing: bool,
    /// Sequence still loading; cleared once all frames are ready
    pub loading: bool,
    pub tick_interval_ms: u64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_frame: 0,
            is_playing: false,
            is_looping: false,
            finished_playing: false,
            loading: false,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl PlaybackState {
    pub fn play(&mut self) {
        self.is_playing = true;
    }

    /// Pause keeps the playhead where it is
    pub fn pause(&mut self) {
        self.is_playing = false;
    }

    /// Stop rewinds to frame 0
    pub fn stop(&mut self) {
        self.is_playing = false;
        self.current_frame = 0;
    }

    /// Play and loop
    pub fn loop_play(&mut self) {
        self.is_playing = true;
        self.is_looping = true;
    }

    /// Enable looping without touching the play state
    pub fn set_loop_only(&mut self) {
        self.is_looping = true;
    }

    pub fn no_loop(&mut self) {
        self.is_looping = false;
    }

    pub fn toggle_play(&mut self) {
        self.is_playing = !self.is_playing;
    }

    pub fn mode(&self) -> PlaybackMode {
        match (self.is_playing, self.is_looping) {
            (true, true) => PlaybackMode::Looping,
            (true, false) => PlaybackMode::Playing,
            (false, _) if self.current_frame == 0 => PlaybackMode::Stopped,
            (false, _) => PlaybackMode::Paused,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = PlaybackState::default();
        assert_eq!(state.tick_interval_ms, 33);
        assert_eq!(state.mode(), PlaybackMode::Stopped);
        assert!(!state.loading);
    }

    #[test]
    fn test_pause_twice_keeps_frame() {
        let mut state = PlaybackState {
            current_frame: 4,
            is_playing: true,
            ..PlaybackState::default()
        };

        state.pause();
        state.pause();

        assert!(!state.is_playing);
        assert_eq!(state.current_frame, 4);
        assert_eq!(state.mode(), PlaybackMode::Paused);
    }

    #[test]
    fn test_stop_rewinds() {
        let mut state = PlaybackState {
            current_frame: 7,
            ..PlaybackState::default()
        };
        state.loop_play();
        assert_eq!(state.mode(), PlaybackMode::Looping);

        state.stop();
        assert!(!state.is_playing);
        assert!(state.is_looping);
        assert_eq!(state.current_frame, 0);
    }

    #[test]
    fn test_loop_bits_are_independent() {
        let mut state = PlaybackState::default();

        state.set_loop_only();
        assert!(state.is_looping);
        assert!(!state.is_playing);

        state.play();
        assert_eq!(state.mode(), PlaybackMode::Looping);

        state.no_loop();
        assert_eq!(state.mode(), PlaybackMode::Playing);

        state.toggle_play();
        assert!(!state.is_playing);
        state.toggle_play();
        assert!(state.is_playing);
    }
}
