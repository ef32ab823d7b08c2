//! Lifecycle notifications and the handler registry.
//!
//! Handlers are plain closures registered before the player is built. The
//! registry calls them on the scheduler thread, outside the sequence lock,
//! so a handler may drive playback through the handle it receives.
//!
//! A handler that returns an error or panics is disabled for the rest of the
//! sequence. Every sequence gets a fresh copy of the registry, so a new
//! `init_*` re-enables it.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use log::{trace, warn};

use super::sequence::SequenceHandle;
use crate::error::{Result, SequenceError};

/// The three one-shot lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceEvent {
    /// Frame 0 reported positive dimensions
    FirstFrameReady,
    /// Every frame is ready
    SequenceLoaded,
    /// Playhead reached the last frame (fires once per lap when looping)
    SequenceFinished,
}

impl fmt::Display for SequenceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SequenceEvent::FirstFrameReady => "FirstFrameReady",
            SequenceEvent::SequenceLoaded => "SequenceLoaded",
            SequenceEvent::SequenceFinished => "SequenceFinished",
        };
        f.write_str(name)
    }
}

/// Notification handler
pub type Handler = Arc<dyn Fn(&SequenceHandle) -> anyhow::Result<()> + Send + Sync>;

/// Handler registry: call-or-no-op, disable-on-failure
#[derive(Clone, Default)]
pub struct Callbacks {
    handlers: HashMap<SequenceEvent, Handler>,
    disabled: HashSet<SequenceEvent>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event`, replacing any previous one.
    ///
    /// ```ignore
    /// let callbacks = Callbacks::new()
    ///     .on(SequenceEvent::FirstFrameReady, |seq| {
    ///         seq.play();
    ///         Ok(())
    ///     });
    /// ```
    pub fn on<F>(mut self, event: SequenceEvent, handler: F) -> Self
    where
        F: Fn(&SequenceHandle) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handlers.insert(event, Arc::new(handler));
        self
    }

    /// Handler registered and not disabled
    pub fn has_handler(&self, event: SequenceEvent) -> bool {
        self.handlers.contains_key(&event) && !self.disabled.contains(&event)
    }

    pub fn is_disabled(&self, event: SequenceEvent) -> bool {
        self.disabled.contains(&event)
    }

    /// Copy of the registry with every handler enabled
    pub(crate) fn fresh(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
            disabled: HashSet::new(),
        }
    }

    /// Invoke the handler for `event`, if any.
    ///
    /// A missing or disabled handler is `Ok(())`. A failing handler is
    /// disabled, logged, and reported as `SequenceError::Notification`.
    pub fn notify(&mut self, event: SequenceEvent, sequence: &SequenceHandle) -> Result<()> {
        if self.disabled.contains(&event) {
            return Ok(());
        }
        let Some(handler) = self.handlers.get(&event).cloned() else {
            trace!("No {} handler registered", event);
            return Ok(());
        };

        let reason = match catch_unwind(AssertUnwindSafe(|| handler(sequence))) {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => format!("{:#}", e),
            Err(payload) => panic_message(payload.as_ref()),
        };

        self.disabled.insert(event);
        warn!("Error, disabling {} handler: {}", event, reason);
        Err(SequenceError::Notification { event, reason })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("registered", &self.handlers.keys().collect::<Vec<_>>())
            .field("disabled", &self.disabled)
            .finish()
    }
}
