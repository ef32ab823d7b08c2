//! Background tick loop, one thread per active sequence.
//!
//! The only blocking point is the wait between ticks: a `select!` on a
//! shutdown channel with the tick interval as timeout. Dropping the shutdown
//! sender wakes the thread immediately, so dispose and reinit never wait out
//! a stale interval.
//!
//! Notifications requested by a tick are dispatched after the sequence lock
//! is released.

use std::ops::ControlFlow;
use std::thread;

use crossbeam_channel::{Receiver, Sender, bounded, select};
use log::{debug, error, info, trace};

use super::callbacks::Callbacks;
use super::sequence::SequenceHandle;
use crate::error::Result;

/// One tick plus notification dispatch, independent of the thread
#[derive(Debug)]
pub(crate) struct TickLoop {
    sequence: SequenceHandle,
    callbacks: Callbacks,
}

impl TickLoop {
    pub(crate) fn new(sequence: SequenceHandle, callbacks: Callbacks) -> Self {
        Self { sequence, callbacks }
    }

    /// Run one tick and dispatch what it requested
    pub(crate) fn step(&mut self) -> ControlFlow<()> {
        let outcome = self.sequence.tick();
        for event in outcome.events {
            info!("{} for '{}'", event, self.sequence.name());
            if let Err(e) = self.callbacks.notify(event, &self.sequence) {
                trace!("Notification dropped: {}", e);
            }
        }
        outcome.flow
    }

    fn run(mut self, shutdown: Receiver<()>) {
        loop {
            let stop = select! {
                recv(shutdown) -> _ => true,
                default(self.sequence.tick_interval()) => false,
            };
            if stop {
                trace!("Tick loop for '{}' shut down", self.sequence.name());
                break;
            }
            if self.step().is_break() {
                debug!("Tick loop for '{}' halted", self.sequence.name());
                break;
            }
        }
    }
}

/// Handle to a running tick thread. Dropping it stops and joins the thread.
#[derive(Debug)]
pub struct Scheduler {
    shutdown: Option<Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Scheduler {
    /// Spawn the tick thread for `sequence`
    pub fn spawn(sequence: SequenceHandle, callbacks: Callbacks) -> Result<Self> {
        let (tx, rx) = bounded::<()>(0);
        let name = sequence.name();
        let tick_loop = TickLoop::new(sequence, callbacks);

        // Thread names may not contain NUL
        let thread = thread::Builder::new()
            .name(format!("seqplay-tick-{}", name.replace('\0', "")))
            .spawn(move || tick_loop.run(rx))?;

        debug!("Scheduler started for '{}'", name);
        Ok(Self {
            shutdown: Some(tx),
            thread: Some(thread),
        })
    }

    /// Thread still ticking (false after a halt or shutdown)
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signal the thread and wait for it to exit. Idempotent.
    pub fn shutdown(&mut self) {
        // Disconnect wakes the select! immediately
        self.shutdown.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Tick thread panicked");
            }
            trace!("Scheduler joined");
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::callbacks::SequenceEvent;
    use crate::entities::Frame;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    fn solid(value: u8) -> Frame {
        Frame::from_pixels(2, 2, vec![[value; 4]; 4]).unwrap()
    }

    fn sequence(frames: Vec<Frame>, interval_ms: u64) -> SequenceHandle {
        let handle = SequenceHandle::new(interval_ms);
        handle.lock().reset(frames, "sched".into()).unwrap();
        handle
    }

    fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        cond()
    }

    #[test]
    fn test_step_dispatches_after_tick() {
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&finished);
        let callbacks = Callbacks::new()
            .on(SequenceEvent::FirstFrameReady, |seq| {
                // Lock is free while handlers run
                seq.loop_play();
                Ok(())
            })
            .on(SequenceEvent::SequenceFinished, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        let seq = sequence(vec![solid(1), solid(2)], 33);
        let mut tick_loop = TickLoop::new(seq.clone(), callbacks);

        // Tick 1: handler starts looping; advance happened before dispatch
        assert!(tick_loop.step().is_continue());
        assert!(seq.is_playing());
        assert_eq!(seq.current_frame(), 0);

        tick_loop.step(); // -> 1
        tick_loop.step(); // finished, -> 0
        tick_loop.step(); // -> 1
        tick_loop.step(); // finished, -> 0
        assert_eq!(finished.load(Ordering::SeqCst), 2);
        assert_eq!(seq.current_frame(), 0);
    }

    #[test]
    fn test_failing_handler_does_not_stop_loop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let callbacks = Callbacks::new().on(SequenceEvent::SequenceFinished, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("handler broke")
        });
        let seq = sequence(vec![solid(1), solid(2)], 33);
        seq.loop_play();
        let mut tick_loop = TickLoop::new(seq.clone(), callbacks);

        for _ in 0..10 {
            assert!(tick_loop.step().is_continue());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(seq.is_playing());
    }

    #[test]
    fn test_thread_plays_to_end() {
        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);
        let callbacks = Callbacks::new().on(SequenceEvent::SequenceFinished, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let seq = sequence(vec![solid(1), solid(2), solid(3)], 1);
        seq.play();

        let mut scheduler = Scheduler::spawn(seq.clone(), callbacks).unwrap();
        assert!(wait_until(Duration::from_secs(5), || done.load(Ordering::SeqCst) == 1));
        assert!(!seq.is_playing());
        assert_eq!(seq.current_frame(), 0);
        assert!(scheduler.is_running());

        scheduler.shutdown();
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_empty_sequence_thread_exits() {
        let seq = sequence(Vec::new(), 1);
        let scheduler = Scheduler::spawn(seq.clone(), Callbacks::new()).unwrap();

        assert!(wait_until(Duration::from_secs(5), || !scheduler.is_running()));
        assert!(!seq.is_loading());
        assert_eq!(seq.total_frames(), 0);
    }

    #[test]
    fn test_spawn_with_nul_in_name() {
        let seq = sequence(vec![solid(1)], 1);
        seq.set_name("shot\0a");

        let mut scheduler = Scheduler::spawn(seq.clone(), Callbacks::new()).unwrap();
        assert!(scheduler.is_running());
        assert_eq!(seq.name(), "shot\0a");
        scheduler.shutdown();
    }

    #[test]
    fn test_shutdown_interrupts_long_interval() {
        let seq = sequence(vec![solid(1)], 60_000);
        let mut scheduler = Scheduler::spawn(seq, Callbacks::new()).unwrap();

        let started = Instant::now();
        scheduler.shutdown();
        assert!(started.elapsed() < Duration::from_secs(5));
        scheduler.shutdown();
    }
}
