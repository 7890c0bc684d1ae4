//! Ctrl-C handling for `wait`
//!
//! The first interrupt asks the poll loop to stop after the current
//! request; the remote job is left running. A second interrupt exits the
//! process immediately with the interrupted exit code.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::FailureKind;

/// Granularity of interruptible sleeps
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Shared interrupt flags
#[derive(Debug, Default)]
pub struct InterruptState {
    stop_requested: AtomicBool,
    signal_count: AtomicU8,
}

impl InterruptState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    pub fn signal_count(&self) -> u8 {
        self.signal_count.load(Ordering::SeqCst)
    }

    /// Record one interrupt and say what to do about it.
    pub fn handle_signal(&self) -> SignalAction {
        let count = self.signal_count.fetch_add(1, Ordering::SeqCst);
        match count {
            0 => {
                self.stop_requested.store(true, Ordering::SeqCst);
                SignalAction::StopPolling
            }
            1 => SignalAction::ImmediateExit,
            _ => SignalAction::Ignore,
        }
    }
}

/// Action to take after an interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// First interrupt: finish the current request, then stop
    StopPolling,
    /// Second interrupt: exit now
    ImmediateExit,
    Ignore,
}

/// Interrupt token handed to the poll loop
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    state: Arc<InterruptState>,
}

impl Interrupt {
    /// A token nothing will trigger except `trigger()`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the process-wide Ctrl-C handler. Call at most once.
    pub fn install() -> Result<Self, ctrlc::Error> {
        let interrupt = Self::new();
        let state = Arc::clone(&interrupt.state);
        ctrlc::set_handler(move || match state.handle_signal() {
            SignalAction::StopPolling => {
                eprintln!("\nInterrupted; the remote job keeps running. Press Ctrl-C again to exit now.");
            }
            SignalAction::ImmediateExit => {
                std::process::exit(FailureKind::Interrupted as i32);
            }
            SignalAction::Ignore => {}
        })?;
        Ok(interrupt)
    }

    /// Simulate an interrupt.
    pub fn trigger(&self) -> SignalAction {
        self.state.handle_signal()
    }

    pub fn is_set(&self) -> bool {
        self.state.is_stop_requested()
    }

    /// Sleep for `duration` in short slices. Returns false if interrupted.
    pub fn sleep(&self, duration: Duration) -> bool {
        let start = Instant::now();
        while !self.is_set() {
            let elapsed = start.elapsed();
            if elapsed >= duration {
                return true;
            }
            std::thread::sleep(SLEEP_SLICE.min(duration - elapsed));
        }
        false
    }
}
