//! Progress and cancellation sink polled during import

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

pub trait WaitingHandler: Send + Sync {
    /// Total number of steps of the current phase
    fn set_max(&self, max: u64);

    fn increment(&self);

    fn is_canceled(&self) -> bool;

    fn set_message(&self, _message: &str) {}

    fn finish(&self) {}
}

/// Handler that reports nothing and never cancels
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentHandler;

impl WaitingHandler for SilentHandler {
    fn set_max(&self, _max: u64) {}

    fn increment(&self) {}

    fn is_canceled(&self) -> bool {
        false
    }
}

/// Counting handler with a cancel switch, usable from another thread
#[derive(Debug, Default)]
pub struct CancellationToken {
    canceled: AtomicBool,
    max: AtomicU64,
    progress: AtomicU64,
    /// Cancel automatically once this many steps were reported
    cancel_after: Option<u64>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel_after(steps: u64) -> Self {
        Self {
            cancel_after: Some(steps),
            ..Default::default()
        }
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn progress(&self) -> u64 {
        self.progress.load(Ordering::Relaxed)
    }

    pub fn max(&self) -> u64 {
        self.max.load(Ordering::Relaxed)
    }
}

impl WaitingHandler for CancellationToken {
    fn set_max(&self, max: u64) {
        self.max.store(max, Ordering::Relaxed);
        self.progress.store(0, Ordering::Relaxed);
    }

    fn increment(&self) {
        let done = self.progress.fetch_add(1, Ordering::Relaxed) + 1;
        if self.cancel_after.is_some_and(|limit| done >= limit) {
            self.cancel();
        }
    }

    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}
