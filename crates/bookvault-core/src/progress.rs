//! Progress reporting and cooperative cancellation
//!
//! The pipeline consumes this contract, it never implements it: callers
//! bring their own listener, typically marshalling progress back to a UI
//! thread. Cancellation is cooperative only; it is polled at least once per
//! record, and a cancellation mid-record completes that record's I/O first.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Progress sink plus cancellation flag for long-running operations
pub trait ProgressListener {
    /// Announce the expected total before a record loop starts
    fn set_max(&self, max: usize);

    /// Report an absolute position
    fn on_progress(&self, position: usize, message: &str);

    /// Advance the position by a delta
    fn on_progress_step(&self, delta: usize, message: &str);

    /// Poll for cancellation
    fn is_cancelled(&self) -> bool;
}

/// Listener that discards progress and never cancels
#[derive(Debug, Default, Clone, Copy)]
pub struct NullListener;

impl ProgressListener for NullListener {
    fn set_max(&self, _max: usize) {}
    fn on_progress(&self, _position: usize, _message: &str) {}
    fn on_progress_step(&self, _delta: usize, _message: &str) {}
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Closure-backed listener with a shareable cancellation flag
pub struct CallbackListener {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
    max: AtomicUsize,
    position: AtomicUsize,
    cancelled: Arc<AtomicBool>,
}

impl CallbackListener {
    /// Create a listener from a `(position, max, message)` callback
    pub fn new(callback: impl Fn(usize, usize, &str) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
            max: AtomicUsize::new(0),
            position: AtomicUsize::new(0),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Use an externally owned cancellation flag
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = flag;
        self
    }

    /// The cancellation flag; set it to true to request a stop
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }
}

impl ProgressListener for CallbackListener {
    fn set_max(&self, max: usize) {
        self.max.store(max, Ordering::Relaxed);
        self.position.store(0, Ordering::Relaxed);
    }

    fn on_progress(&self, position: usize, message: &str) {
        self.position.store(position, Ordering::Relaxed);
        (self.callback)(position, self.max.load(Ordering::Relaxed), message);
    }

    fn on_progress_step(&self, delta: usize, message: &str) {
        let position = self.position.fetch_add(delta, Ordering::Relaxed) + delta;
        (self.callback)(position, self.max.load(Ordering::Relaxed), message);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
