//! UI context capability
//!
//! UI objects belong to one thread. The animation engine times its work on a
//! background thread but only ever touches targets through a [`UiContext`],
//! which runs tasks on the owning thread and reports failures there.
//!
//! [`Dispatcher`] is the bundled context: a FIFO of tasks that the owning
//! thread drains with [`Dispatcher::run_pending`]. A host event loop installs
//! a wake callback so it knows when to drain, the same way an event loop
//! proxy is woken from an animation thread.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::StepError;

/// Work dispatched onto the owning thread
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Callback used to wake the owning thread's event loop
pub type WakeCallback = Arc<dyn Fn() + Send + Sync>;

/// Receiver for failures of dispatched work
pub type ErrorHandler = Arc<dyn Fn(&StepError) + Send + Sync>;

/// Ticks per second. One tick is one millisecond.
pub const TICKS_PER_SECOND: i64 = 1_000;

/// Convert a duration to ticks, saturating at `i64::MAX`
pub fn duration_to_ticks(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// The thread-owning context the engine applies values through
pub trait UiContext: Send + Sync {
    /// Current time in ticks since an arbitrary, fixed epoch
    fn now_ticks(&self) -> i64;

    /// Run `task` on the owning thread, without waiting for it
    fn run_async(&self, task: Task);

    /// Surface a failure that escaped a dispatched task
    fn report_error(&self, error: StepError);
}

// ─────────────────────────────────────────────────────────────────────────────
// Clocks
// ─────────────────────────────────────────────────────────────────────────────

/// Monotonic tick source
pub trait Clock: Send + Sync {
    fn now_ticks(&self) -> i64;
}

/// Wall clock, counting milliseconds since construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ticks(&self) -> i64 {
        duration_to_ticks(self.epoch.elapsed())
    }
}

/// Clock driven by hand, for tests and deterministic playback
///
/// With an auto-advance step every reading moves time forward by that step,
/// which models a clock that is "checked" once per animation step.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
    auto_step: AtomicI64,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
            auto_step: AtomicI64::new(0),
        }
    }

    /// Clock that advances by `step` ticks after each reading
    pub fn with_auto_advance(start: i64, step: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
            auto_step: AtomicI64::new(step),
        }
    }

    pub fn set(&self, ticks: i64) {
        self.now.store(ticks, Ordering::SeqCst);
    }

    pub fn advance(&self, ticks: i64) {
        self.now.fetch_add(ticks, Ordering::SeqCst);
    }

    pub fn set_auto_advance(&self, step: i64) {
        self.auto_step.store(step, Ordering::SeqCst);
    }

    /// Current time without triggering auto-advance
    pub fn peek(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl Clock for ManualClock {
    fn now_ticks(&self) -> i64 {
        let step = self.auto_step.load(Ordering::SeqCst);
        self.now.fetch_add(step, Ordering::SeqCst)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────────────────────────────────────

/// Task queue drained by the owning thread
pub struct Dispatcher {
    clock: Arc<dyn Clock>,
    queue: Mutex<VecDeque<Task>>,
    available: Condvar,
    wake_callback: Option<WakeCallback>,
    error_handler: Option<ErrorHandler>,
}

impl Dispatcher {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            wake_callback: None,
            error_handler: None,
        }
    }

    /// Dispatcher timed by a [`SystemClock`]
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock::new()))
    }

    /// Set a callback invoked whenever a task is queued
    ///
    /// The callback runs on the queuing thread. Use it to wake an event loop
    /// that will then call [`run_pending`](Self::run_pending).
    pub fn with_wake_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.wake_callback = Some(Arc::new(callback));
        self
    }

    /// Set a handler for failures reported through this context
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&StepError) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Number of queued tasks
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Run every task queued so far, in order
    ///
    /// Tasks queued while this runs are left for the next call. A panicking
    /// task is reported and does not stop the others. Returns the number of
    /// tasks executed.
    pub fn run_pending(&self) -> usize {
        let batch = std::mem::take(&mut *self.queue.lock());
        let count = batch.len();
        for task in batch {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
                self.report_error(StepError::from_panic(payload));
            }
        }
        count
    }

    /// Block until a task is queued or `timeout` passes, then run pending tasks
    pub fn wait_and_run(&self, timeout: Duration) -> usize {
        {
            let mut queue = self.queue.lock();
            if queue.is_empty() {
                let _ = self.available.wait_for(&mut queue, timeout);
            }
        }
        self.run_pending()
    }
}

impl UiContext for Dispatcher {
    fn now_ticks(&self) -> i64 {
        self.clock.now_ticks()
    }

    fn run_async(&self, task: Task) {
        self.queue.lock().push_back(task);
        self.available.notify_all();
        if let Some(ref wake) = self.wake_callback {
            wake();
        }
    }

    fn report_error(&self, error: StepError) {
        tracing::error!("animation step failed: {}", error);
        if let Some(ref handler) = self.error_handler {
            handler(&error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_manual_clock_auto_advance() {
        let clock = ManualClock::with_auto_advance(100, 10);
        assert_eq!(clock.now_ticks(), 100);
        assert_eq!(clock.now_ticks(), 110);
        assert_eq!(clock.peek(), 120);

        clock.set_auto_advance(0);
        clock.advance(5);
        assert_eq!(clock.now_ticks(), 125);
        assert_eq!(clock.now_ticks(), 125);
    }

    #[test]
    fn test_duration_to_ticks() {
        assert_eq!(duration_to_ticks(Duration::from_millis(150)), 150);
        assert_eq!(duration_to_ticks(Duration::from_secs(2)), 2 * TICKS_PER_SECOND);
        assert_eq!(duration_to_ticks(Duration::MAX), i64::MAX);
    }

    #[test]
    fn test_dispatcher_runs_in_order() {
        let dispatcher = Dispatcher::new(Arc::new(ManualClock::new(0)));
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let log = Arc::clone(&log);
            dispatcher.run_async(Box::new(move || log.lock().push(i)));
        }
        assert_eq!(dispatcher.pending(), 3);
        assert_eq!(dispatcher.run_pending(), 3);
        assert_eq!(*log.lock(), vec![0, 1, 2]);
        assert_eq!(dispatcher.pending(), 0);
    }

    #[test]
    fn test_dispatcher_wakes_and_reports() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = {
            let wakes = Arc::clone(&wakes);
            let errors = Arc::clone(&errors);
            Dispatcher::new(Arc::new(ManualClock::new(0)))
                .with_wake_callback(move || {
                    wakes.fetch_add(1, Ordering::SeqCst);
                })
                .with_error_handler(move |e| errors.lock().push(e.clone()))
        };

        dispatcher.run_async(Box::new(|| panic!("boom")));
        dispatcher.run_async(Box::new(|| {}));
        assert_eq!(wakes.load(Ordering::SeqCst), 2);

        assert_eq!(dispatcher.run_pending(), 2);
        assert_eq!(*errors.lock(), vec![StepError::Panicked("boom".into())]);
    }

    #[test]
    fn test_wait_and_run_times_out_when_idle() {
        let dispatcher = Dispatcher::system();
        assert_eq!(dispatcher.wait_and_run(Duration::from_millis(1)), 0);
    }
}
