//! Animation worker
//!
//! A single background thread draining a FIFO of steps. Each step is held
//! back by one quantum and then handed to the [`UiContext`], which runs it on
//! the thread that owns the UI objects. The worker never runs a step itself,
//! so a slow UI thread delays updates but never stalls the timer.
//!
//! ```text
//!   enqueue ──▶ [ step | step | step ] ──pop──▶ sleep(quantum) ──▶ run_async
//!                       ▲                                              │
//!                       └──────── steps re-enqueue themselves ─────────┘
//! ```

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use kinetic_core::{StepError, UiContext};
use parking_lot::{Condvar, Mutex};

use crate::config::AnimatorConfig;
use crate::error::{AnimationError, Result};

/// Unit of work executed on the UI context
pub type Step = Box<dyn FnOnce() -> std::result::Result<(), StepError> + Send + 'static>;

/// Observable state of the worker thread
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    /// Queue empty, thread parked on the condition variable
    Idle,
    /// Popping and dispatching steps
    Draining,
    /// Thread has exited
    Stopped,
}

struct WorkQueue {
    steps: VecDeque<Step>,
    state: WorkerState,
    stopping: bool,
}

struct WorkerShared {
    queue: Mutex<WorkQueue>,
    ready: Condvar,
}

/// Handle to the background animation thread
///
/// Dropping the handle stops the thread. Steps still queued at that point
/// are discarded.
pub struct AnimationWorker {
    shared: Arc<WorkerShared>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl AnimationWorker {
    /// Start the worker thread
    pub fn spawn(config: &AnimatorConfig, context: Arc<dyn UiContext>) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(WorkerShared {
            queue: Mutex::new(WorkQueue {
                steps: VecDeque::new(),
                state: WorkerState::Idle,
                stopping: false,
            }),
            ready: Condvar::new(),
        });

        let quantum = config.quantum();
        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || run(thread_shared, context, quantum))
            .map_err(AnimationError::WorkerSpawn)?;

        tracing::debug!(
            thread = %config.thread_name,
            quantum_ms = config.quantum_ms,
            "animation worker started"
        );

        Ok(Self {
            shared,
            thread_handle: Mutex::new(Some(handle)),
        })
    }

    /// Append `step` to the queue and wake the thread
    ///
    /// Returns `false`, dropping the step, once the worker has been shut down.
    pub fn enqueue(&self, step: Step) -> bool {
        let mut queue = self.shared.queue.lock();
        if queue.stopping {
            return false;
        }
        queue.steps.push_back(step);
        drop(queue);
        self.shared.ready.notify_one();
        true
    }

    /// Number of steps waiting for dispatch
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().steps.len()
    }

    pub fn state(&self) -> WorkerState {
        self.shared.queue.lock().state
    }

    pub fn is_running(&self) -> bool {
        !self.shared.queue.lock().stopping
    }

    /// Stop the thread and wait for it to exit
    ///
    /// Idempotent. When called from the worker thread itself (for example
    /// from a wake callback that drops the last animator) the thread is told
    /// to stop but not joined.
    pub fn shutdown(&self) {
        let discarded = {
            let mut queue = self.shared.queue.lock();
            queue.stopping = true;
            std::mem::take(&mut queue.steps).len()
        };
        self.shared.ready.notify_all();

        if let Some(handle) = self.thread_handle.lock().take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                tracing::error!("animation worker thread panicked");
            }
            tracing::debug!(discarded, "animation worker stopped");
        }
    }
}

impl Drop for AnimationWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Worker thread body
fn run(shared: Arc<WorkerShared>, context: Arc<dyn UiContext>, quantum: Duration) {
    loop {
        let step = {
            let mut queue = shared.queue.lock();
            loop {
                if queue.stopping {
                    queue.state = WorkerState::Stopped;
                    return;
                }
                if let Some(step) = queue.steps.pop_front() {
                    queue.state = WorkerState::Draining;
                    break step;
                }
                queue.state = WorkerState::Idle;
                shared.ready.wait(&mut queue);
            }
        };

        if !quantum.is_zero() {
            thread::sleep(quantum);
        }

        let ui = Arc::clone(&context);
        let task = Box::new(move || {
            if let Err(err) = step() {
                ui.report_error(err);
            }
        });

        // A misbehaving context must not take the timer down with it.
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| context.run_async(task))) {
            let err = StepError::from_panic(payload);
            tracing::warn!("UI context failed to accept a step: {}", err);
            context.report_error(err);
        }
    }
}
