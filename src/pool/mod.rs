//! Generic worker pool.
//!
//! The pool runs a fixed number of worker threads that pull [`Task`]s from a
//! shared zero-capacity queue, so [`WorkerPool::submit`] blocks until a
//! worker is free to take the task. Each task's output is delivered on the
//! output channel, and once submission has been closed and every accepted
//! task has finished the pool publishes exactly one
//! [`PoolEvent::AllTasksDone`] on the event channel.
//!
//! The pool knows nothing about files or hashes: inputs and outputs are
//! type parameters and task-level failures travel inside the output value.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use fdups::logging::Logger;
//! use fdups::pool::{PoolEvent, Task, WorkerPool};
//!
//! let pool: WorkerPool<u32, u32> = WorkerPool::new(2, Logger::discard());
//! pool.start().unwrap();
//!
//! let outputs = pool.output_channel();
//! let events = pool.event_channel();
//! let double = Arc::new(|_: &fdups::pool::CancelToken, n: u32| n * 2);
//!
//! std::thread::scope(|s| {
//!     s.spawn(|| {
//!         for n in 0..4 {
//!             pool.submit(Task::new(n, double.clone())).unwrap();
//!         }
//!         pool.close_submit();
//!     });
//!
//!     let mut sum = 0;
//!     loop {
//!         let done = crossbeam::select! {
//!             recv(outputs) -> out => {
//!                 sum += out.unwrap();
//!                 false
//!             },
//!             recv(events) -> event => event.unwrap() == PoolEvent::AllTasksDone,
//!         };
//!         if done {
//!             break;
//!         }
//!     }
//!     assert_eq!(sum, 12);
//! });
//! pool.stop();
//! ```

pub mod cancel;
pub mod worker_pool;

use std::fmt;
use std::sync::Arc;

pub use cancel::CancelToken;
pub use worker_pool::WorkerPool;

/// Events published by the pool on its event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolEvent {
    /// Submission was closed and every accepted task has produced its output.
    AllTasksDone,
}

/// Lifecycle state of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// No workers are running; submissions are rejected.
    Stopped,
    /// Workers are running and accepting tasks.
    Started,
}

/// Function run by a worker for one task.
///
/// Receives the task-scoped cancellation token and the task input.
pub type TaskFn<I, O> = Arc<dyn Fn(&CancelToken, I) -> O + Send + Sync>;

/// A unit of work: an input plus the function that processes it.
pub struct Task<I, O> {
    /// Data handed to the function.
    pub input: I,
    /// Function executed by exactly one worker.
    pub function: TaskFn<I, O>,
}

impl<I, O> Task<I, O> {
    /// Create a task.
    #[must_use]
    pub fn new(input: I, function: TaskFn<I, O>) -> Self {
        Self { input, function }
    }

    /// Run the task on the calling thread.
    pub(crate) fn run(self, cancel: &CancelToken) -> O {
        (self.function)(cancel, self.input)
    }
}

impl<I: fmt::Debug, O> fmt::Debug for Task<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("input", &self.input)
            .field("function", &"<fn>")
            .finish()
    }
}

/// Errors returned by pool operations (never by tasks).
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The pool is stopped, was stopped mid-submission, or submission was closed.
    #[error("worker pool is not accepting submissions")]
    NotAccepting,

    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}
