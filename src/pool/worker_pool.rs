//! Fixed-size worker pool with a single completion event per epoch.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use crossbeam::select;

use super::{CancelToken, PoolError, PoolEvent, PoolState, Task};
use crate::logging::Logger;

/// Pending-task bookkeeping for one submission epoch.
///
/// Every increment, decrement and check-and-publish happens under the same
/// mutex, so the completion event cannot be published twice or missed.
#[derive(Debug, Default)]
struct PendingTasks {
    count: usize,
    submit_closed: bool,
    completion_published: bool,
}

impl PendingTasks {
    /// Publish [`PoolEvent::AllTasksDone`] if the epoch just completed.
    ///
    /// Must be called with the counter lock held.
    fn publish_if_done(&mut self, events: &Sender<PoolEvent>) -> bool {
        if !self.submit_closed || self.count > 0 || self.completion_published {
            return false;
        }
        self.completion_published = true;
        // Unbounded: never blocks, and the pool holds a receiver.
        let _ = events.send(PoolEvent::AllTasksDone);
        true
    }
}

type Pending = Arc<Mutex<PendingTasks>>;

fn lock_pending(pending: &Pending) -> MutexGuard<'_, PendingTasks> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Channels and signals belonging to one start/stop cycle.
struct Epoch<I, O> {
    tasks: (Sender<Task<I, O>>, Receiver<Task<I, O>>),
    outputs: (Sender<O>, Receiver<O>),
    events: (Sender<PoolEvent>, Receiver<PoolEvent>),
    pending: Pending,
    task_cancel: CancelToken,
    /// Dropped on stop; every clone of `stop_signal` then reports disconnection.
    stop_trigger: Option<Sender<()>>,
    stop_signal: Receiver<()>,
}

impl<I, O> Epoch<I, O> {
    fn new() -> Self {
        let (stop_trigger, stop_signal) = bounded(0);
        Self {
            tasks: bounded(0),
            outputs: bounded(0),
            events: unbounded(),
            pending: Pending::default(),
            task_cancel: CancelToken::new(),
            stop_trigger: Some(stop_trigger),
            stop_signal,
        }
    }
}

struct Inner<I, O> {
    state: PoolState,
    epoch: Epoch<I, O>,
}

/// Generic worker pool.
///
/// See the [module documentation](super) for the protocol.
pub struct WorkerPool<I, O> {
    capacity: usize,
    logger: Logger,
    inner: Mutex<Inner<I, O>>,
}

impl<I, O> WorkerPool<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Create a stopped pool that will run `capacity` workers once started.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize, logger: Logger) -> Self {
        Self {
            capacity: capacity.max(1),
            logger,
            inner: Mutex::new(Inner {
                state: PoolState::Stopped,
                epoch: Epoch::new(),
            }),
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner<I, O>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of worker threads launched by [`start`](Self::start).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PoolState {
        self.lock_inner().state
    }

    /// Launch the workers. No-op if already started.
    ///
    /// Every start opens a fresh epoch: new channels, a zeroed counter and
    /// fresh cancellation signals, so receivers obtained before a restart
    /// belong to the previous epoch.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Spawn`] if a worker thread cannot be created; any
    /// workers already spawned are shut down again.
    pub fn start(&self) -> Result<(), PoolError> {
        let mut inner = self.lock_inner();
        if inner.state == PoolState::Started {
            return Ok(());
        }

        inner.epoch = Epoch::new();
        for id in 0..self.capacity {
            let worker = Worker {
                id,
                tasks: inner.epoch.tasks.1.clone(),
                outputs: inner.epoch.outputs.0.clone(),
                events: inner.epoch.events.0.clone(),
                pending: Arc::clone(&inner.epoch.pending),
                task_cancel: inner.epoch.task_cancel.clone(),
                stop_signal: inner.epoch.stop_signal.clone(),
                logger: self.logger.clone(),
            };
            let spawned = thread::Builder::new()
                .name(format!("fdups-worker-{id}"))
                .spawn(move || worker.run());
            if let Err(e) = spawned {
                inner.epoch.task_cancel.cancel();
                inner.epoch.stop_trigger.take();
                return Err(PoolError::Spawn(e));
            }
        }
        inner.state = PoolState::Started;
        log_debug!(self.logger, "Worker pool started with {} workers", self.capacity);
        Ok(())
    }

    /// Hand a task to a worker, blocking until one receives it.
    ///
    /// The pending counter is incremented before the hand-off so a fast
    /// worker can never decrement it below zero; a failed hand-off rolls the
    /// increment back.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotAccepting`] if the pool is not started, if
    /// submission has been closed, or if the pool stops while waiting.
    pub fn submit(&self, task: Task<I, O>) -> Result<(), PoolError> {
        let (sender, stop_signal, pending, events) = {
            let inner = self.lock_inner();
            if inner.state != PoolState::Started {
                return Err(PoolError::NotAccepting);
            }
            (
                inner.epoch.tasks.0.clone(),
                inner.epoch.stop_signal.clone(),
                Arc::clone(&inner.epoch.pending),
                inner.epoch.events.0.clone(),
            )
        };

        {
            let mut counter = lock_pending(&pending);
            if counter.submit_closed {
                return Err(PoolError::NotAccepting);
            }
            counter.count += 1;
        }

        let accepted = select! {
            send(sender, task) -> res => res.is_ok(),
            recv(stop_signal) -> _ => false,
        };
        if accepted {
            return Ok(());
        }

        let mut counter = lock_pending(&pending);
        counter.count -= 1;
        counter.publish_if_done(&events);
        Err(PoolError::NotAccepting)
    }

    /// Declare that no further tasks will be submitted in this epoch.
    ///
    /// Publishes the completion event right away if nothing is pending;
    /// otherwise the last worker to finish publishes it.
    pub fn close_submit(&self) {
        let inner = self.lock_inner();
        let mut counter = lock_pending(&inner.epoch.pending);
        counter.submit_closed = true;
        if counter.publish_if_done(&inner.epoch.events.0) {
            log_debug!(self.logger, "Submission closed with no pending tasks");
        }
    }

    /// Cancel the task-scoped token without stopping the workers.
    pub fn cancel(&self) {
        self.lock_inner().epoch.task_cancel.cancel();
        log_debug!(self.logger, "Worker pool tasks cancelled");
    }

    /// Cancel running tasks and release the workers. No-op if already stopped.
    ///
    /// Does not wait for workers: a task already running finishes on its own
    /// and its worker exits afterwards.
    pub fn stop(&self) {
        let mut inner = self.lock_inner();
        if inner.state == PoolState::Stopped {
            return;
        }
        inner.epoch.task_cancel.cancel();
        inner.epoch.stop_trigger.take();
        inner.state = PoolState::Stopped;
        log_debug!(self.logger, "Worker pool stopped");
    }

    /// Receiving end for task outputs of the current epoch.
    #[must_use]
    pub fn output_channel(&self) -> Receiver<O> {
        self.lock_inner().epoch.outputs.1.clone()
    }

    /// Receiving end for pool events of the current epoch.
    #[must_use]
    pub fn event_channel(&self) -> Receiver<PoolEvent> {
        self.lock_inner().epoch.events.1.clone()
    }

    /// Point-in-time number of accepted tasks that have not finished.
    #[must_use]
    pub fn task_count(&self) -> usize {
        let inner = self.lock_inner();
        let count = lock_pending(&inner.epoch.pending).count;
        count
    }
}

impl<I, O> Drop for WorkerPool<I, O> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        inner.epoch.task_cancel.cancel();
        inner.epoch.stop_trigger.take();
        inner.state = PoolState::Stopped;
    }
}

struct Worker<I, O> {
    id: usize,
    tasks: Receiver<Task<I, O>>,
    outputs: Sender<O>,
    events: Sender<PoolEvent>,
    pending: Pending,
    task_cancel: CancelToken,
    stop_signal: Receiver<()>,
    logger: Logger,
}

impl<I, O> Worker<I, O> {
    fn run(self) {
        loop {
            let task = select! {
                recv(self.stop_signal) -> _ => None,
                recv(self.tasks) -> task => task.ok(),
            };
            let Some(task) = task else {
                break;
            };

            let output = task.run(&self.task_cancel);

            let delivered = select! {
                send(self.outputs, output) -> res => res.is_ok(),
                recv(self.stop_signal) -> _ => false,
            };
            self.finish_task();
            if !delivered {
                break;
            }
        }
        log_trace!(self.logger, "Worker {} exiting", self.id);
    }

    fn finish_task(&self) {
        let mut counter = lock_pending(&self.pending);
        debug_assert!(counter.count > 0, "pending task counter underflow");
        counter.count = counter.count.saturating_sub(1);
        if counter.publish_if_done(&self.events) {
            log_debug!(self.logger, "All tasks done");
        }
    }
}
