//! Worker pool behavior under concurrency.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::Receiver;
use crossbeam::select;
use fdups::logging::Logger;
use fdups::pool::{CancelToken, PoolError, PoolEvent, PoolState, Task, TaskFn, WorkerPool};

/// Drain outputs until the completion event, returning the outputs seen.
fn collect_until_done<O>(outputs: &Receiver<O>, events: &Receiver<PoolEvent>) -> Vec<O> {
    let mut seen = Vec::new();
    loop {
        let done = select! {
            recv(outputs) -> out => {
                seen.push(out.unwrap());
                false
            },
            recv(events) -> event => {
                assert_eq!(event.unwrap(), PoolEvent::AllTasksDone);
                true
            },
        };
        if done {
            return seen;
        }
    }
}

#[test]
fn test_every_task_runs_exactly_once() {
    let pool: WorkerPool<usize, usize> = WorkerPool::new(4, Logger::discard());
    pool.start().unwrap();
    let outputs = pool.output_channel();
    let events = pool.event_channel();
    let square: TaskFn<usize, usize> = Arc::new(|_: &CancelToken, n: usize| n * n);

    let mut seen = thread::scope(|s| {
        s.spawn(|| {
            for n in 0..200 {
                pool.submit(Task::new(n, Arc::clone(&square))).unwrap();
            }
            pool.close_submit();
        });
        collect_until_done(&outputs, &events)
    });
    pool.stop();

    seen.sort_unstable();
    let expected: Vec<_> = (0..200).map(|n| n * n).collect();
    assert_eq!(seen, expected);
    assert_eq!(pool.task_count(), 0);
}

#[test]
fn test_single_completion_event_under_stress() {
    // Short tasks finishing right around close_submit used to be the
    // window for a double publish.
    for round in 0..200 {
        let pool: WorkerPool<usize, usize> = WorkerPool::new(8, Logger::discard());
        pool.start().unwrap();
        let outputs = pool.output_channel();
        let events = pool.event_channel();
        let noop: TaskFn<usize, usize> = Arc::new(|_: &CancelToken, n: usize| n);
        let tasks = round % 17;

        let seen = thread::scope(|s| {
            s.spawn(|| {
                for n in 0..tasks {
                    pool.submit(Task::new(n, Arc::clone(&noop))).unwrap();
                }
                pool.close_submit();
            });
            collect_until_done(&outputs, &events)
        });

        assert_eq!(seen.len(), tasks, "round {round}");
        thread::sleep(Duration::from_millis(1));
        assert!(events.try_recv().is_err(), "second completion in round {round}");
        pool.stop();
    }
}

#[test]
fn test_completion_waits_for_slow_tasks() {
    let pool: WorkerPool<u64, u64> = WorkerPool::new(2, Logger::discard());
    pool.start().unwrap();
    let outputs = pool.output_channel();
    let events = pool.event_channel();
    let slow: TaskFn<u64, u64> = Arc::new(|_: &CancelToken, ms: u64| {
        thread::sleep(Duration::from_millis(ms));
        ms
    });

    let seen = thread::scope(|s| {
        s.spawn(|| {
            pool.submit(Task::new(30, Arc::clone(&slow))).unwrap();
            pool.submit(Task::new(10, Arc::clone(&slow))).unwrap();
            pool.close_submit();
        });
        collect_until_done(&outputs, &events)
    });
    pool.stop();

    assert_eq!(seen.len(), 2);
}

#[test]
fn test_stop_cancels_running_tasks() {
    let pool: WorkerPool<(), bool> = WorkerPool::new(1, Logger::discard());
    pool.start().unwrap();
    let started = Arc::new(AtomicUsize::new(0));
    let observed = Arc::clone(&started);
    let wait_for_cancel: TaskFn<(), bool> = Arc::new(move |cancel: &CancelToken, ()| {
        observed.fetch_add(1, Ordering::SeqCst);
        for _ in 0..500 {
            if cancel.is_cancelled() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    });

    pool.submit(Task::new((), wait_for_cancel)).unwrap();
    while started.load(Ordering::SeqCst) == 0 {
        thread::yield_now();
    }
    pool.stop();

    assert_eq!(pool.state(), PoolState::Stopped);
    assert!(matches!(
        pool.submit(Task::new((), Arc::new(|_: &CancelToken, ()| true))),
        Err(PoolError::NotAccepting)
    ));
}

#[test]
fn test_output_from_one_epoch_does_not_leak_into_next() {
    let pool: WorkerPool<u8, u8> = WorkerPool::new(2, Logger::discard());
    let echo: TaskFn<u8, u8> = Arc::new(|_: &CancelToken, n: u8| n);

    for epoch in 0..3u8 {
        pool.start().unwrap();
        let outputs = pool.output_channel();
        let events = pool.event_channel();
        let seen = thread::scope(|s| {
            s.spawn(|| {
                pool.submit(Task::new(epoch, Arc::clone(&echo))).unwrap();
                pool.close_submit();
            });
            collect_until_done(&outputs, &events)
        });
        pool.stop();
        assert_eq!(seen, vec![epoch]);
    }
}
