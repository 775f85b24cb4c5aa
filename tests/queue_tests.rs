//! Work queue: bounded workers, collect-all failures, cancellation.

use anyhow::bail;
use artixform::QueueOpts;
use artixform::error::QueueError;
use artixform::queue::{FnOperation, ProgressCallback, RunnableOperation, WorkQueue};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, mpsc};
use std::time::Duration;

fn opts(workers: usize) -> QueueOpts {
    QueueOpts {
        max_workers: workers,
    }
}

#[test]
fn test_empty_queue_drains_immediately() {
    let queue = WorkQueue::new("empty", &opts(2));
    let report = queue.wait_for_completion().unwrap();
    assert_eq!(report.name, "empty");
    assert_eq!(report.submitted, 0);
    assert_eq!(report.completed, 0);
}

#[test]
fn test_every_operation_runs_once() {
    let ran = Arc::new(AtomicUsize::new(0));
    let queue = WorkQueue::new("count", &opts(4));
    for i in 0..50 {
        let ran = Arc::clone(&ran);
        queue.submit(FnOperation::new(format!("op {i}"), move || {
            ran.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
    }
    assert_eq!(queue.submitted(), 50);
    let report = queue.wait_for_completion().unwrap();
    assert_eq!(report.completed, 50);
    assert_eq!(ran.load(Ordering::SeqCst), 50);
}

#[test]
fn test_zero_workers_clamped_to_one() {
    let ran = Arc::new(AtomicBool::new(false));
    let queue = WorkQueue::new("clamp", &opts(0));
    let flag = Arc::clone(&ran);
    queue.submit(FnOperation::new("single", move || {
        flag.store(true, Ordering::SeqCst);
        Ok(())
    }));
    queue.wait_for_completion().unwrap();
    assert!(ran.load(Ordering::SeqCst));
}

#[test]
fn test_operations_run_in_parallel() {
    // Deadlocks unless both operations are in flight at once.
    let barrier = Arc::new(Barrier::new(2));
    let queue = WorkQueue::new("parallel", &opts(2));
    for i in 0..2 {
        let barrier = Arc::clone(&barrier);
        queue.submit(FnOperation::new(format!("wait {i}"), move || {
            barrier.wait();
            Ok(())
        }));
    }
    assert_eq!(queue.wait_for_completion().unwrap().completed, 2);
}

#[test]
fn test_failures_collected_and_others_still_run() {
    let ran = Arc::new(AtomicUsize::new(0));
    let queue = WorkQueue::new("mixed", &opts(3));
    for i in 0..6 {
        let ran = Arc::clone(&ran);
        queue.submit(FnOperation::new(format!("op {i}"), move || {
            ran.fetch_add(1, Ordering::SeqCst);
            if i % 3 == 0 {
                bail!("op {i} broke");
            }
            Ok(())
        }));
    }
    let err = queue.wait_for_completion().unwrap_err();
    assert_eq!(ran.load(Ordering::SeqCst), 6);
    assert_eq!(err.failures().len(), 2);
    match &err {
        QueueError::OperationsFailed {
            queue, submitted, ..
        } => {
            assert_eq!(queue, "mixed");
            assert_eq!(*submitted, 6);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("2 of 6 operations in 'mixed' failed"));
}

#[test]
fn test_panicking_operation_recorded_as_failure() {
    let queue = WorkQueue::new("panics", &opts(1));
    queue.submit(FnOperation::new("explodes", || panic!("kaboom")));
    queue.submit(FnOperation::new("fine", || Ok(())));
    let err = queue.wait_for_completion().unwrap_err();
    let failures = err.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].description, "explodes");
    assert!(failures[0].error.to_string().contains("kaboom"));
}

#[test]
fn test_progress_callback_sees_every_operation() {
    let done = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&done);
    let on_done: ProgressCallback = Box::new(move |n: usize| {
        seen.fetch_add(n, Ordering::SeqCst);
    });
    let queue = WorkQueue::with_progress("progress", &opts(2), Some(on_done));
    for i in 0..10 {
        queue.submit(FnOperation::new(format!("op {i}"), || Ok(())));
    }
    queue.wait_for_completion().unwrap();
    assert_eq!(done.load(Ordering::SeqCst), 10);
}

struct Tracked {
    cancelled: Arc<AtomicUsize>,
}

impl RunnableOperation for Tracked {
    fn description(&self) -> String {
        "tracked".to_string()
    }

    fn run(self: Box<Self>) -> anyhow::Result<()> {
        Ok(())
    }

    fn cancel(self: Box<Self>) {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_cancel_skips_queued_operations() {
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (started_tx, started_rx) = mpsc::channel::<()>();
    let cancelled = Arc::new(AtomicUsize::new(0));
    let queue = WorkQueue::new("cancel", &opts(1));

    queue.submit(FnOperation::new("blocker", move || {
        let _ = started_tx.send(());
        let _ = release_rx.recv_timeout(Duration::from_secs(5));
        Ok(())
    }));
    started_rx.recv().unwrap();
    for _ in 0..4 {
        queue.submit(Tracked {
            cancelled: Arc::clone(&cancelled),
        });
    }
    queue.cancel_handle().store(true, Ordering::Relaxed);
    release_tx.send(()).unwrap();

    match queue.wait_for_completion() {
        Err(QueueError::Cancelled {
            queue,
            skipped,
            failures,
            ..
        }) => {
            assert_eq!(queue, "cancel");
            assert_eq!(skipped, 4);
            assert!(failures.is_empty());
        }
        other => panic!("unexpected result {other:?}"),
    }
    assert_eq!(cancelled.load(Ordering::SeqCst), 4);
}

#[test]
fn test_cancel_keeps_failures_recorded_before_it() {
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (started_tx, started_rx) = mpsc::channel::<()>();
    let cancelled = Arc::new(AtomicUsize::new(0));
    let queue = WorkQueue::new("cancel after failure", &opts(1));

    queue.submit(FnOperation::new("broken", move || {
        let _ = started_tx.send(());
        let _ = release_rx.recv_timeout(Duration::from_secs(5));
        bail!("disk full")
    }));
    started_rx.recv().unwrap();
    for _ in 0..2 {
        queue.submit(Tracked {
            cancelled: Arc::clone(&cancelled),
        });
    }
    queue.cancel();
    release_tx.send(()).unwrap();

    let err = queue.wait_for_completion().unwrap_err();
    assert!(matches!(err, QueueError::Cancelled { skipped: 2, .. }));
    assert_eq!(err.failures().len(), 1);
    assert_eq!(err.failures()[0].description, "broken");
    assert!(err.to_string().contains("2 operations skipped, 1 failed"));
    assert_eq!(cancelled.load(Ordering::SeqCst), 2);
}
