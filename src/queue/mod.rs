//! Bounded-parallelism work queue.
//!
//! Operations go into an unbounded crossbeam channel (so `submit` never blocks the visiting
//! thread) and are picked up by a fixed set of worker threads. Draining is explicit and
//! consumes the queue: [`WorkQueue::wait_for_completion`] drops the sender, joins the
//! workers and reports every collected failure.

pub mod operation;
pub mod state;
pub mod worker;

pub use operation::{FnOperation, RunnableOperation};
pub use state::{ProgressCallback, QueueState};

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, error};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::QueueOpts;
use crate::error::QueueError;
use worker::{Job, spawn_workers};

/// Summary of a fully drained queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueReport {
    pub name: String,
    pub submitted: usize,
    pub completed: usize,
    pub elapsed: Duration,
}

pub struct WorkQueue {
    job_tx: Sender<Job>,
    job_rx: Receiver<Job>,
    worker_handles: Vec<JoinHandle<()>>,
    state: Arc<QueueState>,
    started: Instant,
}

impl WorkQueue {
    pub fn new(name: impl Into<String>, opts: &QueueOpts) -> Self {
        Self::with_progress(name, opts, None)
    }

    /// Like [`new`](Self::new), calling `on_done` each time an operation finishes.
    pub fn with_progress(
        name: impl Into<String>,
        opts: &QueueOpts,
        on_done: Option<ProgressCallback>,
    ) -> Self {
        let state = Arc::new(QueueState::new(name.into(), on_done));
        let (job_tx, job_rx) = unbounded::<Job>();
        let num_workers = opts.max_workers.max(1);
        let worker_handles = spawn_workers(job_rx.clone(), &state, num_workers);
        debug!(
            "{}: started with {} workers",
            state.name,
            worker_handles.len()
        );
        Self {
            job_tx,
            job_rx,
            worker_handles,
            state,
            started: Instant::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    /// Queue an operation. It runs at most once, in no particular order relative to others.
    pub fn submit(&self, op: impl RunnableOperation + 'static) {
        self.submit_boxed(Box::new(op));
    }

    pub fn submit_boxed(&self, op: Job) {
        self.state.record_submitted();
        // The queue holds a receiver itself, so the channel cannot be disconnected here.
        if let Err(e) = self.job_tx.send(op) {
            error!("{}: channel closed, cancelling operation", self.state.name);
            e.into_inner().cancel();
            self.state.record_skipped();
        }
    }

    pub fn submitted(&self) -> usize {
        self.state.submitted()
    }

    /// Stop starting new operations. Already running ones finish; queued ones get their `cancel` hook.
    pub fn cancel(&self) {
        self.state.cancel_flag().store(true, Ordering::Relaxed);
    }

    /// Flag that cancels the queue when set (e.g. from a Ctrl+C handler).
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.state.cancel_flag()
    }

    /// Drain: wait for every submitted operation, then report.
    ///
    /// All operations run even if some fail; the error carries every failure.
    pub fn wait_for_completion(self) -> Result<QueueReport, QueueError> {
        let WorkQueue {
            job_tx,
            job_rx,
            worker_handles,
            state,
            started,
        } = self;

        // Dropping the last sender closes the channel so workers exit.
        drop(job_tx);
        for h in worker_handles {
            if h.join().is_err() {
                error!("{}: worker thread panicked", state.name);
            }
        }
        // Leftovers only exist if no worker could be spawned; run them here.
        while let Ok(op) = job_rx.try_recv() {
            if state.is_cancelled() {
                op.cancel();
                state.record_skipped();
                continue;
            }
            let description = op.description();
            if let Err(e) = op.run() {
                state.record_failure(description, e);
            }
            state.record_completed();
        }

        let elapsed = started.elapsed();
        let failures = state.take_failures();
        debug!(
            "{}: drained {} operations ({} skipped, {} failed) in {:?}",
            state.name,
            state.submitted(),
            state.skipped(),
            failures.len(),
            elapsed
        );
        if state.skipped() > 0 {
            return Err(QueueError::Cancelled {
                queue: state.name.clone(),
                skipped: state.skipped(),
                elapsed,
                failures,
            });
        }
        if !failures.is_empty() {
            return Err(QueueError::OperationsFailed {
                queue: state.name.clone(),
                submitted: state.submitted(),
                failures,
            });
        }
        Ok(QueueReport {
            name: state.name.clone(),
            submitted: state.submitted(),
            completed: state.completed(),
            elapsed,
        })
    }
}
