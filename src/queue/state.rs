//! Shared queue state: counters, cancellation flag, collected failures.

use log::warn;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::OperationFailure;

/// Called with the number of operations just finished (run or skipped).
pub type ProgressCallback = Box<dyn Fn(usize) + Send + Sync>;

/// State shared between the queue handle and its workers.
pub struct QueueState {
    pub name: String,
    submitted: AtomicUsize,
    completed: AtomicUsize,
    skipped: AtomicUsize,
    cancel_requested: Arc<AtomicBool>,
    failures: Mutex<Vec<OperationFailure>>,
    on_done: Option<ProgressCallback>,
}

impl QueueState {
    pub fn new(name: String, on_done: Option<ProgressCallback>) -> Self {
        Self {
            name,
            submitted: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            cancel_requested: Arc::new(AtomicBool::new(false)),
            failures: Mutex::new(Vec::new()),
            on_done,
        }
    }

    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.report_progress();
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        self.report_progress();
    }

    /// Collect a failure. Siblings keep running (collect-all).
    pub fn record_failure(&self, description: String, error: anyhow::Error) {
        warn!("{}: {} failed: {:#}", self.name, description, error);
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(OperationFailure { description, error });
    }

    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_requested)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_requested.load(Ordering::Relaxed)
    }

    pub fn take_failures(&self) -> Vec<OperationFailure> {
        std::mem::take(&mut *self.failures.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn report_progress(&self) {
        if let Some(cb) = &self.on_done {
            cb(1);
        }
    }
}
