use crossbeam_channel::Receiver;
use log::debug;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::operation::RunnableOperation;
use super::state::QueueState;

pub type Job = Box<dyn RunnableOperation>;

/// Single worker: take operations from `job_rx` until every sender is gone.
/// A panicking operation is recorded as a failure; the worker keeps going.
fn operation_worker_loop(job_rx: Receiver<Job>, state: Arc<QueueState>) {
    while let Ok(op) = job_rx.recv() {
        if state.is_cancelled() {
            debug!("{}: skipping {} (cancelled)", state.name, op.description());
            op.cancel();
            state.record_skipped();
            continue;
        }
        let description = op.description();
        debug!("{}: running {}", state.name, description);
        match panic::catch_unwind(AssertUnwindSafe(move || op.run())) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => state.record_failure(description, e),
            Err(payload) => state.record_failure(
                description,
                anyhow::anyhow!("operation panicked: {}", panic_message(payload.as_ref())),
            ),
        }
        state.record_completed();
    }
}

/// Spawn `num_workers` workers reading from `job_rx`. The queue must drop its sender so workers exit.
pub fn spawn_workers(
    job_rx: Receiver<Job>,
    state: &Arc<QueueState>,
    num_workers: usize,
) -> Vec<JoinHandle<()>> {
    (0..num_workers)
        .map(|i| {
            let job_rx = job_rx.clone();
            let state = Arc::clone(state);
            thread::Builder::new()
                .name(format!("{}-worker-{i}", env!("CARGO_PKG_NAME")))
                .spawn(move || operation_worker_loop(job_rx, state))
        })
        .filter_map(|spawned| match spawned {
            Ok(h) => Some(h),
            Err(e) => {
                log::error!("failed to spawn queue worker: {e}");
                None
            }
        })
        .collect()
}

pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
