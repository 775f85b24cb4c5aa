//! Error types for artifact sets, transform outcomes and the work queue.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::ArtifactId;

/// API misuse by a caller. Never retried; surfaced immediately.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetError {
    /// The operation is not available for this set variant (e.g. listing local artifacts of a transformed set).
    #[error("{operation} is not supported for {variant}")]
    UnsupportedForVariant {
        operation: &'static str,
        variant: String,
    },
    /// A completion was replayed while the work queue still had the artifact's transform pending.
    #[error("completion replayed before the work queue drained: no outcome yet for {artifact}")]
    ReplayBeforeDrain { artifact: ArtifactId },
    /// Replay reached an artifact that was never announced during the visit.
    #[error("no transform was scheduled for {artifact}")]
    MissingOutcome { artifact: ArtifactId },
}

/// Failure of a transform step chain for one artifact.
///
/// Cloneable: the same outcome can be replayed any number of times.
#[derive(Debug, Clone, Error)]
#[error("failed to transform {artifact}: {cause:#}")]
pub struct ArtifactFailure {
    pub artifact: ArtifactId,
    pub cause: Arc<anyhow::Error>,
}

impl ArtifactFailure {
    pub fn new(artifact: ArtifactId, cause: anyhow::Error) -> Self {
        Self {
            artifact,
            cause: Arc::new(cause),
        }
    }
}

/// One failed operation collected by the work queue.
#[derive(Debug)]
pub struct OperationFailure {
    pub description: String,
    pub error: anyhow::Error,
}

/// Returned by [`WorkQueue::wait_for_completion`](crate::queue::WorkQueue::wait_for_completion).
#[derive(Debug, Error)]
pub enum QueueError {
    /// Every submitted operation ran; these ones failed (in completion order).
    #[error("{} of {submitted} operations in '{queue}' failed; first: {}", failure_count(.failures), first_failure(.failures))]
    OperationsFailed {
        queue: String,
        submitted: usize,
        failures: Vec<OperationFailure>,
    },
    /// The queue was cancelled; `skipped` operations never ran. `failures` holds
    /// operations that had already failed before the cancel.
    #[error("'{queue}' cancelled after {elapsed:?}; {skipped} operations skipped, {} failed", failure_count(.failures))]
    Cancelled {
        queue: String,
        skipped: usize,
        elapsed: Duration,
        failures: Vec<OperationFailure>,
    },
}

fn failure_count(failures: &[OperationFailure]) -> usize {
    failures.len()
}

fn first_failure(failures: &[OperationFailure]) -> String {
    failures
        .first()
        .map(|f| format!("{}: {:#}", f.description, f.error))
        .unwrap_or_else(|| "<none>".to_string())
}

impl QueueError {
    /// Every operation failure recorded before the drain returned.
    pub fn failures(&self) -> &[OperationFailure] {
        match self {
            QueueError::OperationsFailed { failures, .. } => failures,
            QueueError::Cancelled { failures, .. } => failures,
        }
    }
}
