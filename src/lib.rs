//! Artixform: lazy, parallel, once-per-artifact transforms over resolved artifact sets

pub mod artifacts;
pub mod cache;
pub mod engine;
pub mod error;
pub mod publish;
pub mod queue;
pub mod toolchain;
pub mod transform;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

use log::debug;

use crate::artifacts::{ArtifactCollector, AsyncArtifactListener, ResolvedArtifactSet, VisitAll};
use crate::error::{QueueError, SetError};
use crate::queue::{QueueReport, WorkQueue};

/// Result alias used by public artixform API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Everything one full visit produced: the replayed events and how the queue finished.
#[derive(Debug)]
pub struct Resolution {
    pub collected: ArtifactCollector,
    /// Per-artifact failures are also replayed into `collected`; this carries the queue's
    /// own summary (failure list, or cancellation).
    pub queue: std::result::Result<QueueReport, QueueError>,
}

impl Resolution {
    pub fn is_success(&self) -> bool {
        self.queue.is_ok() && self.collected.failures().next().is_none()
    }
}

/// Run both visit phases of `set` on `queue`: start the visit with `listener`, drain the
/// queue, then replay into a fresh collector.
///
/// Errors only on a broken visit contract; transform failures end up in the [`Resolution`].
pub fn resolve_with_queue(
    set: &dyn ResolvedArtifactSet,
    queue: WorkQueue,
    listener: &mut dyn AsyncArtifactListener,
) -> std::result::Result<Resolution, SetError> {
    let completion = set.start_visit(&queue, listener);
    debug!(
        "{}: {} operations queued on {}",
        set.source(),
        queue.submitted(),
        queue.name()
    );
    let queue = queue.wait_for_completion();
    let mut collected = ArtifactCollector::new();
    completion.visit(&mut collected)?;
    Ok(Resolution { collected, queue })
}

/// [`resolve_with_queue`] on a fresh queue sized by `opts`, visiting all contents.
pub fn resolve_artifacts(
    set: &dyn ResolvedArtifactSet,
    opts: &QueueOpts,
) -> std::result::Result<Resolution, SetError> {
    let queue = WorkQueue::new("artifact transforms", opts);
    resolve_with_queue(set, queue, &mut VisitAll)
}
