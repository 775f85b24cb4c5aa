//! Bridge between the underlying set's visit and the work queue.
//!
//! Instead of forwarding each discovered artifact to the consumer, the bridge reserves the
//! artifact's slot in the [`ResultCache`] and queues one transform operation for it. An
//! artifact seen again (another branch of the same composite, or another thread) finds the
//! reservation and schedules nothing.

use anyhow::Result;
use log::debug;
use std::sync::Arc;

use super::AsyncArtifactListener;
use crate::cache::{OutcomeSlot, ResultCache};
use crate::error::ArtifactFailure;
use crate::queue::{RunnableOperation, WorkQueue};
use crate::transform::{
    DependenciesResolver, Transformation, TransformationNodeRegistry, TransformationOutcome,
};
use crate::{ResolvedArtifact, VisitSource, VisitType};

/// Listener handed to the underlying set by a transformed set's `start_visit`.
///
/// Scheduling goes through `&self`, so clones of one bridge may discover artifacts from
/// several threads at once.
#[derive(Clone)]
pub struct TransformingAsyncListener<'q> {
    transformation: Arc<Transformation>,
    queue: &'q WorkQueue,
    cache: Arc<ResultCache>,
    resolver: Arc<dyn DependenciesResolver>,
    registry: Arc<dyn TransformationNodeRegistry>,
}

impl<'q> TransformingAsyncListener<'q> {
    pub fn new(
        transformation: Arc<Transformation>,
        queue: &'q WorkQueue,
        cache: Arc<ResultCache>,
        resolver: Arc<dyn DependenciesResolver>,
        registry: Arc<dyn TransformationNodeRegistry>,
    ) -> Self {
        Self {
            transformation,
            queue,
            cache,
            resolver,
            registry,
        }
    }

    /// Reserve `artifact`'s slot and queue its transform. Returns false when another
    /// discovery already owns the slot (nothing is scheduled then).
    pub fn schedule(&self, artifact: &ResolvedArtifact) -> bool {
        let Some(slot) = self.cache.reserve(&artifact.id) else {
            return false;
        };
        if let Some(outcome) = self
            .registry
            .get_if_executed(&artifact.id, &self.transformation)
        {
            debug!("{}: using result of executed transform node", artifact.id);
            slot.complete(outcome);
            return true;
        }
        self.queue.submit(TransformOperation {
            artifact: artifact.clone(),
            transformation: Arc::clone(&self.transformation),
            resolver: Arc::clone(&self.resolver),
            slot,
        });
        true
    }
}

impl AsyncArtifactListener for TransformingAsyncListener<'_> {
    fn prepare_for_visit(&mut self, _source: &VisitSource) -> VisitType {
        // Transforms need the artifacts themselves.
        VisitType::Visit
    }

    fn artifact_available(&mut self, artifact: &ResolvedArtifact) {
        self.schedule(artifact);
    }
}

/// Runs the full step chain for one artifact and fills its reserved slot.
///
/// The slot is filled on every path: success, failure, cancellation, or the operation
/// being dropped unrun.
struct TransformOperation {
    artifact: ResolvedArtifact,
    transformation: Arc<Transformation>,
    resolver: Arc<dyn DependenciesResolver>,
    slot: Arc<OutcomeSlot>,
}

impl TransformOperation {
    fn fail(&self, reason: &str) {
        if !self.slot.is_complete() {
            self.slot
                .complete(TransformationOutcome::Failure(ArtifactFailure::new(
                    self.artifact.id.clone(),
                    anyhow::anyhow!("{reason}"),
                )));
        }
    }
}

impl RunnableOperation for TransformOperation {
    fn description(&self) -> String {
        format!(
            "transform {} with {}",
            self.artifact.id,
            self.transformation.display_name()
        )
    }

    fn run(self: Box<Self>) -> Result<()> {
        let outcome = self
            .transformation
            .apply(&self.artifact, self.resolver.as_ref());
        self.slot.complete(outcome.clone());
        match outcome {
            TransformationOutcome::Success(_) => Ok(()),
            TransformationOutcome::Failure(failure) => Err(anyhow::Error::new(failure)),
        }
    }

    fn cancel(self: Box<Self>) {
        self.fail("cancelled before it started");
    }
}

impl Drop for TransformOperation {
    fn drop(&mut self) {
        self.fail("dropped before it ran");
    }
}
