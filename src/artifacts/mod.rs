//! Visitable artifact sets and the two-phase visit protocol.
//!
//! Phase one, [`ResolvedArtifactSet::start_visit`], streams artifacts to an
//! [`AsyncArtifactListener`] on the calling thread and may queue work; it returns a
//! [`Completion`] without blocking. Phase two, after the caller drained the
//! [`WorkQueue`], is [`Completion::visit`]: it replays the set in structural order to an
//! [`ArtifactVisitor`].

pub mod collect;
pub mod composite;
pub mod listener;
pub mod transformed;
pub mod variant;

pub use collect::{ArtifactCollector, BuildDependenciesOnly, VisitAll, VisitEvent};
pub use composite::{CompositeArtifactSet, EmptyArtifactSet};
pub use listener::TransformingAsyncListener;
pub use transformed::{TransformCompletion, TransformedArtifactSet};
pub use variant::ResolvedVariantSet;

use crate::error::{ArtifactFailure, SetError};
use crate::queue::WorkQueue;
use crate::{ResolvedArtifact, VisitSource, VisitType};

/// Receives artifacts as a set discovers them during `start_visit`.
pub trait AsyncArtifactListener {
    /// Asked once per set before it streams anything.
    fn prepare_for_visit(&mut self, source: &VisitSource) -> VisitType;

    fn artifact_available(&mut self, artifact: &ResolvedArtifact);
}

/// Receives the replayed structure from a [`Completion`].
pub trait ArtifactVisitor {
    fn visit_artifact(&mut self, artifact: &ResolvedArtifact);

    /// An artifact at this position could not be produced.
    fn visit_failure(&mut self, failure: &ArtifactFailure);

    fn end_visit_collection(&mut self, source: &VisitSource);
}

pub trait LocalArtifactVisitor {
    fn visit_local_artifact(&mut self, artifact: &ResolvedArtifact);
}

/// Deferred replay of a started visit. Invoke only after the work queue drained.
pub trait Completion: Send {
    /// Errors are contract violations only; per-artifact failures go to `visitor`.
    fn visit(&self, visitor: &mut dyn ArtifactVisitor) -> Result<(), SetError>;
}

/// A lazily visitable, possibly composite collection of artifacts.
pub trait ResolvedArtifactSet: Send + Sync {
    fn source(&self) -> &VisitSource;

    fn start_visit(
        &self,
        queue: &WorkQueue,
        listener: &mut dyn AsyncArtifactListener,
    ) -> Box<dyn Completion>;

    /// Visit artifacts built inside this build.
    fn visit_local_artifacts(&self, visitor: &mut dyn LocalArtifactVisitor)
    -> Result<(), SetError>;

    /// Set this is, when it is a transformed set. Lets a transform over a transform fuse both chains.
    fn as_transformed(&self) -> Option<&TransformedArtifactSet> {
        None
    }
}

/// Completion for a set whose listener asked for no contents: a single end-of-collection.
pub struct EndOfCollection(pub VisitSource);

impl Completion for EndOfCollection {
    fn visit(&self, visitor: &mut dyn ArtifactVisitor) -> Result<(), SetError> {
        visitor.end_visit_collection(&self.0);
        Ok(())
    }
}
