use std::sync::Arc;

use super::{
    ArtifactVisitor, AsyncArtifactListener, Completion, LocalArtifactVisitor, ResolvedArtifactSet,
};
use crate::error::SetError;
use crate::queue::WorkQueue;
use crate::VisitSource;

/// Ordered composition of sets. Visits and replays children in order.
pub struct CompositeArtifactSet {
    source: VisitSource,
    children: Vec<Arc<dyn ResolvedArtifactSet>>,
}

impl CompositeArtifactSet {
    pub fn new(source: VisitSource, children: Vec<Arc<dyn ResolvedArtifactSet>>) -> Self {
        Self { source, children }
    }

    pub fn children(&self) -> &[Arc<dyn ResolvedArtifactSet>] {
        &self.children
    }
}

struct CompositeCompletion(Vec<Box<dyn Completion>>);

impl Completion for CompositeCompletion {
    fn visit(&self, visitor: &mut dyn ArtifactVisitor) -> Result<(), SetError> {
        for completion in &self.0 {
            completion.visit(visitor)?;
        }
        Ok(())
    }
}

impl ResolvedArtifactSet for CompositeArtifactSet {
    fn source(&self) -> &VisitSource {
        &self.source
    }

    fn start_visit(
        &self,
        queue: &WorkQueue,
        listener: &mut dyn AsyncArtifactListener,
    ) -> Box<dyn Completion> {
        let mut completions = Vec::with_capacity(self.children.len());
        for child in &self.children {
            completions.push(child.start_visit(queue, &mut *listener));
        }
        Box::new(CompositeCompletion(completions))
    }

    fn visit_local_artifacts(
        &self,
        visitor: &mut dyn LocalArtifactVisitor,
    ) -> Result<(), SetError> {
        for child in &self.children {
            child.visit_local_artifacts(visitor)?;
        }
        Ok(())
    }
}

/// Set with nothing in it.
pub struct EmptyArtifactSet {
    source: VisitSource,
}

impl EmptyArtifactSet {
    pub fn new() -> Self {
        Self {
            source: VisitSource::new("empty"),
        }
    }
}

impl Default for EmptyArtifactSet {
    fn default() -> Self {
        Self::new()
    }
}

struct EmptyCompletion;

impl Completion for EmptyCompletion {
    fn visit(&self, _: &mut dyn ArtifactVisitor) -> Result<(), SetError> {
        Ok(())
    }
}

impl ResolvedArtifactSet for EmptyArtifactSet {
    fn source(&self) -> &VisitSource {
        &self.source
    }

    fn start_visit(&self, _: &WorkQueue, _: &mut dyn AsyncArtifactListener) -> Box<dyn Completion> {
        Box::new(EmptyCompletion)
    }

    fn visit_local_artifacts(&self, _: &mut dyn LocalArtifactVisitor) -> Result<(), SetError> {
        Ok(())
    }
}
