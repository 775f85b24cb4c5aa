//! Plain resolved set: one variant's artifacts, in resolution order.

use std::sync::Arc;

use super::{
    ArtifactVisitor, AsyncArtifactListener, Completion, EndOfCollection, LocalArtifactVisitor,
    ResolvedArtifactSet,
};
use crate::error::SetError;
use crate::queue::WorkQueue;
use crate::{ResolvedArtifact, VisitSource, VisitType};

/// Artifacts of one resolved variant. Local and external artifacts are handled alike,
/// except that only local ones are reported by `visit_local_artifacts`.
#[derive(Clone, Debug)]
pub struct ResolvedVariantSet {
    source: VisitSource,
    artifacts: Arc<Vec<ResolvedArtifact>>,
}

impl ResolvedVariantSet {
    pub fn new(source: VisitSource, artifacts: Vec<ResolvedArtifact>) -> Self {
        Self {
            source,
            artifacts: Arc::new(artifacts),
        }
    }

    pub fn artifacts(&self) -> &[ResolvedArtifact] {
        &self.artifacts
    }
}

struct VariantCompletion {
    source: VisitSource,
    artifacts: Arc<Vec<ResolvedArtifact>>,
}

impl Completion for VariantCompletion {
    fn visit(&self, visitor: &mut dyn ArtifactVisitor) -> Result<(), SetError> {
        for artifact in self.artifacts.iter() {
            visitor.visit_artifact(artifact);
        }
        visitor.end_visit_collection(&self.source);
        Ok(())
    }
}

impl ResolvedArtifactSet for ResolvedVariantSet {
    fn source(&self) -> &VisitSource {
        &self.source
    }

    fn start_visit(
        &self,
        _queue: &WorkQueue,
        listener: &mut dyn AsyncArtifactListener,
    ) -> Box<dyn Completion> {
        if listener.prepare_for_visit(&self.source) == VisitType::NoContents {
            return Box::new(EndOfCollection(self.source.clone()));
        }
        for artifact in self.artifacts.iter() {
            listener.artifact_available(artifact);
        }
        Box::new(VariantCompletion {
            source: self.source.clone(),
            artifacts: Arc::clone(&self.artifacts),
        })
    }

    fn visit_local_artifacts(
        &self,
        visitor: &mut dyn LocalArtifactVisitor,
    ) -> Result<(), SetError> {
        self.artifacts
            .iter()
            .filter(|a| a.is_local())
            .for_each(|a| visitor.visit_local_artifact(a));
        Ok(())
    }
}
