//! Results of transforms that already ran as scheduled nodes of the execution graph.
//!
//! When the graph executed a transform ahead of time, the bridge listener takes the result
//! from here instead of queueing the work again.

use dashmap::DashMap;

use super::{Transformation, TransformationOutcome};
use crate::ArtifactId;

pub trait TransformationNodeRegistry: Send + Sync {
    fn get_if_executed(
        &self,
        artifact: &ArtifactId,
        transformation: &Transformation,
    ) -> Option<TransformationOutcome>;
}

/// Registry that never has a result.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoExecutedTransformations;

impl TransformationNodeRegistry for NoExecutedTransformations {
    fn get_if_executed(&self, _: &ArtifactId, _: &Transformation) -> Option<TransformationOutcome> {
        None
    }
}

/// Concurrent registry keyed by artifact and transformation display name.
#[derive(Debug, Default)]
pub struct ExecutedTransformations {
    nodes: DashMap<(ArtifactId, String), TransformationOutcome>,
}

impl ExecutedTransformations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a transform node that finished executing.
    pub fn record(
        &self,
        artifact: ArtifactId,
        transformation: &Transformation,
        outcome: TransformationOutcome,
    ) {
        self.nodes
            .insert((artifact, transformation.display_name()), outcome);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl TransformationNodeRegistry for ExecutedTransformations {
    fn get_if_executed(
        &self,
        artifact: &ArtifactId,
        transformation: &Transformation,
    ) -> Option<TransformationOutcome> {
        self.nodes
            .get(&(artifact.clone(), transformation.display_name()))
            .map(|n| n.value().clone())
    }
}
