//! Transformed artifact set and its completion.

use log::{debug, error};
use std::sync::Arc;

use super::{
    ArtifactVisitor, AsyncArtifactListener, Completion, EndOfCollection, LocalArtifactVisitor,
    ResolvedArtifactSet, TransformingAsyncListener,
};
use crate::cache::ResultCache;
use crate::error::{ArtifactFailure, SetError};
use crate::queue::WorkQueue;
use crate::transform::{
    DependenciesResolver, DependenciesResolverFactory, Transformation, TransformationNodeRegistry,
    TransformationOutcome,
};
use crate::{ArtifactId, Attributes, ComponentId, ResolvedArtifact, VisitSource, VisitType};

/// A set that, when visited, transforms every artifact of its delegate.
///
/// The delegate is shared and not owned. The dependency resolver is created once for
/// `component` and belongs to this set. Each visit gets a fresh result cache.
pub struct TransformedArtifactSet {
    source: VisitSource,
    component: ComponentId,
    delegate: Arc<dyn ResolvedArtifactSet>,
    target_attributes: Attributes,
    transformation: Arc<Transformation>,
    dependencies_resolver: Arc<dyn DependenciesResolver>,
    registry: Arc<dyn TransformationNodeRegistry>,
}

impl TransformedArtifactSet {
    /// When `delegate` is itself transformed, both chains are fused over the innermost
    /// delegate: inner steps keep the inner resolver and the outer target attributes win.
    pub fn new(
        component: ComponentId,
        delegate: Arc<dyn ResolvedArtifactSet>,
        target_attributes: Attributes,
        transformation: Transformation,
        resolver_factory: &dyn DependenciesResolverFactory,
        registry: Arc<dyn TransformationNodeRegistry>,
    ) -> Self {
        let dependencies_resolver = resolver_factory.create(&component);
        let (delegate, transformation) = match delegate.as_transformed() {
            Some(inner) => {
                debug!(
                    "fusing transform of {} into {}",
                    inner.source, target_attributes
                );
                let fused = inner
                    .transformation
                    .followed_by(Arc::clone(&inner.dependencies_resolver), &transformation);
                (Arc::clone(&inner.delegate), fused)
            }
            None => (delegate, transformation),
        };
        let source = VisitSource::new(format!(
            "{} transformed to {}",
            delegate.source(),
            target_attributes
        ));
        Self {
            source,
            component,
            delegate,
            target_attributes,
            transformation: Arc::new(transformation),
            dependencies_resolver,
            registry,
        }
    }

    pub fn component(&self) -> &ComponentId {
        &self.component
    }

    pub fn target_attributes(&self) -> &Attributes {
        &self.target_attributes
    }

    pub fn transformation(&self) -> &Transformation {
        &self.transformation
    }

    pub fn dependencies_resolver(&self) -> &Arc<dyn DependenciesResolver> {
        &self.dependencies_resolver
    }
}

impl ResolvedArtifactSet for TransformedArtifactSet {
    fn source(&self) -> &VisitSource {
        &self.source
    }

    fn start_visit(
        &self,
        queue: &WorkQueue,
        listener: &mut dyn AsyncArtifactListener,
    ) -> Box<dyn Completion> {
        if listener.prepare_for_visit(&self.source) == VisitType::NoContents {
            return Box::new(EndOfCollection(self.source.clone()));
        }
        let cache = Arc::new(ResultCache::new());
        let mut bridge = TransformingAsyncListener::new(
            Arc::clone(&self.transformation),
            queue,
            Arc::clone(&cache),
            Arc::clone(&self.dependencies_resolver),
            Arc::clone(&self.registry),
        );
        let delegate = self.delegate.start_visit(queue, &mut bridge);
        debug!(
            "{}: {} distinct artifacts scheduled",
            self.source,
            cache.len()
        );
        Box::new(TransformCompletion {
            delegate,
            cache,
            target_attributes: self.target_attributes.clone(),
        })
    }

    fn visit_local_artifacts(
        &self,
        _visitor: &mut dyn LocalArtifactVisitor,
    ) -> Result<(), SetError> {
        let err = SetError::UnsupportedForVariant {
            operation: "visit_local_artifacts",
            variant: format!("transformed artifact set '{}'", self.source),
        };
        error!("{err}");
        Err(err)
    }

    fn as_transformed(&self) -> Option<&TransformedArtifactSet> {
        Some(self)
    }
}

/// Replays the delegate's structure, substituting each artifact by its cached outcome.
pub struct TransformCompletion {
    delegate: Box<dyn Completion>,
    cache: Arc<ResultCache>,
    target_attributes: Attributes,
}

impl Completion for TransformCompletion {
    fn visit(&self, visitor: &mut dyn ArtifactVisitor) -> Result<(), SetError> {
        let mut replay = ReplayVisitor {
            cache: &self.cache,
            target_attributes: &self.target_attributes,
            inner: visitor,
            violation: None,
        };
        self.delegate.visit(&mut replay)?;
        match replay.violation {
            Some(err) => {
                error!("{err}");
                Err(err)
            }
            None => Ok(()),
        }
    }
}

struct ReplayVisitor<'a> {
    cache: &'a ResultCache,
    target_attributes: &'a Attributes,
    inner: &'a mut dyn ArtifactVisitor,
    /// First contract violation; nothing further is forwarded once set.
    violation: Option<SetError>,
}

impl ArtifactVisitor for ReplayVisitor<'_> {
    fn visit_artifact(&mut self, artifact: &ResolvedArtifact) {
        if self.violation.is_some() {
            return;
        }
        match self.cache.outcome(&artifact.id) {
            Ok(TransformationOutcome::Success(files)) => {
                for file in files {
                    let produced = ResolvedArtifact {
                        id: ArtifactId::for_file(artifact.id.component.clone(), &file),
                        file,
                        attributes: self.target_attributes.clone(),
                        origin: artifact.origin,
                    };
                    self.inner.visit_artifact(&produced);
                }
            }
            Ok(TransformationOutcome::Failure(failure)) => self.inner.visit_failure(&failure),
            Err(err) => self.violation = Some(err),
        }
    }

    fn visit_failure(&mut self, failure: &ArtifactFailure) {
        if self.violation.is_none() {
            self.inner.visit_failure(failure);
        }
    }

    fn end_visit_collection(&mut self, source: &VisitSource) {
        if self.violation.is_none() {
            self.inner.end_visit_collection(source);
        }
    }
}
