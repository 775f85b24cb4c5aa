//! Transformations: ordered chains of steps turning one input file into zero or more outputs.

pub mod registry;
pub mod resolver;
pub mod steps;

pub use registry::{ExecutedTransformations, NoExecutedTransformations, TransformationNodeRegistry};
pub use resolver::{
    DependenciesResolver, DependenciesResolverFactory, LazyDependenciesResolver,
    NoDependenciesFactory, TransformDependencies, UpstreamDependenciesFactory,
};

use anyhow::{Context, Result};
use log::debug;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::ResolvedArtifact;
use crate::error::ArtifactFailure;
use crate::queue::worker::panic_message;

/// Result of transforming one artifact. Immutable once created.
#[derive(Clone, Debug)]
pub enum TransformationOutcome {
    /// Produced files, in step-chain order. May be empty.
    Success(Vec<PathBuf>),
    Failure(ArtifactFailure),
}

impl TransformationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransformationOutcome::Success(_))
    }

    pub fn files(&self) -> Option<&[PathBuf]> {
        match self {
            TransformationOutcome::Success(files) => Some(files),
            TransformationOutcome::Failure(_) => None,
        }
    }
}

/// One step of a transformation (unzip, recompile, repackage, ...).
pub trait TransformStep: Send + Sync {
    fn display_name(&self) -> String;

    /// Whether the step needs the component's upstream files. The resolver is only asked when true.
    fn requires_dependencies(&self) -> bool {
        false
    }

    /// Transform `input` into zero or more files.
    fn transform(&self, input: &Path, dependencies: &TransformDependencies) -> Result<Vec<PathBuf>>;
}

/// Ordered chain of steps. Every output of step N is fed to step N+1.
#[derive(Clone)]
pub struct Transformation {
    steps: Vec<Arc<dyn TransformStep>>,
}

impl Transformation {
    pub fn new(steps: Vec<Arc<dyn TransformStep>>) -> Self {
        Self { steps }
    }

    pub fn single(step: impl TransformStep + 'static) -> Self {
        Self::new(vec![Arc::new(step)])
    }

    /// Append `step` to the end of the chain.
    pub fn then(mut self, step: impl TransformStep + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    /// This chain followed by `next`. Steps of `self` keep resolving their dependencies
    /// through `resolver`; steps of `next` use whatever resolver `apply` is given.
    pub fn followed_by(&self, resolver: Arc<dyn DependenciesResolver>, next: &Transformation) -> Self {
        let mut steps: Vec<Arc<dyn TransformStep>> = self
            .steps
            .iter()
            .map(|step| {
                Arc::new(BoundStep {
                    step: Arc::clone(step),
                    resolver: Arc::clone(&resolver),
                }) as Arc<dyn TransformStep>
            })
            .collect();
        steps.extend(next.steps.iter().cloned());
        Self { steps }
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn display_name(&self) -> String {
        self.steps
            .iter()
            .map(|s| s.display_name())
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Run the whole chain on `artifact`'s file. Errors and panics become a failure outcome.
    pub fn apply(
        &self,
        artifact: &ResolvedArtifact,
        resolver: &dyn DependenciesResolver,
    ) -> TransformationOutcome {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.run_chain(artifact, resolver)))
            .unwrap_or_else(|payload| {
                Err(anyhow::anyhow!(
                    "transform panicked: {}",
                    panic_message(payload.as_ref())
                ))
            });
        match result {
            Ok(files) => {
                debug!(
                    "{}: {} produced {} files",
                    artifact.id,
                    self.display_name(),
                    files.len()
                );
                TransformationOutcome::Success(files)
            }
            Err(e) => TransformationOutcome::Failure(ArtifactFailure::new(artifact.id.clone(), e)),
        }
    }

    fn run_chain(
        &self,
        artifact: &ResolvedArtifact,
        resolver: &dyn DependenciesResolver,
    ) -> Result<Vec<PathBuf>> {
        let mut current = vec![artifact.file.clone()];
        for step in &self.steps {
            let dependencies = if step.requires_dependencies() {
                resolver
                    .dependencies()
                    .with_context(|| format!("resolve dependencies for {}", step.display_name()))?
            } else {
                TransformDependencies::none()
            };
            let mut next = Vec::new();
            for input in &current {
                let outputs = step
                    .transform(input, &dependencies)
                    .with_context(|| format!("{} on {}", step.display_name(), input.display()))?;
                next.extend(outputs);
            }
            current = next;
        }
        Ok(current)
    }
}

impl fmt::Debug for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformation")
            .field("steps", &self.display_name())
            .finish()
    }
}

/// A step pinned to the resolver of the set it came from.
struct BoundStep {
    step: Arc<dyn TransformStep>,
    resolver: Arc<dyn DependenciesResolver>,
}

impl TransformStep for BoundStep {
    fn display_name(&self) -> String {
        self.step.display_name()
    }

    fn transform(&self, input: &Path, _: &TransformDependencies) -> Result<Vec<PathBuf>> {
        let dependencies = if self.step.requires_dependencies() {
            self.resolver.dependencies()?
        } else {
            TransformDependencies::none()
        };
        self.step.transform(input, &dependencies)
    }
}
