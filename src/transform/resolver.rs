//! Resolution of a transform's extra inputs (upstream component outputs).
//!
//! One resolver per component, shared by every operation transforming that component's
//! artifacts. Resolution is lazy and happens at most once, even under concurrent first use.

use anyhow::{Result, anyhow};
use log::debug;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use crate::ComponentId;

/// Files a step receives besides its primary input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransformDependencies {
    files: Arc<Vec<PathBuf>>,
}

impl TransformDependencies {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files: Arc::new(files),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

pub trait DependenciesResolver: Send + Sync {
    fn component(&self) -> &ComponentId;

    /// Upstream files for this component. Computed on first call, cached afterwards.
    fn dependencies(&self) -> Result<TransformDependencies>;
}

/// Creates the resolver a transformed set uses for its component.
pub trait DependenciesResolverFactory: Send + Sync {
    fn create(&self, component: &ComponentId) -> Arc<dyn DependenciesResolver>;
}

type ComputeFn = dyn Fn(&ComponentId) -> Result<Vec<PathBuf>> + Send + Sync;

/// Resolver that runs `compute` once, on first demand. Concurrent first callers block
/// until the single computation finishes. A failed computation is cached too.
pub struct LazyDependenciesResolver {
    component: ComponentId,
    compute: Box<ComputeFn>,
    resolved: OnceLock<Result<TransformDependencies, Arc<anyhow::Error>>>,
}

impl LazyDependenciesResolver {
    pub fn new<F>(component: ComponentId, compute: F) -> Self
    where
        F: Fn(&ComponentId) -> Result<Vec<PathBuf>> + Send + Sync + 'static,
    {
        Self {
            component,
            compute: Box::new(compute),
            resolved: OnceLock::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }
}

impl DependenciesResolver for LazyDependenciesResolver {
    fn component(&self) -> &ComponentId {
        &self.component
    }

    fn dependencies(&self) -> Result<TransformDependencies> {
        let resolved = self.resolved.get_or_init(|| {
            debug!("resolving transform dependencies of {}", self.component);
            (self.compute)(&self.component)
                .map(TransformDependencies::new)
                .map_err(Arc::new)
        });
        match resolved {
            Ok(deps) => Ok(deps.clone()),
            Err(e) => Err(anyhow!("dependencies of {}: {:#}", self.component, e)),
        }
    }
}

/// Every component resolves to no extra inputs.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDependenciesFactory;

impl DependenciesResolverFactory for NoDependenciesFactory {
    fn create(&self, component: &ComponentId) -> Arc<dyn DependenciesResolver> {
        Arc::new(LazyDependenciesResolver::new(component.clone(), |_| Ok(Vec::new())))
    }
}

/// Resolves a component's dependencies from a component → upstream files table.
/// Components missing from the table have no dependencies.
#[derive(Clone, Debug, Default)]
pub struct UpstreamDependenciesFactory {
    upstream: Arc<HashMap<ComponentId, Vec<PathBuf>>>,
}

impl UpstreamDependenciesFactory {
    pub fn new(upstream: HashMap<ComponentId, Vec<PathBuf>>) -> Self {
        Self {
            upstream: Arc::new(upstream),
        }
    }
}

impl DependenciesResolverFactory for UpstreamDependenciesFactory {
    fn create(&self, component: &ComponentId) -> Arc<dyn DependenciesResolver> {
        let upstream = Arc::clone(&self.upstream);
        Arc::new(LazyDependenciesResolver::new(component.clone(), move |c| {
            Ok(upstream.get(c).cloned().unwrap_or_default())
        }))
    }
}
