//! Artifact discovery for the CLI: a directory tree becomes one resolved set per component.
//!
//! Every immediate subdirectory of the root is a component; files below it are its local
//! artifacts. Files directly in the root belong to a component named after the root.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::artifacts::ResolvedVariantSet;
use crate::engine::tools::{path_relative_to, should_include_artifact};
use crate::{ArtifactId, Attributes, ComponentId, ResolvedArtifact, VisitSource};

/// Artifact id for `file` (relative to its component dir): name is the relative path without extension.
pub fn artifact_id_for(component: &ComponentId, rel: &Path) -> ArtifactId {
    let extension = rel
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = rel.with_extension("");
    let name = stem
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    ArtifactId::new(component.clone(), name, extension)
}

fn artifact_for(component: &ComponentId, base: &Path, file: PathBuf) -> ResolvedArtifact {
    let rel = path_relative_to(&file, base).unwrap_or_else(|| file.clone());
    let id = artifact_id_for(component, &rel);
    let attributes = Attributes::new().with("artifactType", id.extension.clone());
    ResolvedArtifact::new(id, file, attributes).local()
}

fn component_set(
    component: ComponentId,
    dir: &Path,
    max_depth: usize,
    root: &Path,
    out_dir: Option<&Path>,
    exclude: &[String],
) -> ResolvedVariantSet {
    let artifacts = WalkDir::new(dir)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|r| match r {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipped during discovery: {e}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| should_include_artifact(p, root, out_dir, exclude))
        .map(|p| artifact_for(&component, dir, p))
        .collect::<Vec<_>>();
    debug!("component {}: {} artifacts", component, artifacts.len());
    ResolvedVariantSet::new(VisitSource::new(format!("artifacts of {component}")), artifacts)
}

/// Discover components under `root`, in file-name order. Empty components are dropped.
pub fn discover_components(
    root: &Path,
    out_dir: Option<&Path>,
    exclude: &[String],
) -> Result<Vec<(ComponentId, ResolvedVariantSet)>> {
    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string());
    let mut components = Vec::new();

    let root_component = ComponentId::new(root_name);
    let root_set = component_set(root_component.clone(), root, 1, root, out_dir, exclude);
    if !root_set.artifacts().is_empty() {
        components.push((root_component, root_set));
    }

    let mut dirs = std::fs::read_dir(root)
        .with_context(|| format!("read {}", root.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir() && should_include_artifact(p, root, out_dir, exclude))
        .collect::<Vec<_>>();
    dirs.sort();
    for dir in dirs {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let component = ComponentId::new(name);
        let set = component_set(component.clone(), &dir, usize::MAX, root, out_dir, exclude);
        if !set.artifacts().is_empty() {
            components.push((component, set));
        }
    }
    Ok(components)
}
