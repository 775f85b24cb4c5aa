//! Command handlers for transform and toolchain listing

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::artifacts::{
    ArtifactCollector, CompositeArtifactSet, ResolvedArtifactSet, TransformedArtifactSet, VisitAll,
};
use crate::engine::discovery::discover_components;
use crate::engine::progress::{create_counter, progress_callback, set_bar_total};
use crate::publish::{ModuleMetadataWriter, Publication, SoftwareComponent, UsageContext};
use crate::queue::WorkQueue;
use crate::toolchain::{StaticToolchainRegistry, ToolchainQueryService};
use crate::transform::steps::{StepDirs, parse_step};
use crate::transform::{
    NoExecutedTransformations, Transformation, TransformationNodeRegistry,
    UpstreamDependenciesFactory,
};
use crate::utils::config::{PackagePaths, WorkerThreadLimits};
use crate::utils::Settings;
use crate::{Attributes, ComponentId, Opts, QueueOpts, VisitSource};

const DEFAULT_STEP: &str = "copy";

fn resolve_out_dir(root: &Path, opts: &Opts) -> Result<PathBuf> {
    Ok(match &opts.out_dir {
        Some(p) if p.is_absolute() => p.clone(),
        Some(p) => std::env::current_dir()
            .context("current directory")?
            .join(p),
        None => root.join(PackagePaths::get().out_dir_name()),
    })
}

fn build_transformation(opts: &Opts, dirs: &StepDirs) -> Result<Transformation> {
    let names: Vec<&str> = if opts.steps.is_empty() {
        vec![DEFAULT_STEP]
    } else {
        opts.steps.iter().map(String::as_str).collect()
    };
    let steps = names
        .into_iter()
        .map(|s| parse_step(s, dirs))
        .collect::<Result<Vec<_>>>()?;
    Ok(Transformation::new(steps))
}

/// One usage per component, in replay order, holding that component's produced files.
fn publication_for(root_name: &str, collected: &ArtifactCollector, attributes: &Attributes) -> Publication {
    let mut usages: Vec<UsageContext> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for artifact in collected.artifacts() {
        let name = artifact.id.component.as_str().to_string();
        let i = *index.entry(name.clone()).or_insert_with(|| {
            usages.push(UsageContext {
                name,
                attributes: attributes.clone(),
                artifacts: Vec::new(),
            });
            usages.len() - 1
        });
        usages[i].artifacts.push(artifact.file.clone());
    }
    Publication {
        name: root_name.to_string(),
        component: Some(SoftwareComponent {
            name: root_name.to_string(),
            usages,
        }),
    }
}

/// Handle transform command: discover, schedule, drain, replay.
pub fn handle_transform(dir: &Path, opts: &Opts, settings: Settings) -> Result<()> {
    let root = dir
        .canonicalize()
        .with_context(|| format!("resolve {}", dir.display()))?;
    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string());
    let out_dir = resolve_out_dir(&root, opts)?;
    let mut exclude = PackagePaths::get().default_exclude_patterns();
    exclude.extend(opts.exclude.iter().cloned());

    let transformation = build_transformation(opts, &StepDirs::new(&root, &out_dir))?;
    debug!("transformation: {}", transformation.display_name());

    let components = discover_components(&root, Some(out_dir.as_path()), &exclude)?;
    if components.is_empty() {
        warn!("No artifacts found under {}", root.display());
        return Ok(());
    }

    let upstream = settings
        .upstream
        .into_iter()
        .map(|(k, v)| (ComponentId::new(k), v))
        .collect();
    let factory = UpstreamDependenciesFactory::new(upstream);
    let registry: Arc<dyn TransformationNodeRegistry> = Arc::new(NoExecutedTransformations);
    let sets = components
        .into_iter()
        .map(|(component, variant)| {
            Arc::new(TransformedArtifactSet::new(
                component,
                Arc::new(variant),
                opts.target_attributes.clone(),
                transformation.clone(),
                &factory,
                Arc::clone(&registry),
            )) as Arc<dyn ResolvedArtifactSet>
        })
        .collect();
    let composite = CompositeArtifactSet::new(
        VisitSource::new(format!("components of {}", root.display())),
        sets,
    );

    let queue_opts = QueueOpts {
        max_workers: WorkerThreadLimits::current().effective(opts.num_workers),
    };
    let bar = opts.verbose.then(|| create_counter("Transforming"));
    let queue = WorkQueue::with_progress("artifact transforms", &queue_opts, progress_callback(&bar));
    let cancel_requested = queue.cancel_handle();
    ctrlc::set_handler(move || {
        cancel_requested.store(true, Ordering::Relaxed);
    })
    .context("set Ctrl+C handler")?;

    let completion = composite.start_visit(&queue, &mut VisitAll);
    if let Some(ref b) = bar {
        set_bar_total(b, queue.submitted());
    }
    let drained = queue.wait_for_completion();
    if bar.is_some() {
        eprintln!();
    }

    let mut collected = ArtifactCollector::new();
    completion.visit(&mut collected)?;
    for file in collected.files() {
        println!("{}", file.display());
    }
    for failure in collected.failures() {
        warn!("{failure}");
    }

    let report = drained?;
    info!(
        "{} transforms done in {:.2?}",
        report.completed, report.elapsed
    );

    if let Some(ref path) = opts.metadata_path {
        let publication = publication_for(&root_name, &collected, &opts.target_attributes);
        if ModuleMetadataWriter.write_to(path, &publication)? {
            info!("module metadata written to {}", path.display());
        }
    }

    let failed = collected.failures().count();
    if failed > 0 {
        bail!("{failed} artifacts failed to transform");
    }
    Ok(())
}

/// Handle toolchains command
pub fn handle_toolchains(settings: Settings) -> Result<()> {
    let listing = ToolchainQueryService::new(StaticToolchainRegistry::new(settings.toolchains)).query();
    if listing.is_empty() {
        info!("No toolchains configured");
    } else {
        println!("{listing}");
    }
    Ok(())
}
