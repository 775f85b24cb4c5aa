//! Built-in transform steps used by the CLI.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{TransformDependencies, TransformStep};
use crate::engine::hashing::digest_file;
use crate::engine::tools::glob_match;

/// Where a step reads its inputs from and writes its outputs to.
#[derive(Clone, Debug)]
pub struct StepDirs {
    /// Discovery root; inputs below it keep their relative layout under `out`.
    pub root: PathBuf,
    pub out: PathBuf,
}

impl StepDirs {
    pub fn new(root: impl Into<PathBuf>, out: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            out: out.into(),
        }
    }

    /// `<out>/<input's dir relative to root>/<file_name>`. Inputs already under `out`
    /// (produced by an earlier step) keep their directory.
    fn output_path(&self, input: &Path, file_name: &str) -> Result<PathBuf> {
        let rel = input
            .strip_prefix(&self.out)
            .or_else(|_| input.strip_prefix(&self.root))
            .with_context(|| {
                format!(
                    "{} is outside {} and {}",
                    input.display(),
                    self.root.display(),
                    self.out.display()
                )
            })?;
        let dir = match rel.parent() {
            Some(parent) => self.out.join(parent),
            None => self.out.clone(),
        };
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(dir.join(file_name))
    }
}

fn file_name_of(input: &Path) -> Result<String> {
    input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", input.display()))
}

/// Copies the input into the output directory.
pub struct CopyStep {
    pub dirs: StepDirs,
}

impl TransformStep for CopyStep {
    fn display_name(&self) -> String {
        "copy".to_string()
    }

    fn transform(&self, input: &Path, _: &TransformDependencies) -> Result<Vec<PathBuf>> {
        let out = self.dirs.output_path(input, &file_name_of(input)?)?;
        if out.as_path() == input {
            return Ok(vec![out]);
        }
        fs::copy(input, &out)
            .with_context(|| format!("copy {} -> {}", input.display(), out.display()))?;
        Ok(vec![out])
    }
}

/// Writes `<name>.blake3` holding the input's hex digest.
pub struct DigestStep {
    pub dirs: StepDirs,
}

impl TransformStep for DigestStep {
    fn display_name(&self) -> String {
        "digest".to_string()
    }

    fn transform(&self, input: &Path, _: &TransformDependencies) -> Result<Vec<PathBuf>> {
        let digest = digest_file(input)?;
        let out = self.dirs.output_path(
            input,
            &format!("{}.blake3", file_name_of(input)?),
        )?;
        fs::write(&out, format!("{}\n", digest.to_hex()))
            .with_context(|| format!("write {}", out.display()))?;
        Ok(vec![out])
    }
}

/// Passes files whose name matches `pattern` through unchanged; drops the rest.
pub struct FilterStep {
    pub pattern: String,
}

impl TransformStep for FilterStep {
    fn display_name(&self) -> String {
        format!("filter:{}", self.pattern)
    }

    fn transform(&self, input: &Path, _: &TransformDependencies) -> Result<Vec<PathBuf>> {
        let name = file_name_of(input)?;
        if glob_match(&self.pattern, &name) {
            Ok(vec![input.to_path_buf()])
        } else {
            Ok(Vec::new())
        }
    }
}

/// Writes `<name>.deps` listing the component's upstream files, one per line.
pub struct DependencyListStep {
    pub dirs: StepDirs,
}

impl TransformStep for DependencyListStep {
    fn display_name(&self) -> String {
        "with-deps".to_string()
    }

    fn requires_dependencies(&self) -> bool {
        true
    }

    fn transform(&self, input: &Path, deps: &TransformDependencies) -> Result<Vec<PathBuf>> {
        let out = self.dirs.output_path(
            input,
            &format!("{}.deps", file_name_of(input)?),
        )?;
        let body: String = deps
            .files()
            .iter()
            .map(|p| format!("{}\n", p.display()))
            .collect();
        fs::write(&out, body).with_context(|| format!("write {}", out.display()))?;
        Ok(vec![out])
    }
}

/// Parse a step name as given on the command line (`copy`, `digest`, `filter:<glob>`, `with-deps`).
pub fn parse_step(name: &str, dirs: &StepDirs) -> Result<Arc<dyn TransformStep>> {
    let dirs = dirs.clone();
    let step: Arc<dyn TransformStep> = match name.split_once(':') {
        Some(("filter", pattern)) if !pattern.is_empty() => Arc::new(FilterStep {
            pattern: pattern.to_string(),
        }),
        Some(_) => bail!("unknown transform step '{name}'"),
        None => match name {
            "copy" => Arc::new(CopyStep { dirs }),
            "digest" => Arc::new(DigestStep { dirs }),
            "with-deps" => Arc::new(DependencyListStep { dirs }),
            _ => bail!("unknown transform step '{name}'"),
        },
    };
    Ok(step)
}
