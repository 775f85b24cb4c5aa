//! Load `.artixform.toml` from a directory (CLI only). Library callers build `Opts` / `QueueOpts` themselves.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::Opts;
use crate::toolchain::Installation;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    settings: TransformSection,
    /// Known toolchain installations, for `toolchains`.
    #[serde(default)]
    pub toolchains: Vec<Installation>,
    /// Component name → upstream files handed to steps that need dependencies.
    #[serde(default)]
    pub upstream: HashMap<String, Vec<PathBuf>>,
}

#[derive(Debug, Default, Deserialize)]
struct TransformSection {
    workers: Option<usize>,
    out_dir: Option<String>,
    steps: Option<Vec<String>>,
    attributes: Option<HashMap<String, String>>,
    exclude: Option<Vec<String>>,
    verbose: Option<bool>,
    metadata: Option<String>,
}

impl Settings {
    /// `verbose` from the `[settings]` table; false when absent.
    pub fn verbose(&self) -> bool {
        self.settings.verbose.unwrap_or(false)
    }

    pub fn from_toml_str(s: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

/// Load the settings file from `dir`. `Ok(None)` when there is none; a malformed file is an error.
pub fn load_settings(dir: &Path) -> Result<Option<Settings>> {
    let path = PackagePaths::get().settings_path(dir);
    if !path.is_file() {
        return Ok(None);
    }
    let s = std::fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let settings =
        Settings::from_toml_str(&s).with_context(|| format!("parse {}", path.display()))?;
    Ok(Some(settings))
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $opts:expr, $field:ident => $opts_field:ident) => {
        if let Some(v) = $section.$field.clone() {
            $opts.$opts_field = v;
        }
    };
}

/// Apply file settings to opts (only fields present in the file). Call before env and CLI.
pub fn apply_settings_to_opts(file: &Settings, opts: &mut Opts) {
    let section = &file.settings;
    if let Some(n) = section.workers {
        opts.num_workers = Some(n);
    }
    if let Some(ref p) = section.out_dir {
        opts.out_dir = Some(PathBuf::from(p));
    }
    apply_file_opt!(section, opts, steps => steps);
    apply_file_opt!(section, opts, exclude => exclude);
    apply_file_opt!(section, opts, verbose => verbose);
    if let Some(ref attrs) = section.attributes {
        for (k, v) in attrs {
            opts.target_attributes.insert(k.clone(), v.clone());
        }
    }
    if let Some(ref p) = section.metadata {
        opts.metadata_path = Some(PathBuf::from(p));
    }
}

/// Apply environment overrides: process env first, then a `.env` file in `dir`.
/// Only `<PKG>_WORKERS` is read.
pub fn apply_env_to_opts(dir: &Path, opts: &mut Opts) {
    let key = PackagePaths::get().env_var("WORKERS");
    let env_path = dir.join(".env");
    if std::env::var(&key).is_err() && env_path.is_file() {
        let _ = dotenvy::from_path(&env_path);
    }
    if let Ok(s) = std::env::var(&key) {
        match s.trim().parse::<usize>() {
            Ok(n) => opts.num_workers = Some(n),
            Err(_) => log::warn!("{key}={s} is not a worker count; ignoring"),
        }
    }
}
