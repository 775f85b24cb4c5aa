//! Application configuration constants.
//! Tuning and thresholds in one place.

use std::path::Path;
use std::sync::OnceLock;

use crate::utils::fd_limit::max_workers_by_fd_limit;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    settings_filename: String,
    out_dir_name: String,
    env_prefix: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                settings_filename: format!(".{pkg}.toml"),
                out_dir_name: format!("{pkg}-out"),
                env_prefix: pkg.to_uppercase().replace('-', "_"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    pub fn settings_filename(&self) -> &str {
        &self.settings_filename
    }

    /// Default output directory name (created under the input directory).
    pub fn out_dir_name(&self) -> &str {
        &self.out_dir_name
    }

    /// Name of an environment variable for this package, e.g. `ARTIXFORM_WORKERS`.
    pub fn env_var(&self, suffix: &str) -> String {
        format!("{}_{}", self.env_prefix, suffix)
    }

    /// Settings file looked up in `dir`.
    pub fn settings_path(&self, dir: &Path) -> std::path::PathBuf {
        dir.join(&self.settings_filename)
    }

    /// Names excluded from artifact discovery by default.
    pub fn default_exclude_patterns(&self) -> Vec<String> {
        vec![
            self.settings_filename().to_string(),
            self.out_dir_name().to_string(),
            ".env".to_string(),
        ]
    }
}

// ---- Worker threads ----

/// Worker limits for the transform queue.
/// Use [`WorkerThreadLimits::current()`] to fill `all_threads` from rayon; the rest are const.
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits {
    /// Available threads (from rayon); set by [`WorkerThreadLimits::current()`].
    pub all_threads: usize,
    /// Floor: at least this many workers.
    pub floor: usize,
    /// Hard ceiling, regardless of overrides.
    pub max: usize,
}

impl Default for WorkerThreadLimits {
    fn default() -> Self {
        Self {
            all_threads: 0, // use current() to set from rayon
            floor: Self::FLOOR_THREADS,
            max: Self::MAX_THREADS,
        }
    }
}

impl WorkerThreadLimits {
    pub const FLOOR_THREADS: usize = 1;
    pub const MAX_THREADS: usize = 256;

    /// Build limits with `all_threads` set from `rayon::current_num_threads()`.
    pub fn current() -> Self {
        Self {
            all_threads: rayon::current_num_threads(),
            ..Self::default()
        }
    }

    /// Worker count: `requested` or all threads, capped by the FD limit and `max`, at least `floor`.
    pub fn effective(&self, requested: Option<usize>) -> usize {
        let wanted = requested.unwrap_or(self.all_threads);
        let capped = match max_workers_by_fd_limit() {
            Some(fd_cap) => wanted.min(fd_cap),
            None => wanted,
        };
        capped.clamp(self.floor, self.max)
    }
}

// ---- Hashing ----

/// Hashing I/O thresholds and buffer sizes.
pub struct HashingConsts;

impl HashingConsts {
    /// File size above which hashing uses memory-mapped I/O (bytes). 100 MB.
    pub const HASH_MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;
    /// Chunk size for reading files below mmap threshold (bytes). 1 MB.
    pub const HASH_READ_CHUNK_SIZE: usize = 1024 * 1024;
}

// ---- Module metadata ----

/// Format version written into module metadata documents.
pub const METADATA_FORMAT_VERSION: &str = "1.1";
