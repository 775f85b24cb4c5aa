use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Temporary sibling of `path` used for write-then-rename.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(env!("CARGO_PKG_NAME"));
    path.parent()
        .unwrap_or(Path::new("."))
        .join(format!("{name}.tmp"))
}

/// Write `contents` to a temp file next to `path`, then rename over `path` (atomic update).
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let temp_path = temp_path_for(path);
    fs::write(&temp_path, contents)
        .with_context(|| format!("write temp file {}", temp_path.display()))?;
    fs::rename(&temp_path, path).with_context(|| {
        format!(
            "atomic rename temp file to final path ({} -> {})",
            temp_path.display(),
            path.display()
        )
    })
}
