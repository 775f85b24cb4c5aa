//! Content digests of artifact files (blake3).

use anyhow::{Context, Result};
use blake3::{Hash, Hasher};
use memmap2::Mmap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::utils::config::HashingConsts;

/// Digest of the file at `path`. Large artifacts are memory-mapped, the rest streamed in chunks.
pub fn digest_file(path: &Path) -> Result<Hash> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let len = file
        .metadata()
        .with_context(|| format!("stat {}", path.display()))?
        .len();
    let mut hasher = Hasher::new();
    if len > HashingConsts::HASH_MMAP_THRESHOLD {
        // SAFETY: read-only map; an artifact truncated underneath us is a failed transform anyway.
        let map = unsafe { Mmap::map(&file) }.with_context(|| format!("mmap {}", path.display()))?;
        hasher.update(&map);
    } else {
        let reader = BufReader::with_capacity(HashingConsts::HASH_READ_CHUNK_SIZE, file);
        hasher
            .update_reader(reader)
            .with_context(|| format!("read {}", path.display()))?;
    }
    Ok(hasher.finalize())
}
