//! Content hashes recorded per source file, and the key used to locate the
//! metadata store of a source tree.
//!
//! Unlike mtime-based staleness checks, a file is considered changed only
//! when its bytes change; touching a file is not enough to rebuild it.

use anyhow::Context;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Hex-encoded SHA-256 of a file's contents.
pub fn hash_file(path: &Path) -> anyhow::Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("hash {}", path.display()))?;
    Ok(hash_bytes(&bytes))
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Stable name for the metadata store of a source tree, derived from its
/// absolute path so distinct trees never share a store.
pub fn tree_key(source_dir: &Path) -> String {
    format!(
        ".incjc-meta-{}",
        hash_bytes(source_dir.to_string_lossy().as_bytes())
    )
}
