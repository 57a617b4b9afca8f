//! Change detection: which sources differ from the last successful build.

use crate::hash::hash_file;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Default)]
pub struct Changes {
    /// New or modified sources, mapped to their current content hash.
    pub changed: FxHashMap<String, String>,
    /// Sources recorded previously that no longer exist.
    pub deleted: FxHashSet<String>,
}

impl Changes {
    /// Changed, new and deleted sources together.
    pub fn seeds(&self) -> FxHashSet<String> {
        self.changed
            .keys()
            .chain(self.deleted.iter())
            .cloned()
            .collect()
    }
}

/// Compares the current sources against the hashes recorded last time.
/// Only file contents matter; timestamps are never consulted.
pub fn detect(
    sources: &FxHashSet<String>,
    previous: &FxHashMap<String, String>,
) -> anyhow::Result<Changes> {
    let hashed: Vec<(&String, String)> = sources
        .par_iter()
        .map(|src| -> anyhow::Result<(&String, String)> {
            Ok((src, hash_file(Path::new(src))?))
        })
        .collect::<anyhow::Result<_>>()?;

    let mut changed = FxHashMap::default();
    for (src, hash) in hashed {
        let old = previous.get(src);
        debug!(source = %src, old = ?old, new = %hash, "comparing hashes");
        if old != Some(&hash) {
            changed.insert(src.clone(), hash);
        }
    }
    if changed.is_empty() {
        debug!("no changed or new sources found");
    } else {
        debug!(sources = ?changed.keys().collect::<Vec<_>>(), "changed or new sources");
    }

    let deleted: FxHashSet<String> = previous
        .keys()
        .filter(|src| !sources.contains(*src))
        .cloned()
        .collect();
    Ok(Changes { changed, deleted })
}
