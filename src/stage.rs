//! Staging of compiled artifacts, so a partial recompile never touches the
//! live output directory until it has succeeded.

use crate::fs::class_file_path;
use anyhow::Context;
use rustc_hash::FxHashSet;
use std::path::Path;
use tempfile::TempDir;
use tracing::debug;

const TMP_PREFIX: &str = "tmp-incjc-";

/// The two scratch directories of one incremental build attempt: a copy of
/// the unaffected classes to compile against, and the compiler's
/// destination.  Both are removed when this is dropped, however the
/// attempt ends.
pub struct Workspace {
    classpath: TempDir,
    dest: TempDir,
}

impl Workspace {
    pub fn new() -> anyhow::Result<Self> {
        let tmp = || {
            tempfile::Builder::new()
                .prefix(TMP_PREFIX)
                .tempdir()
                .context("create temporary directory")
        };
        Ok(Workspace {
            classpath: tmp()?,
            dest: tmp()?,
        })
    }

    pub fn classpath(&self) -> &Path {
        self.classpath.path()
    }

    pub fn dest(&self) -> &Path {
        self.dest.path()
    }
}

/// Copies each class's artifact from `src` to the same relative path under
/// `dst`.
pub fn copy_class_files<'a>(
    src: &Path,
    dst: &Path,
    classes: impl IntoIterator<Item = &'a String>,
) -> anyhow::Result<()> {
    for class in classes {
        let rel = class_file_path(class);
        let from = src.join(&rel);
        let to = dst.join(&rel);
        debug!(from = %from.display(), to = %to.display(), "copying class");
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        std::fs::copy(&from, &to)
            .with_context(|| format!("copy class from {} to {}", from.display(), to.display()))?;
    }
    Ok(())
}

/// Deletes each class's artifact from `dir`.
pub fn delete_class_files(dir: &Path, classes: &FxHashSet<String>) -> anyhow::Result<()> {
    for class in classes {
        let path = dir.join(class_file_path(class));
        debug!(path = %path.display(), "deleting class file");
        std::fs::remove_file(&path)
            .with_context(|| format!("delete class file {}", path.display()))?;
    }
    Ok(())
}
