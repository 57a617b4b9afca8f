//! Filesystem helpers: finding sources and compiled artifacts, and mapping
//! class names to artifact paths.

use anyhow::{bail, Context};
use rustc_hash::FxHashSet;
use std::path::{Component, Path, PathBuf};

pub const SOURCE_EXT: &str = "java";
pub const CLASS_EXT: &str = "class";

/// Recursively collects regular files under `dir` with the given extension.
/// Walks with an explicit stack so deep trees can't overflow.
pub fn find_files(dir: &Path, ext: &str) -> anyhow::Result<FxHashSet<PathBuf>> {
    let mut found = FxHashSet::default();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries =
            std::fs::read_dir(&dir).with_context(|| format!("read dir {}", dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("read dir {}", dir.display()))?;
            let file_type = entry.file_type()?;
            let path = entry.path();
            if file_type.is_dir() {
                stack.push(path);
            } else if file_type.is_file() && path.extension().map_or(false, |e| e == ext) {
                found.insert(path);
            }
        }
    }
    Ok(found)
}

pub fn find_sources(dir: &Path) -> anyhow::Result<FxHashSet<PathBuf>> {
    find_files(dir, SOURCE_EXT).context("find source files")
}

pub fn find_class_files(dir: &Path) -> anyhow::Result<FxHashSet<PathBuf>> {
    find_files(dir, CLASS_EXT).with_context(|| format!("find class files in {}", dir.display()))
}

/// Relative artifact path of a class: "a.b.C$D" => "a/b/C$D.class".
pub fn class_file_path(class_name: &str) -> PathBuf {
    let mut path: PathBuf = class_name.split('.').collect();
    path.set_extension(CLASS_EXT);
    path
}

/// Makes `dir` an existing, empty directory.
pub fn clean_dir(dir: &Path) -> anyhow::Result<()> {
    match std::fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {
            for entry in
                std::fs::read_dir(dir).with_context(|| format!("clean {}", dir.display()))?
            {
                let path = entry?.path();
                remove_any(&path).with_context(|| format!("remove {}", path.display()))?;
            }
        }
        Ok(_) => bail!("classpath provided is not a directory: {}", dir.display()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        Err(err) => return Err(err).with_context(|| format!("stat {}", dir.display())),
    }
    Ok(())
}

/// Resolves `path` against the current directory and removes "." and ".."
/// components lexically.
pub fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Converts a path to the string form recorded in metadata.
pub fn path_string(path: PathBuf) -> anyhow::Result<String> {
    path.into_os_string()
        .into_string()
        .map_err(|p| anyhow::anyhow!("path is not valid unicode: {:?}", p))
}

/// Removes a file or a directory tree, whichever is at `path`.  Absent is fine.
pub fn remove_any(path: &Path) -> std::io::Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}
