//! Decides what to recompile and publishes the result.
//!
//! With no usable metadata for a source tree everything is compiled straight
//! into the output directory.  Otherwise only changed sources and the
//! sources depending on them are compiled, into a scratch directory against
//! a copy of the unaffected classes; the output directory and the metadata
//! are only touched once the compiler has succeeded.

use crate::detect::detect;
use crate::fs::{absolute, clean_dir, find_class_files, find_sources, path_string};
use crate::hash::tree_key;
use crate::meta::{self, MetaInfo};
use crate::stage::{copy_class_files, delete_class_files, Workspace};
use crate::toolchain::{Compiler, Examiner};
use crate::trace;
use anyhow::Context;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, PartialEq)]
pub enum BuildOutcome {
    /// The source tree holds no sources.
    NoSources,
    /// Nothing needed recompiling.
    UpToDate,
    /// Compiled this many sources.
    Compiled(usize),
    /// The compiler rejected the sources; nothing was published.
    CompileFailed,
}

impl BuildOutcome {
    pub fn success(&self) -> bool {
        *self != BuildOutcome::CompileFailed
    }
}

fn sorted<'a>(items: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut v: Vec<String> = items.into_iter().cloned().collect();
    v.sort();
    v
}

pub struct Builder<'a> {
    compiler: &'a dyn Compiler,
    examiner: &'a dyn Examiner,
    meta_root: &'a Path,
}

impl<'a> Builder<'a> {
    pub fn new(compiler: &'a dyn Compiler, examiner: &'a dyn Examiner, meta_root: &'a Path) -> Self {
        Builder {
            compiler,
            examiner,
            meta_root,
        }
    }

    /// Where the metadata for `source_dir` (an absolute path) is stored.
    pub fn meta_dir(&self, source_dir: &Path) -> PathBuf {
        self.meta_root.join(tree_key(source_dir))
    }

    /// Builds every source under `source_dir` into `classpath`.
    pub fn build(&self, classpath: &Path, source_dir: &Path) -> anyhow::Result<BuildOutcome> {
        let classpath = absolute(classpath).context("resolve classpath")?;
        let source_dir = absolute(source_dir).context("resolve source directory")?;

        let sources = find_sources(&source_dir)?
            .into_iter()
            .map(path_string)
            .collect::<anyhow::Result<FxHashSet<String>>>()?;
        if sources.is_empty() {
            println!("No sources found.");
            return Ok(BuildOutcome::NoSources);
        }
        debug!(sources = ?sorted(&sources), "all sources");

        let meta_dir = self.meta_dir(&source_dir);
        if !meta::exists(&meta_dir) {
            println!(
                "No meta information found in {}. Recompiling all sources.",
                meta_dir.display()
            );
            return self.build_fully(&classpath, &source_dir, &sources, meta_dir);
        }
        self.build_incrementally(&classpath, &source_dir, &sources, &meta_dir)
    }

    fn build_fully(
        &self,
        classpath: &Path,
        source_dir: &Path,
        sources: &FxHashSet<String>,
        meta_dir: PathBuf,
    ) -> anyhow::Result<BuildOutcome> {
        clean_dir(classpath)?;
        let hashes = trace::scope("detect", || detect(sources, &FxHashMap::default()))?.changed;

        let list = sorted(sources);
        if !trace::scope("compile", || self.compiler.compile(&list, classpath, classpath))? {
            return Ok(BuildOutcome::CompileFailed);
        }

        meta::reset_at(&meta_dir)?;
        let mut meta = MetaInfo::new(meta_dir);
        self.record(&mut meta, source_dir, hashes, classpath)?;
        trace::scope("save", || meta.save())?;
        info!(sources = list.len(), classes = meta.classes.len(), "full build done");
        Ok(BuildOutcome::Compiled(list.len()))
    }

    fn build_incrementally(
        &self,
        classpath: &Path,
        source_dir: &Path,
        sources: &FxHashSet<String>,
        meta_dir: &Path,
    ) -> anyhow::Result<BuildOutcome> {
        let mut meta = MetaInfo::load(meta_dir)?;
        let changes = trace::scope("detect", || detect(sources, &meta.sources))?;
        let seeds = changes.seeds();
        let affected = trace::scope("closure", || meta.affected_sources(&seeds))?;
        let recompile: FxHashSet<String> = affected
            .union(&seeds)
            .filter(|src| !changes.deleted.contains(*src))
            .cloned()
            .collect();

        // Classes about to be rebuilt, or whose source is gone: stale as of now.
        let stale_sources: FxHashSet<String> =
            recompile.union(&changes.deleted).cloned().collect();
        let classes_to_skip = meta.classes_by_sources(&stale_sources);

        if recompile.is_empty() {
            if !changes.deleted.is_empty() {
                debug!(sources = ?sorted(&changes.deleted), "pruning deleted sources");
                meta.delete_classes_and_deps(&classes_to_skip);
                meta.delete_sources(&changes.deleted);
                trace::scope("save", || meta.save())?;
                delete_class_files(classpath, &classes_to_skip)?;
            }
            println!("Nothing to compile.");
            return Ok(BuildOutcome::UpToDate);
        }
        let list = sorted(&recompile);
        println!("Sources to compile:\n{}", list.join("\n"));

        // Dropping the workspace removes both scratch directories, on every
        // return path below.
        let ws = trace::scope("stage", || -> anyhow::Result<Workspace> {
            let ws = Workspace::new()?;
            let unaffected = meta
                .classes
                .keys()
                .filter(|class| !classes_to_skip.contains(*class));
            copy_class_files(classpath, ws.classpath(), unaffected)?;
            Ok(ws)
        })?;

        if !trace::scope("compile", || {
            self.compiler.compile(&list, ws.classpath(), ws.dest())
        })? {
            return Ok(BuildOutcome::CompileFailed);
        }

        meta.delete_classes_and_deps(&classes_to_skip);
        meta.delete_sources(&changes.deleted);
        let new_classes = self.record(&mut meta, source_dir, changes.changed, ws.dest())?;
        trace::scope("save", || meta.save())?;

        trace::scope("publish", || -> anyhow::Result<()> {
            delete_class_files(classpath, &classes_to_skip)?;
            copy_class_files(ws.dest(), classpath, &new_classes)
        })?;
        info!(
            sources = list.len(),
            classes = new_classes.len(),
            "incremental build done"
        );
        Ok(BuildOutcome::Compiled(list.len()))
    }

    /// Records new source hashes and the facts examined from every class
    /// file under `classes_root`.  Returns the names of the examined classes.
    fn record(
        &self,
        meta: &mut MetaInfo,
        source_dir: &Path,
        hashes: FxHashMap<String, String>,
        classes_root: &Path,
    ) -> anyhow::Result<FxHashSet<String>> {
        meta.add_sources(hashes);
        let mut class_files: Vec<PathBuf> = find_class_files(classes_root)?.into_iter().collect();
        class_files.sort();
        let facts = trace::scope("examine", || self.examiner.examine(&class_files))?;
        Ok(meta.record_batch(source_dir, &facts).into_iter().collect())
    }
}
