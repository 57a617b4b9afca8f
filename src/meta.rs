//! The metadata store records, per source tree, what the last successful
//! build saw: source hashes, the classes each source produced, and the
//! dependency edges between those classes.
//!
//! On disk a store is a directory of three flat text tables, one record per
//! line with fields joined by `->`.  A store counts as present only when all
//! three tables exist.

use crate::fs::remove_any;
use crate::graph::DepGraph;
use crate::toolchain::ClassFact;
use anyhow::{anyhow, bail, Context};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const CLASSES_FILE: &str = "classes.txt";
const SOURCES_FILE: &str = "sources.txt";
const DEPS_FILE: &str = "deps.txt";
const FIELD_SEP: &str = "->";

pub struct MetaInfo {
    dir: PathBuf,
    /// Source path => content hash.
    pub sources: FxHashMap<String, String>,
    /// Class name => source path.
    pub classes: FxHashMap<String, String>,
    pub deps: DepGraph,
}

/// Whether a complete store exists at `dir`.
pub fn exists(dir: &Path) -> bool {
    dir.is_dir()
        && [CLASSES_FILE, SOURCES_FILE, DEPS_FILE]
            .iter()
            .all(|name| dir.join(name).is_file())
}

/// Replaces whatever is at `dir` with an empty, valid store.
pub fn reset_at(dir: &Path) -> anyhow::Result<()> {
    (|| -> std::io::Result<()> {
        remove_any(dir)?;
        std::fs::create_dir_all(dir)?;
        for name in [CLASSES_FILE, SOURCES_FILE, DEPS_FILE] {
            std::fs::File::create(dir.join(name))?;
        }
        Ok(())
    })()
    .with_context(|| format!("initialize metadata directory {}", dir.display()))
}

/// Splits a table line into its two fields.  `last` splits at the final
/// separator, for tables whose first field is a path.
fn split_line<'a>(line: &'a str, last: bool) -> Option<(&'a str, &'a str)> {
    if last {
        line.rsplit_once(FIELD_SEP)
    } else {
        line.split_once(FIELD_SEP)
    }
}

fn read_table(path: &Path, last: bool, mut add: impl FnMut(&str, &str)) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read metadata {}", path.display()))?;
    for (lineno, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let (key, value) = split_line(line, last).ok_or_else(|| {
            anyhow!("{}:{}: malformed metadata line", path.display(), lineno + 1)
        })?;
        add(key, value);
    }
    Ok(())
}

fn write_table<'a>(
    path: &Path,
    rows: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> anyhow::Result<()> {
    (|| -> std::io::Result<()> {
        let mut w = BufWriter::new(std::fs::File::create(path)?);
        for (key, value) in rows {
            writeln!(w, "{}{}{}", key, FIELD_SEP, value)?;
        }
        w.flush()
    })()
    .with_context(|| format!("write metadata {}", path.display()))
}

fn sorted_rows(map: &FxHashMap<String, String>) -> BTreeMap<&str, &str> {
    map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

impl MetaInfo {
    /// An empty in-memory store that will save to `dir`.
    pub fn new(dir: PathBuf) -> Self {
        MetaInfo {
            dir,
            sources: FxHashMap::default(),
            classes: FxHashMap::default(),
            deps: DepGraph::new(),
        }
    }

    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let mut meta = MetaInfo::new(dir.to_path_buf());
        read_table(&dir.join(CLASSES_FILE), false, |class, src| {
            meta.classes.insert(class.to_owned(), src.to_owned());
        })?;
        read_table(&dir.join(SOURCES_FILE), true, |src, hash| {
            meta.sources.insert(src.to_owned(), hash.to_owned());
        })?;
        let deps = &mut meta.deps;
        read_table(&dir.join(DEPS_FILE), false, |dependency, dependent| {
            deps.add_edge(dependency, dependent);
        })?;
        Ok(meta)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes all three tables, replacing the previous store as a whole.
    /// The tables are written into a sibling directory first, so an
    /// interrupted save leaves either the old store or none at all.
    pub fn save(&self) -> anyhow::Result<()> {
        let mut staging = self.dir.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        reset_at(&staging)?;
        write_table(&staging.join(CLASSES_FILE), sorted_rows(&self.classes))?;
        write_table(&staging.join(SOURCES_FILE), sorted_rows(&self.sources))?;
        write_table(&staging.join(DEPS_FILE), self.deps.edge_set())?;

        remove_any(&self.dir).with_context(|| format!("remove {}", self.dir.display()))?;
        std::fs::rename(&staging, &self.dir)
            .with_context(|| format!("save metadata to {}", self.dir.display()))?;
        Ok(())
    }

    pub fn add_sources(&mut self, sources: FxHashMap<String, String>) {
        self.sources.extend(sources);
    }

    pub fn delete_sources(&mut self, sources: &FxHashSet<String>) {
        for src in sources {
            self.sources.remove(src);
        }
    }

    /// Forgets the given classes along with every edge that mentions them.
    pub fn delete_classes_and_deps(&mut self, classes: &FxHashSet<String>) {
        for class in classes {
            self.classes.remove(class);
            self.deps.purge(class);
        }
    }

    /// Records the classes produced by one compilation.  Sources are
    /// reported relative to `source_dir`.  Only edges between classes of
    /// this source tree are kept, so every edge endpoint is a known class.
    /// Returns the names of the recorded classes.
    pub fn record_batch(&mut self, source_dir: &Path, facts: &[ClassFact]) -> Vec<String> {
        for fact in facts {
            let src = source_dir.join(&fact.source_file);
            self.classes
                .insert(fact.class_name.clone(), src.to_string_lossy().into_owned());
        }
        for fact in facts {
            for dep in &fact.dependencies {
                if self.classes.contains_key(dep) {
                    self.deps.add_edge(dep, &fact.class_name);
                } else {
                    debug!(class = %fact.class_name, dependency = %dep, "ignoring external dependency");
                }
            }
        }
        facts.iter().map(|fact| fact.class_name.clone()).collect()
    }

    /// Classes whose source is one of `sources`.
    pub fn classes_by_sources(&self, sources: &FxHashSet<String>) -> FxHashSet<String> {
        self.classes
            .iter()
            .filter(|(_, src)| sources.contains(*src))
            .map(|(class, _)| class.clone())
            .collect()
    }

    /// Sources whose classes are reachable, through reverse dependency
    /// edges, from the classes of `changed`.
    pub fn affected_sources(
        &self,
        changed: &FxHashSet<String>,
    ) -> anyhow::Result<FxHashSet<String>> {
        let seeds = self.classes_by_sources(changed);
        let closure = self
            .deps
            .impact_closure(seeds.iter().map(String::as_str), |class| {
                self.classes.contains_key(class)
            });

        let mut affected = FxHashSet::default();
        for class in &closure {
            match self.classes.get(class) {
                Some(src) => {
                    affected.insert(src.clone());
                }
                None => bail!("internal error; class {} has no recorded source", class),
            }
        }
        Ok(affected)
    }
}
