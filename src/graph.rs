//! The dependency graph between compiled classes.
//!
//! Edges are stored in both directions: `dependents` answers "who must be
//! rebuilt if this class changes", `uses` lets a class be purged without a
//! scan over every node.  Class names are interned to ids; a purged class
//! keeps its id but loses all of its edges.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ClassId(usize);
impl ClassId {
    fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct Node {
    name: String,
    /// Classes whose bytecode references this one.
    dependents: FxHashSet<ClassId>,
    /// Classes this one references.
    uses: FxHashSet<ClassId>,
}

#[derive(Default)]
pub struct DepGraph {
    nodes: Vec<Node>,
    ids: FxHashMap<String, ClassId>,
}

impl DepGraph {
    pub fn new() -> Self {
        DepGraph::default()
    }

    fn intern(&mut self, name: &str) -> ClassId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = ClassId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_owned(),
            dependents: FxHashSet::default(),
            uses: FxHashSet::default(),
        });
        self.ids.insert(name.to_owned(), id);
        id
    }

    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: ClassId) -> &str {
        &self.nodes[id.index()].name
    }

    /// Records that `dependent`'s bytecode references `dependency`.
    pub fn add_edge(&mut self, dependency: &str, dependent: &str) {
        let from = self.intern(dependency);
        let to = self.intern(dependent);
        self.nodes[from.index()].dependents.insert(to);
        self.nodes[to.index()].uses.insert(from);
    }

    /// Names of the classes that reference `name`.
    pub fn dependents<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.lookup(name)
            .into_iter()
            .flat_map(move |id| self.nodes[id.index()].dependents.iter())
            .map(move |&id| self.name(id))
    }

    /// Removes every edge into or out of `name`.
    pub fn purge(&mut self, name: &str) {
        let id = match self.lookup(name) {
            Some(id) => id,
            None => return,
        };
        let node = &mut self.nodes[id.index()];
        let uses = std::mem::take(&mut node.uses);
        let dependents = std::mem::take(&mut node.dependents);
        for used in uses {
            self.nodes[used.index()].dependents.remove(&id);
        }
        for dependent in dependents {
            self.nodes[dependent.index()].uses.remove(&id);
        }
    }

    /// All edges as (dependency, dependent) pairs, in no particular order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.nodes.iter().flat_map(move |node| {
            node.dependents
                .iter()
                .map(move |&id| (node.name.as_str(), self.name(id)))
        })
    }

    pub fn edge_set(&self) -> BTreeSet<(&str, &str)> {
        self.edges().collect()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|node| node.dependents.len()).sum()
    }

    /// Every class reachable from `seeds` by following dependents, seeds
    /// included.  Dependents rejected by `live` are neither reported nor
    /// followed.  Breadth-first with a visited set, so cycles terminate and
    /// depth is bounded only by memory.
    pub fn impact_closure<'a>(
        &self,
        seeds: impl IntoIterator<Item = &'a str>,
        live: impl Fn(&str) -> bool,
    ) -> FxHashSet<String> {
        let mut reached: FxHashSet<String> = FxHashSet::default();
        let mut visited: FxHashSet<ClassId> = FxHashSet::default();
        let mut frontier: Vec<ClassId> = Vec::new();
        for seed in seeds {
            reached.insert(seed.to_owned());
            if let Some(id) = self.lookup(seed) {
                if visited.insert(id) {
                    frontier.push(id);
                }
            }
        }
        debug!(classes = ?reached, "dependency search, initial class set");

        while !frontier.is_empty() {
            let mut next = Vec::new();
            for id in frontier {
                for &dependent in &self.nodes[id.index()].dependents {
                    if !live(self.name(dependent)) {
                        debug!(class = self.name(dependent), "skipping stale dependent");
                        continue;
                    }
                    if visited.insert(dependent) {
                        reached.insert(self.name(dependent).to_owned());
                        next.push(dependent);
                    }
                }
            }
            if !next.is_empty() {
                debug!(
                    classes = ?next.iter().map(|&id| self.name(id)).collect::<Vec<_>>(),
                    "dependency search, next class set"
                );
            }
            frontier = next;
        }
        reached
    }
}

impl PartialEq for DepGraph {
    fn eq(&self, other: &Self) -> bool {
        self.edge_set() == other.edge_set()
    }
}

impl std::fmt::Debug for DepGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.edge_set()).finish()
    }
}
