//! The dependency graph store.
//!
//! A [`Workflow`] maps artifact names to the [`Task`] that produces them.
//! Edges are implicit: every [`Arg::Reference`](crate::Arg::Reference) in a
//! task points at the artifact it consumes. Names referenced but never
//! produced are *roots*, i.e. inputs that come from outside the graph.
//!
//! Nothing derived (roots, followers) is cached. Whenever such a question is
//! asked, a throwaway `petgraph` graph is built from the current task map and
//! queried, so answers can never drift out of sync with the tasks.

use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};

use indexmap::{IndexMap, IndexSet};
use petgraph::Graph;
use petgraph::graph::NodeIndex;
use petgraph::visit::Dfs;

use crate::error::GraphError;
use crate::task::{Head, Task};
use crate::value::Literal;

/// Dependency edges of a workflow: from dependency to dependent.
struct Edges<'a> {
    graph: Graph<&'a str, ()>,
    index: HashMap<&'a str, NodeIndex>,
}

impl<'a> Edges<'a> {
    fn node(&mut self, name: &'a str) -> NodeIndex {
        if let Some(&index) = self.index.get(name) {
            return index;
        }

        let index = self.graph.add_node(name);
        self.index.insert(name, index);
        index
    }
}

/// Directed acyclic record of how named artifacts were produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Workflow {
    tasks: IndexMap<String, Task>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the task producing `name`.
    ///
    /// No validation happens here; introducing a cycle is the caller's
    /// mistake. Use [`Workflow::try_set`] to have it checked.
    pub fn set(&mut self, name: impl Into<String>, task: Task) {
        let name = name.into();
        tracing::debug!("set {} = {}", name, task);
        self.tasks.insert(name, task);
    }

    /// Stores raw data under `name`, e.g. an input image.
    pub fn set_data(&mut self, name: impl Into<String>, value: impl Into<Literal>) {
        self.set(name, Task::data(value));
    }

    /// Like [`Workflow::set`], but refuses edits that would close a cycle.
    /// On error the workflow is left exactly as it was.
    pub fn try_set(&mut self, name: impl Into<String>, task: Task) -> Result<(), GraphError> {
        let name = name.into();
        let previous = self.tasks.insert(name.clone(), task);

        if self.check_acyclic().is_ok() {
            tracing::debug!("set {} (checked)", name);
            return Ok(());
        }

        match previous {
            Some(previous) => {
                self.tasks.insert(name.clone(), previous);
            }
            None => {
                self.tasks.shift_remove(&name);
            }
        }

        Err(GraphError::Cycle { name })
    }

    pub fn get_task(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Removes the task producing `name`. Tasks consuming it are left alone
    /// and from now on see `name` as a root.
    pub fn remove(&mut self, name: &str) -> Option<Task> {
        let removed = self.tasks.shift_remove(name);
        if removed.is_some() {
            tracing::debug!("removed {}", name);
        }
        removed
    }

    /// Drops every task whose artifact is not among `live`, returning the
    /// names that were dropped.
    ///
    /// Whether a task survives depends only on its own name, never on what it
    /// references, so a single pass already is a fixed point: running it again
    /// with the same `live` set changes nothing. A survivor may be left
    /// referencing a dropped task; that name simply turns into a root.
    pub fn remove_all_except<S>(&mut self, live: &[S]) -> Vec<String>
    where
        S: AsRef<str>,
    {
        let live: HashSet<&str> = live.iter().map(AsRef::as_ref).collect();
        let mut removed = Vec::new();

        self.tasks.retain(|name, _| {
            let keep = live.contains(name.as_str());
            if !keep {
                removed.push(name.clone());
            }
            keep
        });

        if !removed.is_empty() {
            tracing::info!("removed {} zombie task(s): {:?}", removed.len(), removed);
        }

        removed
    }

    /// Names referenced by some task but not produced by any, in order of
    /// first appearance.
    pub fn roots(&self) -> IndexSet<String> {
        self.tasks
            .values()
            .flat_map(Task::references)
            .filter(|name| !self.tasks.contains_key(*name))
            .map(str::to_string)
            .collect()
    }

    /// Artifacts that no task consumes.
    pub fn leafs(&self) -> Vec<String> {
        let consumed: HashSet<&str> = self.tasks.values().flat_map(Task::references).collect();

        self.tasks
            .keys()
            .filter(|name| !consumed.contains(name.as_str()))
            .cloned()
            .collect()
    }

    /// Direct inputs of the task producing `name`.
    pub fn sources_of(&self, name: &str) -> Vec<String> {
        self.tasks
            .get(name)
            .map(|task| task.references().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Every artifact whose task depends on `name`, directly or through other
    /// tasks. `name` itself is never part of the answer.
    ///
    /// The traversal keeps a visited set, so it terminates even on a
    /// malformed, cyclic graph.
    pub fn followers_of(&self, name: &str) -> IndexSet<String> {
        let edges = self.edges();

        let Some(&start) = edges.index.get(name) else {
            return IndexSet::new();
        };

        let mut reached = HashSet::new();
        let mut dfs = Dfs::new(&edges.graph, start);
        while let Some(nx) = dfs.next(&edges.graph) {
            if nx != start {
                reached.insert(edges.graph[nx]);
            }
        }

        self.tasks
            .keys()
            .filter(|key| reached.contains(key.as_str()))
            .cloned()
            .collect()
    }

    /// Checks that no task depends on itself, directly or transitively.
    pub fn check_acyclic(&self) -> Result<(), GraphError> {
        let edges = self.edges();

        petgraph::algo::toposort(&edges.graph, None)
            .map(|_| ())
            .map_err(|cycle| GraphError::Cycle {
                name: edges.graph[cycle.node_id()].to_string(),
            })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Task)> {
        self.tasks.iter().map(|(name, task)| (name.as_str(), task))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn edges(&self) -> Edges<'_> {
        let mut edges = Edges {
            graph: Graph::new(),
            index: HashMap::new(),
        };

        for (name, task) in &self.tasks {
            let target = edges.node(name);
            for source in task.references() {
                let source = edges.node(source);
                edges.graph.add_edge(source, target, ());
            }
        }

        edges
    }
}

impl FromIterator<(String, Task)> for Workflow {
    fn from_iter<I: IntoIterator<Item = (String, Task)>>(iter: I) -> Self {
        Self {
            tasks: iter.into_iter().collect(),
        }
    }
}

/// Renders the workflow as a Mermaid flowchart.
impl Display for Workflow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "graph LR")?;

        let edges = self.edges();
        for index in edges.graph.node_indices() {
            let name = edges.graph[index].replace('"', "\\\"");
            if self.tasks.contains_key(edges.graph[index]) {
                writeln!(f, "    {:?}[\"{}\"]", index.index(), name)?;
            } else {
                writeln!(f, "    {:?}((\"{}\"))", index.index(), name)?;
            }
        }

        for edge in edges.graph.raw_edges() {
            let target = edges.graph[edge.target()];
            let label = match self.tasks.get(target).map(Task::head) {
                Some(Head::Operation(operation)) => operation.name().to_string(),
                _ => String::new(),
            };
            writeln!(
                f,
                "    {:?} -- \"{}\" --> {:?}",
                edge.source().index(),
                label.replace('"', "\\\""),
                edge.target().index()
            )?;
        }

        Ok(())
    }
}
