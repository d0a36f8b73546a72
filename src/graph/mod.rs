pub mod edge;
pub mod path;

use crate::core::{Result, UpgradeError, Version};
use crate::task::Task;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub use edge::{Edge, EdgeLoader, EdgeSource};
pub use path::ResolvedPath;

/// Upgrade graph: every version has at most one outgoing edge.
///
/// Chains may converge, so two historical starting points can reach the
/// same destination through a different number of steps. Cycles are only
/// detected when a path is walked, and a graph whose chains end at more than
/// one version refuses to resolve any path.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    edges: Vec<Edge>,
    outgoing: HashMap<Version, usize>,
    // First-appearance order, for deterministic listings
    versions: Vec<Version>,
    members: HashSet<Version>,
    // Destinations without an outgoing edge
    sinks: Vec<Version>,
}

impl Graph {
    /// Builds a graph from an edge source.
    ///
    /// Fails with [`UpgradeError::DuplicateEdge`] when a version has two
    /// outgoing edges.
    pub fn new(source: impl EdgeSource) -> Result<Self> {
        let mut graph = Graph::default();
        for edge in source.edges() {
            graph.insert(edge)?;
        }
        graph.sinks = graph.find_sinks();
        Ok(graph)
    }

    pub fn empty() -> Self {
        Graph::default()
    }

    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }

    fn insert(&mut self, edge: Edge) -> Result<()> {
        if self.outgoing.contains_key(edge.source()) {
            return Err(UpgradeError::DuplicateEdge(edge.source().clone()));
        }
        for version in [edge.source(), edge.destination()] {
            if self.members.insert(version.clone()) {
                self.versions.push(version.clone());
            }
        }
        self.outgoing.insert(edge.source().clone(), self.edges.len());
        self.edges.push(edge);
        Ok(())
    }

    fn find_sinks(&self) -> Vec<Version> {
        let mut sinks: Vec<Version> = Vec::new();
        for edge in &self.edges {
            let destination = edge.destination();
            if self.edge_from(destination).is_none() && !sinks.contains(destination) {
                sinks.push(destination.clone());
            }
        }
        sinks
    }

    /// Outgoing edge of `version`; `None` for terminal and unknown versions.
    pub fn edge_from(&self, version: &Version) -> Option<&Edge> {
        self.outgoing.get(version).map(|&index| &self.edges[index])
    }

    pub fn contains(&self, version: &Version) -> bool {
        self.members.contains(version)
    }

    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Walks outgoing edges from `start` until a version without one.
    ///
    /// A graph without edges resolves every version to an empty path. An
    /// already terminal `start` resolves to an empty path as well, while a
    /// `start` the graph has never heard of is an
    /// [`UpgradeError::UnknownVersion`]. Chains ending at different versions
    /// fail every resolution with [`UpgradeError::AmbiguousTerminal`].
    pub fn resolve_path(&self, start: &Version) -> Result<ResolvedPath<'_>> {
        if self.is_empty() {
            return Ok(ResolvedPath::empty(start.clone()));
        }
        if self.sinks.len() > 1 {
            return Err(UpgradeError::AmbiguousTerminal(self.sinks.clone()));
        }
        if !self.contains(start) {
            return Err(UpgradeError::UnknownVersion(start.clone()));
        }

        let mut seen = HashSet::new();
        let mut walked = Vec::new();
        let mut edges = Vec::new();
        let mut cursor = start;
        while let Some(edge) = self.edge_from(cursor) {
            if !seen.insert(cursor) {
                return Err(UpgradeError::CyclicGraph {
                    version: cursor.clone(),
                    path: walked,
                });
            }
            walked.push(cursor.clone());
            edges.push(edge);
            cursor = edge.destination();
        }

        Ok(ResolvedPath::new(start.clone(), cursor.clone(), edges))
    }

    /// Whether `start` can be brought to the terminal version.
    pub fn is_supported(&self, start: &Version) -> bool {
        self.resolve_path(start).is_ok()
    }

    /// The version every chain ends at, `None` for an empty graph.
    pub fn terminal_version(&self) -> Result<Option<&Version>> {
        if self.is_empty() {
            return Ok(None);
        }

        match self.sinks.as_slice() {
            // Every destination has an outgoing edge, so any walk loops.
            [] => self
                .resolve_path(self.edges[0].source())
                .map(|path| self.members.get(path.destination())),
            [terminal] => Ok(Some(terminal)),
            _ => Err(UpgradeError::AmbiguousTerminal(self.sinks.clone())),
        }
    }
}

/// Collects edges one by one.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    edges: Vec<Edge>,
}

impl GraphBuilder {
    pub fn edge(mut self, from: impl Into<Version>, to: impl Into<Version>, task: Task) -> Self {
        self.edges.push(Edge::new(from, to, task));
        self
    }

    pub fn shared_edge(
        mut self,
        from: impl Into<Version>,
        to: impl Into<Version>,
        task: Arc<Task>,
    ) -> Self {
        self.edges.push(Edge::shared(from, to, task));
        self
    }

    pub fn build(self) -> Result<Graph> {
        Graph::new(self.edges)
    }
}
