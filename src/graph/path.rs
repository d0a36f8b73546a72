use super::Edge;
use crate::core::Version;
use crate::task::Task;
use std::sync::Arc;

/// Ordered edges leading from `source` to the terminal `destination`.
#[derive(Debug, Clone)]
pub struct ResolvedPath<'g> {
    source: Version,
    destination: Version,
    edges: Vec<&'g Edge>,
}

impl<'g> ResolvedPath<'g> {
    pub(crate) fn new(source: Version, destination: Version, edges: Vec<&'g Edge>) -> Self {
        Self {
            source,
            destination,
            edges,
        }
    }

    /// Nothing to do: `version` already is the destination.
    pub(crate) fn empty(version: Version) -> Self {
        Self::new(version.clone(), version, Vec::new())
    }

    pub fn source(&self) -> &Version {
        &self.source
    }

    pub fn destination(&self) -> &Version {
        &self.destination
    }

    pub fn edges(&self) -> &[&'g Edge] {
        &self.edges
    }

    pub fn tasks(&self) -> impl Iterator<Item = &'g Arc<Task>> + '_ {
        self.edges.iter().map(|&edge| edge.task())
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
