use crate::core::Version;
use crate::task::Task;
use std::sync::Arc;

/// Transition from `source` to `destination`, performed by `task`.
#[derive(Debug, Clone)]
pub struct Edge {
    source: Version,
    destination: Version,
    task: Arc<Task>,
}

impl Edge {
    pub fn new(source: impl Into<Version>, destination: impl Into<Version>, task: Task) -> Self {
        Self::shared(source, destination, Arc::new(task))
    }

    /// Edge reusing a task tree owned elsewhere.
    pub fn shared(
        source: impl Into<Version>,
        destination: impl Into<Version>,
        task: Arc<Task>,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            task,
        }
    }

    pub fn source(&self) -> &Version {
        &self.source
    }

    pub fn destination(&self) -> &Version {
        &self.destination
    }

    pub fn task(&self) -> &Arc<Task> {
        &self.task
    }
}

/// Where a graph gets its edges from.
pub trait EdgeSource {
    fn edges(self) -> Vec<Edge>;
}

impl EdgeSource for Vec<Edge> {
    fn edges(self) -> Vec<Edge> {
        self
    }
}

impl<const N: usize> EdgeSource for [Edge; N] {
    fn edges(self) -> Vec<Edge> {
        self.into()
    }
}

/// Edges produced lazily by a loader callback.
pub struct EdgeLoader<F>(pub F);

impl<F> EdgeSource for EdgeLoader<F>
where
    F: FnOnce() -> Vec<Edge>,
{
    fn edges(self) -> Vec<Edge> {
        (self.0)()
    }
}
