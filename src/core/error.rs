use super::Version;
use crate::context::CapabilityTag;
use crate::task::TaskId;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpgradeError {
    #[error("Version '{0}' is not part of the upgrade graph")]
    UnknownVersion(Version),

    #[error("Upgrade graph revisits version '{version}' after {}", display_path(.path))]
    CyclicGraph { version: Version, path: Vec<Version> },

    #[error("Version '{0}' has more than one outgoing edge")]
    DuplicateEdge(Version),

    #[error("Upgrade graph has several terminal versions: {}", display_path(.0))]
    AmbiguousTerminal(Vec<Version>),

    #[error(transparent)]
    Task(#[from] TaskFailure),

    #[error(transparent)]
    Aggregate(#[from] AggregateTaskFailure),

    #[error(transparent)]
    Transaction(#[from] TransactionFailure),

    #[error("No persistence capability registered under '{0}'")]
    MissingCapability(CapabilityTag),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type Result<T> = std::result::Result<T, UpgradeError>;

/// An atomic unit of work failed.
#[derive(Error, Debug)]
#[error("Task '{task}' failed: {cause}")]
pub struct TaskFailure {
    pub task: TaskId,
    #[source]
    pub cause: anyhow::Error,
}

impl TaskFailure {
    pub fn new(task: TaskId, cause: impl Into<anyhow::Error>) -> Self {
        Self {
            task,
            cause: cause.into(),
        }
    }
}

/// Every failure of a parallel composite, in child order.
#[derive(Error, Debug)]
pub struct AggregateTaskFailure {
    pub task: TaskId,
    pub children: usize,
    pub failures: Vec<UpgradeError>,
}

impl fmt::Display for AggregateTaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parallel task '{}' failed: {} of {} children failed",
            self.task,
            self.failures.len(),
            self.children
        )?;
        for failure in &self.failures {
            write!(f, "; {}", failure)?;
        }
        Ok(())
    }
}

/// Cleanup around a transactional task went wrong.
///
/// `original` is the child failure that triggered the rollback, `None` when
/// the child succeeded and the commit itself failed.
#[derive(Error, Debug)]
pub struct TransactionFailure {
    pub task: TaskId,
    pub original: Option<Box<UpgradeError>>,
    pub cleanup: Vec<PersistenceError>,
}

impl fmt::Display for TransactionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transaction '{}' could not be cleaned up", self.task)?;
        if let Some(original) = &self.original {
            write!(f, " after: {}", original)?;
        }
        for err in &self.cleanup {
            write!(f, "; {}", err)?;
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Persistence context is not connected")]
    NotConnected,

    #[error("Statement '{statement}' failed: {message}")]
    Statement { statement: String, message: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Lock error: {0}")]
    Lock(String),
}

impl<T> From<std::sync::PoisonError<T>> for PersistenceError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}

fn display_path(path: &[Version]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_lists_every_failure() {
        let err = AggregateTaskFailure {
            task: TaskId::new("indexes"),
            children: 3,
            failures: vec![
                TaskFailure::new(TaskId::new("a"), anyhow::anyhow!("boom")).into(),
                TaskFailure::new(TaskId::new("c"), anyhow::anyhow!("bang")).into(),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("2 of 3 children failed"));
        assert!(text.contains("Task 'a' failed: boom"));
        assert!(text.contains("Task 'c' failed: bang"));
    }

    #[test]
    fn test_cycle_message_shows_walk() {
        let err = UpgradeError::CyclicGraph {
            version: Version::new("a"),
            path: vec![Version::new("a"), Version::new("b")],
        };
        assert_eq!(
            err.to_string(),
            "Upgrade graph revisits version 'a' after a -> b"
        );
    }
}
