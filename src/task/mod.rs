pub mod atomic;
pub mod composite;
pub mod transactional;

use crate::context::{CapabilityTag, UpgradeContext};
use crate::core::Result;
use async_recursion::async_recursion;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::future::Future;
use std::sync::Arc;
use tracing::{Instrument, Level, event, info_span};

pub use atomic::{AtomicTask, UnitOfWork, Work};
pub use composite::{ParallelTask, SerialTask};
pub use transactional::TransactionalTask;

/// Identity of a task, used in failures and for logger lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Executable unit of work.
///
/// A task tree is built once and may be executed any number of times. The
/// engine does not remember whether a tree already ran, and execution is
/// generally not idempotent.
#[derive(Debug)]
pub enum Task {
    Atomic(AtomicTask),
    Serial(SerialTask),
    Parallel(ParallelTask),
    Transactional(TransactionalTask),
}

impl Task {
    /// Leaf task running an async closure.
    pub fn callable<F, Fut>(id: impl Into<TaskId>, work: F) -> Self
    where
        F: Fn(Arc<UpgradeContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Task::Atomic(AtomicTask::callable(id, work))
    }

    /// Leaf task running one raw statement against the primary database.
    pub fn statement(id: impl Into<TaskId>, statement: impl Into<String>) -> Self {
        Self::statement_on(id, CapabilityTag::DATABASE, statement)
    }

    pub fn statement_on(
        id: impl Into<TaskId>,
        capability: impl Into<CapabilityTag>,
        statement: impl Into<String>,
    ) -> Self {
        Task::Atomic(AtomicTask::statement(id, capability, statement))
    }

    pub fn serial(id: impl Into<TaskId>, children: impl IntoIterator<Item = Task>) -> Self {
        Task::Serial(SerialTask::new(id, children))
    }

    pub fn parallel(id: impl Into<TaskId>, children: impl IntoIterator<Item = Task>) -> Self {
        Task::Parallel(ParallelTask::new(id, children))
    }

    /// Runs `child` in a transaction on the primary database.
    pub fn transactional(id: impl Into<TaskId>, child: Task) -> Self {
        Self::transactional_on(id, CapabilityTag::DATABASE, child)
    }

    pub fn transactional_on(
        id: impl Into<TaskId>,
        capability: impl Into<CapabilityTag>,
        child: Task,
    ) -> Self {
        Task::Transactional(TransactionalTask::new(id, capability, child))
    }

    pub fn id(&self) -> &TaskId {
        match self {
            Task::Atomic(task) => task.id(),
            Task::Serial(task) => task.id(),
            Task::Parallel(task) => task.id(),
            Task::Transactional(task) => task.id(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Task::Atomic(_) => "atomic",
            Task::Serial(_) => "serial",
            Task::Parallel(_) => "parallel",
            Task::Transactional(_) => "transactional",
        }
    }

    /// Number of leaves in the tree
    pub fn atomic_count(&self) -> usize {
        match self {
            Task::Atomic(_) => 1,
            Task::Serial(task) => task.children().iter().map(|c| c.atomic_count()).sum(),
            Task::Parallel(task) => task.children().iter().map(|c| c.atomic_count()).sum(),
            Task::Transactional(task) => task.child().atomic_count(),
        }
    }

    /// Indented rendering of the tree, one task per line.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.describe_into(&mut out, 0);
        out
    }

    fn describe_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let _ = match self {
            Task::Atomic(task) => writeln!(out, "{}atomic '{}' {}", indent, task.id(), task.work()),
            Task::Transactional(task) => writeln!(
                out,
                "{}transactional '{}' on {}",
                indent,
                task.id(),
                task.capability()
            ),
            _ => writeln!(out, "{}{} '{}'", indent, self.kind(), self.id()),
        };
        match self {
            Task::Atomic(_) => {}
            Task::Serial(task) => task
                .children()
                .iter()
                .for_each(|child| child.describe_into(out, depth + 1)),
            Task::Parallel(task) => task
                .children()
                .iter()
                .for_each(|child| child.describe_into(out, depth + 1)),
            Task::Transactional(task) => task.child().describe_into(out, depth + 1),
        }
    }

    /// Executes the tree against `ctx`.
    ///
    /// Fails with the error of whichever sub-task failed; see the variant
    /// types for how each composite propagates failures.
    #[async_recursion]
    pub async fn execute(&self, ctx: &Arc<UpgradeContext>) -> Result<()> {
        let span = info_span!(
            "upgrade.task",
            task = %self.id(),
            kind = self.kind(),
            logger = %ctx.logger_for(self.id())
        );

        async {
            event!(Level::DEBUG, "task started");
            let outcome = match self {
                Task::Atomic(task) => task.execute(ctx).await,
                Task::Serial(task) => task.execute(ctx).await,
                Task::Parallel(task) => task.execute(ctx).await,
                Task::Transactional(task) => task.execute(ctx).await,
            };
            if outcome.is_ok() {
                event!(Level::DEBUG, "task completed");
            }
            outcome
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Task {
        Task::serial(
            "v2",
            [
                Task::statement("create_users", "CREATE TABLE users (id INTEGER)"),
                Task::parallel(
                    "indexes",
                    [
                        Task::statement("idx_a", "CREATE INDEX a ON users (id)"),
                        Task::callable("refresh_cache", |_ctx| async { Ok(()) }),
                    ],
                ),
                Task::transactional(
                    "seed",
                    Task::statement("seed_users", "INSERT INTO users VALUES (1)"),
                ),
            ],
        )
    }

    #[test]
    fn test_ids_and_kinds() {
        let tree = sample_tree();
        assert_eq!(tree.id().as_str(), "v2");
        assert_eq!(tree.kind(), "serial");
        assert_eq!(tree.atomic_count(), 4);
    }

    #[test]
    fn test_describe_renders_tree() {
        let text = sample_tree().describe();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "serial 'v2'");
        assert_eq!(
            lines[1],
            "  atomic 'create_users' statement on database: CREATE TABLE users (id INTEGER)"
        );
        assert_eq!(lines[2], "  parallel 'indexes'");
        assert_eq!(lines[4], "    atomic 'refresh_cache' callable");
        assert_eq!(lines[5], "  transactional 'seed' on database");
        assert_eq!(lines.len(), 7);
    }
}
