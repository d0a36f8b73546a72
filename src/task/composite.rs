use super::{Task, TaskId};
use crate::context::UpgradeContext;
use crate::core::{AggregateTaskFailure, Result, TaskFailure, UpgradeError};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{Instrument, Level, Span, event};

/// Children run strictly one after another.
///
/// The first failing child stops the sequence and its error is returned
/// as is; later children never run.
#[derive(Debug)]
pub struct SerialTask {
    id: TaskId,
    children: Vec<Arc<Task>>,
}

impl SerialTask {
    pub fn new(id: impl Into<TaskId>, children: impl IntoIterator<Item = Task>) -> Self {
        Self {
            id: id.into(),
            children: children.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn children(&self) -> &[Arc<Task>] {
        &self.children
    }

    pub async fn execute(&self, ctx: &Arc<UpgradeContext>) -> Result<()> {
        for (index, child) in self.children.iter().enumerate() {
            if let Err(err) = child.execute(ctx).await {
                event!(
                    Level::DEBUG,
                    failed = %child.id(),
                    skipped = self.children.len() - index - 1,
                    "serial task stopped"
                );
                return Err(err);
            }
        }
        Ok(())
    }
}

/// Children run concurrently, each on its own tokio task.
///
/// Every child runs to completion even when siblings fail. Any failure is
/// reported as an [`AggregateTaskFailure`] holding all child failures in
/// child order. Children must not share mutable state.
#[derive(Debug)]
pub struct ParallelTask {
    id: TaskId,
    children: Vec<Arc<Task>>,
}

impl ParallelTask {
    pub fn new(id: impl Into<TaskId>, children: impl IntoIterator<Item = Task>) -> Self {
        Self {
            id: id.into(),
            children: children.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn children(&self) -> &[Arc<Task>] {
        &self.children
    }

    pub async fn execute(&self, ctx: &Arc<UpgradeContext>) -> Result<()> {
        let handles = self.children.iter().map(|child| {
            let child = Arc::clone(child);
            let ctx = Arc::clone(ctx);
            tokio::spawn(async move { child.execute(&ctx).await }.instrument(Span::current()))
        });
        let outcomes = join_all(handles).await;

        let failures: Vec<UpgradeError> = self
            .children
            .iter()
            .zip(outcomes)
            .filter_map(|(child, outcome)| match outcome {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some(err),
                Err(join_err) => Some(
                    TaskFailure::new(
                        child.id().clone(),
                        anyhow::anyhow!("task did not complete: {}", join_err),
                    )
                    .into(),
                ),
            })
            .collect();

        if failures.is_empty() {
            return Ok(());
        }

        event!(
            Level::ERROR,
            failed = failures.len(),
            children = self.children.len(),
            "parallel task failed"
        );
        Err(AggregateTaskFailure {
            task: self.id.clone(),
            children: self.children.len(),
            failures,
        }
        .into())
    }
}
