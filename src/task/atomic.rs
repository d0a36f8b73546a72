use super::TaskId;
use crate::context::{CapabilityTag, UpgradeContext};
use crate::core::{Result, TaskFailure};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{Level, event};

pub type UnitOfWork =
    Arc<dyn Fn(Arc<UpgradeContext>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// What a leaf task actually does
#[derive(Clone)]
pub enum Work {
    Callable(UnitOfWork),
    Statement {
        capability: CapabilityTag,
        statement: String,
    },
}

impl fmt::Debug for Work {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Work::Callable(_) => f.debug_tuple("Callable").finish_non_exhaustive(),
            Work::Statement {
                capability,
                statement,
            } => f
                .debug_struct("Statement")
                .field("capability", capability)
                .field("statement", statement)
                .finish(),
        }
    }
}

impl fmt::Display for Work {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Work::Callable(_) => write!(f, "callable"),
            Work::Statement {
                capability,
                statement,
            } => write!(f, "statement on {}: {}", capability, statement),
        }
    }
}

#[derive(Debug)]
pub struct AtomicTask {
    id: TaskId,
    work: Work,
}

impl AtomicTask {
    pub fn new(id: impl Into<TaskId>, work: Work) -> Self {
        Self {
            id: id.into(),
            work,
        }
    }

    pub fn callable<F, Fut>(id: impl Into<TaskId>, work: F) -> Self
    where
        F: Fn(Arc<UpgradeContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let unit: UnitOfWork = Arc::new(move |ctx: Arc<UpgradeContext>| work(ctx).boxed());
        Self::new(id, Work::Callable(unit))
    }

    pub fn statement(
        id: impl Into<TaskId>,
        capability: impl Into<CapabilityTag>,
        statement: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            Work::Statement {
                capability: capability.into(),
                statement: statement.into(),
            },
        )
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn work(&self) -> &Work {
        &self.work
    }

    /// Runs the unit of work; its failure becomes this task's [`TaskFailure`].
    pub async fn execute(&self, ctx: &Arc<UpgradeContext>) -> Result<()> {
        let outcome = match &self.work {
            Work::Callable(unit) => unit(Arc::clone(ctx)).await,
            Work::Statement {
                capability,
                statement,
            } => {
                let persistence = ctx.persistence(capability)?;
                persistence
                    .execute(statement)
                    .await
                    .map_err(anyhow::Error::from)
            }
        };

        outcome.map_err(|cause| {
            event!(Level::ERROR, error = %cause, "atomic task failed");
            TaskFailure::new(self.id.clone(), cause).into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::UpgradeError;
    use crate::persistence::MemoryPersistence;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_callable_runs_with_context() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let task = AtomicTask::callable("count", move |ctx| {
            let seen = Arc::clone(&seen);
            async move {
                assert_eq!(ctx.current_version().label(), Some("1"));
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let ctx = Arc::new(UpgradeContext::new("1"));
        task.execute(&ctx).await.unwrap();
        task.execute(&ctx).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_statement_failure_keeps_cause() {
        let db = MemoryPersistence::new().fail_statements_containing("broken");
        let ctx = Arc::new(UpgradeContext::builder("1").database(Arc::new(db)).build());
        let task = AtomicTask::statement("bad", CapabilityTag::DATABASE, "SELECT broken");

        let err = task.execute(&ctx).await.unwrap_err();
        match err {
            UpgradeError::Task(failure) => {
                assert_eq!(failure.task.as_str(), "bad");
                assert!(failure.cause.to_string().contains("SELECT broken"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_statement_without_capability() {
        let ctx = Arc::new(UpgradeContext::new("1"));
        let task = AtomicTask::statement("orphan", "reporting", "SELECT 1");
        assert!(matches!(
            task.execute(&ctx).await,
            Err(UpgradeError::MissingCapability(_))
        ));
    }
}
