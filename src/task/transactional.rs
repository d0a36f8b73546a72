use super::{Task, TaskId};
use crate::context::{CapabilityTag, UpgradeContext};
use crate::core::{PersistenceError, Result, TransactionFailure, UpgradeError};
use crate::persistence::ConnectionHandle;
use std::sync::Arc;
use tracing::{Level, event};

/// Runs its child inside a transaction on one persistence capability.
///
/// Auto-commit is switched off for the child and always switched back to
/// whatever it was before, on success and on failure. A failed child is
/// rolled back and its error returned unchanged; only a failing commit,
/// rollback or restore produces a [`TransactionFailure`].
///
/// The wrapper assumes nothing else uses the same connection meanwhile.
#[derive(Debug)]
pub struct TransactionalTask {
    id: TaskId,
    capability: CapabilityTag,
    child: Arc<Task>,
}

impl TransactionalTask {
    pub fn new(id: impl Into<TaskId>, capability: impl Into<CapabilityTag>, child: Task) -> Self {
        Self {
            id: id.into(),
            capability: capability.into(),
            child: Arc::new(child),
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn capability(&self) -> &CapabilityTag {
        &self.capability
    }

    pub fn child(&self) -> &Arc<Task> {
        &self.child
    }

    pub async fn execute(&self, ctx: &Arc<UpgradeContext>) -> Result<()> {
        let persistence = ctx.persistence(&self.capability)?;
        if !persistence.is_connected().await {
            return Err(PersistenceError::NotConnected.into());
        }
        let connection = persistence.connection().await?;

        let original_auto_commit = connection.auto_commit().await?;
        if let Err(err) = connection.set_auto_commit(false).await {
            return self
                .restore_after_failed_start(connection.as_ref(), original_auto_commit, err)
                .await;
        }

        match self.child.execute(ctx).await {
            Ok(()) => self.commit(connection.as_ref(), original_auto_commit).await,
            Err(err) => {
                self.roll_back(connection.as_ref(), original_auto_commit, err)
                    .await
            }
        }
    }

    async fn restore_after_failed_start(
        &self,
        connection: &dyn ConnectionHandle,
        original: bool,
        failure: PersistenceError,
    ) -> Result<()> {
        event!(Level::ERROR, error = %failure, "could not disable auto-commit");
        match connection.set_auto_commit(original).await {
            Ok(()) => Err(failure.into()),
            Err(cleanup) => Err(TransactionFailure {
                task: self.id.clone(),
                original: Some(Box::new(failure.into())),
                cleanup: vec![cleanup],
            }
            .into()),
        }
    }

    async fn commit(&self, connection: &dyn ConnectionHandle, original: bool) -> Result<()> {
        let mut cleanup = Vec::new();
        if let Err(err) = connection.commit().await {
            event!(Level::ERROR, error = %err, "transaction commit failed");
            cleanup.push(err);
            if let Err(err) = connection.rollback().await {
                cleanup.push(err);
            }
        }
        if let Err(err) = connection.set_auto_commit(original).await {
            cleanup.push(err);
        }

        if cleanup.is_empty() {
            event!(Level::DEBUG, "transaction committed");
            return Ok(());
        }
        Err(TransactionFailure {
            task: self.id.clone(),
            original: None,
            cleanup,
        }
        .into())
    }

    async fn roll_back(
        &self,
        connection: &dyn ConnectionHandle,
        original: bool,
        failure: UpgradeError,
    ) -> Result<()> {
        let mut cleanup = Vec::new();
        if let Err(err) = connection.rollback().await {
            cleanup.push(err);
        }
        if let Err(err) = connection.set_auto_commit(original).await {
            cleanup.push(err);
        }

        if cleanup.is_empty() {
            event!(Level::WARN, error = %failure, "transaction rolled back");
            return Err(failure);
        }

        event!(
            Level::ERROR,
            error = %failure,
            cleanup_failures = cleanup.len(),
            "transaction rollback failed"
        );
        Err(TransactionFailure {
            task: self.id.clone(),
            original: Some(Box::new(failure)),
            cleanup,
        }
        .into())
    }
}
