use super::{ConnectionHandle, PersistenceContext, PersistenceResult};
use crate::core::PersistenceError;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Everything that happened on a [`MemoryPersistence`] connection, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConnectionEvent {
    Execute(String),
    SetAutoCommit(bool),
    Commit,
    Rollback,
}

/// In-memory persistence context
///
/// Statements are not interpreted, only recorded. Statements run while
/// auto-commit is on (or later committed) end up in `applied_statements`,
/// the rest stay pending until commit or rollback. Useful for dry runs and
/// for exercising transactional task trees without a database.
#[derive(Clone)]
pub struct MemoryPersistence {
    connection: Arc<MemoryConnection>,
}

struct MemoryConnection {
    state: Mutex<ConnectionState>,
}

#[derive(Debug)]
struct ConnectionState {
    connected: bool,
    auto_commit: bool,
    applied: Vec<String>,
    pending: Vec<String>,
    journal: Vec<ConnectionEvent>,
    failing_patterns: Vec<String>,
    fail_rollback: bool,
    fail_disabling_auto_commit: bool,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self {
            connection: Arc::new(MemoryConnection {
                state: Mutex::new(ConnectionState {
                    connected: true,
                    auto_commit: true,
                    applied: Vec::new(),
                    pending: Vec::new(),
                    journal: Vec::new(),
                    failing_patterns: Vec::new(),
                    fail_rollback: false,
                    fail_disabling_auto_commit: false,
                }),
            }),
        }
    }

    /// Set the initial auto-commit mode
    pub fn with_auto_commit(self, enabled: bool) -> Self {
        self.connection.lock().auto_commit = enabled;
        self
    }

    /// Make every statement containing `pattern` fail
    pub fn fail_statements_containing(self, pattern: impl Into<String>) -> Self {
        self.connection.lock().failing_patterns.push(pattern.into());
        self
    }

    /// Make rollback fail
    pub fn fail_rollback(self) -> Self {
        self.connection.lock().fail_rollback = true;
        self
    }

    /// Make switching auto-commit off fail
    pub fn fail_disabling_auto_commit(self) -> Self {
        self.connection.lock().fail_disabling_auto_commit = true;
        self
    }

    pub fn disconnect(&self) {
        self.connection.lock().connected = false;
    }

    pub fn is_auto_commit(&self) -> bool {
        self.connection.lock().auto_commit
    }

    pub fn applied_statements(&self) -> Vec<String> {
        self.connection.lock().applied.clone()
    }

    pub fn pending_statements(&self) -> Vec<String> {
        self.connection.lock().pending.clone()
    }

    pub fn journal(&self) -> Vec<ConnectionEvent> {
        self.connection.lock().journal.clone()
    }
}

impl Default for MemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConnection {
    // Poisoning is ignored here so the journal stays readable.
    fn lock(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_lock(&self) -> PersistenceResult<MutexGuard<'_, ConnectionState>> {
        let state = self.state.lock()?;
        if !state.connected {
            return Err(PersistenceError::NotConnected);
        }
        Ok(state)
    }
}

#[async_trait]
impl PersistenceContext for MemoryPersistence {
    async fn is_connected(&self) -> bool {
        self.connection.lock().connected
    }

    async fn connection(&self) -> PersistenceResult<Arc<dyn ConnectionHandle>> {
        drop(self.connection.try_lock()?);
        let handle: Arc<dyn ConnectionHandle> = self.connection.clone();
        Ok(handle)
    }

    async fn execute(&self, statement: &str) -> PersistenceResult<()> {
        let mut state = self.connection.try_lock()?;
        state
            .journal
            .push(ConnectionEvent::Execute(statement.to_string()));

        if let Some(pattern) = state
            .failing_patterns
            .iter()
            .find(|pattern| statement.contains(pattern.as_str()))
        {
            return Err(PersistenceError::Statement {
                statement: statement.to_string(),
                message: format!("rejected statement matching '{}'", pattern),
            });
        }

        if state.auto_commit {
            state.applied.push(statement.to_string());
        } else {
            state.pending.push(statement.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl ConnectionHandle for MemoryConnection {
    async fn auto_commit(&self) -> PersistenceResult<bool> {
        Ok(self.try_lock()?.auto_commit)
    }

    async fn set_auto_commit(&self, enabled: bool) -> PersistenceResult<()> {
        let mut state = self.try_lock()?;
        state.journal.push(ConnectionEvent::SetAutoCommit(enabled));
        if !enabled && state.fail_disabling_auto_commit {
            return Err(PersistenceError::Connection("Cannot disable auto-commit".into()));
        }
        // Switching auto-commit back on commits whatever is pending.
        if enabled && !state.auto_commit {
            let pending = std::mem::take(&mut state.pending);
            state.applied.extend(pending);
        }
        state.auto_commit = enabled;
        Ok(())
    }

    async fn commit(&self) -> PersistenceResult<()> {
        let mut state = self.try_lock()?;
        state.journal.push(ConnectionEvent::Commit);
        if state.auto_commit {
            return Err(PersistenceError::Connection(
                "Cannot commit while auto-commit is enabled".into(),
            ));
        }
        let pending = std::mem::take(&mut state.pending);
        state.applied.extend(pending);
        Ok(())
    }

    async fn rollback(&self) -> PersistenceResult<()> {
        let mut state = self.try_lock()?;
        state.journal.push(ConnectionEvent::Rollback);
        if state.fail_rollback {
            return Err(PersistenceError::Connection("Rollback failed".into()));
        }
        if state.auto_commit {
            return Err(PersistenceError::Connection(
                "Cannot roll back while auto-commit is enabled".into(),
            ));
        }
        state.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_auto_commit_applies_immediately() {
        let db = MemoryPersistence::new();
        db.execute("CREATE TABLE t (id INTEGER)").await.unwrap();
        assert_eq!(db.applied_statements(), vec!["CREATE TABLE t (id INTEGER)"]);
        assert!(db.pending_statements().is_empty());
    }

    #[tokio::test]
    async fn test_commit_and_rollback_lifecycle() {
        let db = MemoryPersistence::new();
        let conn = db.connection().await.unwrap();

        conn.set_auto_commit(false).await.unwrap();
        db.execute("INSERT INTO t VALUES (1)").await.unwrap();
        assert_eq!(db.pending_statements().len(), 1);
        conn.rollback().await.unwrap();
        assert!(db.pending_statements().is_empty());

        db.execute("INSERT INTO t VALUES (2)").await.unwrap();
        conn.commit().await.unwrap();
        assert_eq!(db.applied_statements(), vec!["INSERT INTO t VALUES (2)"]);

        assert!(conn.commit().await.is_ok());
        conn.set_auto_commit(true).await.unwrap();
        assert!(conn.commit().await.is_err());
    }

    #[tokio::test]
    async fn test_reenabling_auto_commit_flushes_pending() {
        let db = MemoryPersistence::new().with_auto_commit(false);
        db.execute("UPDATE t SET id = 3").await.unwrap();
        db.connection()
            .await
            .unwrap()
            .set_auto_commit(true)
            .await
            .unwrap();
        assert_eq!(db.applied_statements(), vec!["UPDATE t SET id = 3"]);
    }

    #[tokio::test]
    async fn test_failing_pattern_and_disconnect() {
        let db = MemoryPersistence::new().fail_statements_containing("DROP");
        let err = db.execute("DROP TABLE t").await.unwrap_err();
        assert!(matches!(err, PersistenceError::Statement { .. }));
        assert_eq!(db.journal(), vec![ConnectionEvent::Execute("DROP TABLE t".into())]);

        db.disconnect();
        assert!(!db.is_connected().await);
        assert_eq!(
            db.execute("SELECT 1").await.unwrap_err(),
            PersistenceError::NotConnected
        );
        assert!(db.connection().await.is_err());
    }
}
