pub mod memory;

use crate::core::PersistenceError;
use async_trait::async_trait;
use std::sync::Arc;

pub use memory::{ConnectionEvent, MemoryPersistence};

pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;

/// Database-like target an upgrade runs against.
///
/// Implementations live outside this crate; the engine never opens or pools
/// connections itself.
#[async_trait]
pub trait PersistenceContext: Send + Sync {
    async fn is_connected(&self) -> bool;

    /// Handle used by transactional tasks to drive commit mode.
    async fn connection(&self) -> PersistenceResult<Arc<dyn ConnectionHandle>>;

    /// Execute a raw statement against the target
    async fn execute(&self, statement: &str) -> PersistenceResult<()>;
}

/// Opaque connection handle.
///
/// Transactional tasks assume exclusive access to it for their duration.
#[async_trait]
pub trait ConnectionHandle: Send + Sync {
    async fn auto_commit(&self) -> PersistenceResult<bool>;
    async fn set_auto_commit(&self, enabled: bool) -> PersistenceResult<()>;
    async fn commit(&self) -> PersistenceResult<()>;
    async fn rollback(&self) -> PersistenceResult<()>;
}
