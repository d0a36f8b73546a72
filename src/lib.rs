// ============================================================================
// Schema Upgrade Library
// ============================================================================

//! Walks a version graph from the version a target currently holds to the
//! terminal version, executing the task tree attached to every edge.
//!
//! # Examples
//!
//! ```
//! use schema_upgrade::{Graph, MemoryPersistence, Task, UpgradeContext, UpgradeDefinitionFactory};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let graph = Graph::builder()
//!     .edge("1", "2", Task::statement("add_users", "CREATE TABLE users (id INTEGER)"))
//!     .edge(
//!         "2",
//!         "3",
//!         Task::transactional(
//!             "seed_users",
//!             Task::serial(
//!                 "seed",
//!                 [
//!                     Task::statement("alice", "INSERT INTO users VALUES (1)"),
//!                     Task::statement("bob", "INSERT INTO users VALUES (2)"),
//!                 ],
//!             ),
//!         ),
//!     )
//!     .build()?;
//!
//! let db = MemoryPersistence::new();
//! let ctx = Arc::new(UpgradeContext::builder("1").database(Arc::new(db.clone())).build());
//!
//! let factory = UpgradeDefinitionFactory::new("accounts", graph);
//! assert!(factory.is_upgrade_supported(&ctx));
//!
//! let definition = factory.create(&ctx)?;
//! assert_eq!(definition.destination_version().label(), Some("3"));
//!
//! tokio_test::block_on(definition.execute(&ctx))?;
//! assert_eq!(db.applied_statements().len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod core;
pub mod definition;
pub mod executor;
pub mod graph;
pub mod persistence;
pub mod task;

// Re-export main types for convenience
pub use config::UpgradeConfig;
pub use context::{CapabilityTag, UpgradeContext};
pub use crate::core::{
    AggregateTaskFailure, PersistenceError, Result, TaskFailure, TransactionFailure, UpgradeError,
    Version,
};
pub use definition::{UpgradeDefinition, UpgradeDefinitionFactory, UpgradeStep};
pub use executor::{UpgradeExecutor, UpgradeReport};
pub use graph::{Edge, Graph, GraphBuilder};
pub use persistence::{ConnectionHandle, MemoryPersistence, PersistenceContext};
pub use task::{Task, TaskId};
