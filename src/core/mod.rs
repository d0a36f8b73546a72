pub mod error;
pub mod version;

pub use error::{
    AggregateTaskFailure, PersistenceError, Result, TaskFailure, TransactionFailure, UpgradeError,
};
pub use version::Version;
