pub mod capability;
pub mod logger;

use crate::core::{Result, Version};
use crate::persistence::PersistenceContext;
use crate::task::TaskId;
use std::sync::Arc;
use uuid::Uuid;

pub use capability::{CapabilityRegistry, CapabilityTag};
pub use logger::{DEFAULT_LOGGER, LoggerRegistry};

/// Execution context of one upgrade run
///
/// Carries the version the target currently holds and the capabilities
/// tasks may use. Built once per run and only read afterwards.
#[derive(Debug)]
pub struct UpgradeContext {
    run_id: Uuid,
    current_version: Version,
    capabilities: CapabilityRegistry,
    loggers: LoggerRegistry,
}

impl UpgradeContext {
    pub fn builder(current_version: impl Into<Version>) -> UpgradeContextBuilder {
        UpgradeContextBuilder {
            current_version: current_version.into(),
            capabilities: CapabilityRegistry::new(),
            loggers: LoggerRegistry::new(),
        }
    }

    /// Context without capabilities
    pub fn new(current_version: impl Into<Version>) -> Self {
        Self::builder(current_version).build()
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn current_version(&self) -> &Version {
        &self.current_version
    }

    pub fn persistence(&self, tag: &CapabilityTag) -> Result<Arc<dyn PersistenceContext>> {
        self.capabilities.get(tag)
    }

    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    pub fn logger_for(&self, task: &TaskId) -> &str {
        self.loggers.logger_for(task)
    }
}

pub struct UpgradeContextBuilder {
    current_version: Version,
    capabilities: CapabilityRegistry,
    loggers: LoggerRegistry,
}

impl UpgradeContextBuilder {
    pub fn persistence(
        mut self,
        tag: impl Into<CapabilityTag>,
        capability: Arc<dyn PersistenceContext>,
    ) -> Self {
        self.capabilities.register(tag.into(), capability);
        self
    }

    /// Registers `capability` as the primary database
    pub fn database(self, capability: Arc<dyn PersistenceContext>) -> Self {
        self.persistence(CapabilityTag::DATABASE, capability)
    }

    pub fn logger(mut self, task: impl Into<TaskId>, name: impl Into<String>) -> Self {
        self.loggers.register(task.into(), name);
        self
    }

    pub fn default_logger(mut self, name: impl Into<String>) -> Self {
        self.loggers = self.loggers.with_default(name);
        self
    }

    pub fn build(self) -> UpgradeContext {
        UpgradeContext {
            run_id: Uuid::new_v4(),
            current_version: self.current_version,
            capabilities: self.capabilities,
            loggers: self.loggers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryPersistence;

    #[test]
    fn test_builder_registers_everything() {
        let ctx = UpgradeContext::builder("3")
            .database(Arc::new(MemoryPersistence::new()))
            .persistence("audit", Arc::new(MemoryPersistence::new()))
            .logger("seed_users", "upgrade.seed")
            .build();

        assert_eq!(ctx.current_version(), &Version::new("3"));
        assert_eq!(ctx.capabilities().len(), 2);
        assert!(ctx.persistence(&CapabilityTag::new("audit")).is_ok());
        assert_eq!(ctx.logger_for(&TaskId::new("seed_users")), "upgrade.seed");
        assert_eq!(ctx.logger_for(&TaskId::new("other")), DEFAULT_LOGGER);
    }

    #[test]
    fn test_each_context_gets_its_own_run_id() {
        let a = UpgradeContext::new(Version::initial());
        let b = UpgradeContext::new(Version::initial());
        assert_ne!(a.run_id(), b.run_id());
    }
}
