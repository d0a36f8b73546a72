use crate::task::TaskId;
use std::collections::HashMap;

pub const DEFAULT_LOGGER: &str = "upgrade";

/// Maps task ids to the logger name their events are tagged with.
#[derive(Debug, Clone)]
pub struct LoggerRegistry {
    default: String,
    loggers: HashMap<TaskId, String>,
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self {
            default: DEFAULT_LOGGER.to_string(),
            loggers: HashMap::new(),
        }
    }

    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default = name.into();
        self
    }

    pub fn register(&mut self, task: TaskId, logger: impl Into<String>) {
        self.loggers.insert(task, logger.into());
    }

    pub fn logger_for(&self, task: &TaskId) -> &str {
        self.loggers
            .get(task)
            .map(String::as_str)
            .unwrap_or(&self.default)
    }

    pub fn default_logger(&self) -> &str {
        &self.default
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falls_back_to_default() {
        let mut registry = LoggerRegistry::new().with_default("migrations");
        registry.register(TaskId::new("add_users"), "migrations.users");

        assert_eq!(registry.logger_for(&TaskId::new("add_users")), "migrations.users");
        assert_eq!(registry.logger_for(&TaskId::new("other")), "migrations");
    }
}
