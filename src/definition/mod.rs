pub mod factory;

use crate::context::UpgradeContext;
use crate::core::{Result, Version};
use crate::task::Task;
use std::fmt::Write as _;
use std::sync::Arc;

pub use factory::UpgradeDefinitionFactory;

/// One edge of a resolved path.
#[derive(Debug, Clone)]
pub struct UpgradeStep {
    pub from: Version,
    pub to: Version,
    pub task: Arc<Task>,
}

/// Resolved upgrade: ordered tasks plus the version they lead to.
#[derive(Debug, Clone)]
pub struct UpgradeDefinition {
    name: String,
    source: Version,
    destination: Version,
    steps: Vec<UpgradeStep>,
}

impl UpgradeDefinition {
    pub fn new(
        name: impl Into<String>,
        source: Version,
        destination: Version,
        steps: Vec<UpgradeStep>,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            destination,
            steps,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_version(&self) -> &Version {
        &self.source
    }

    pub fn destination_version(&self) -> &Version {
        &self.destination
    }

    pub fn steps(&self) -> &[UpgradeStep] {
        &self.steps
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Arc<Task>> {
        self.steps.iter().map(|step| &step.task)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when the target already holds the destination version.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{}: {} -> {} ({} steps)",
            self.name,
            self.source,
            self.destination,
            self.steps.len()
        );
        for step in &self.steps {
            let _ = writeln!(out, "{} -> {}", step.from, step.to);
            for line in step.task.describe().lines() {
                let _ = writeln!(out, "  {}", line);
            }
        }
        out
    }

    /// Runs every task in order, stopping at the first failure.
    pub async fn execute(&self, ctx: &Arc<UpgradeContext>) -> Result<()> {
        for task in self.tasks() {
            task.execute(ctx).await?;
        }
        Ok(())
    }
}
