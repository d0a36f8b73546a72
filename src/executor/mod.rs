pub mod report;

use crate::config::UpgradeConfig;
use crate::context::UpgradeContext;
use crate::core::{Result, Version};
use crate::definition::{UpgradeDefinition, UpgradeDefinitionFactory};
use crate::graph::Graph;
use chrono::Utc;
use std::sync::Arc;
use tracing::{Instrument, Level, event, info_span};

pub use report::{StepRecord, UpgradeReport};

type ProgressHook = Arc<dyn Fn(&Version) + Send + Sync>;

/// Drives a definition to its destination version.
#[derive(Clone)]
pub struct UpgradeExecutor {
    config: UpgradeConfig,
    progress: Option<ProgressHook>,
}

impl UpgradeExecutor {
    pub fn new(config: UpgradeConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Called with every version reached, after its step completed.
    pub fn on_version_reached<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Version) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(hook));
        self
    }

    pub fn config(&self) -> &UpgradeConfig {
        &self.config
    }

    pub fn factory(&self, graph: impl Into<Arc<Graph>>) -> UpgradeDefinitionFactory {
        UpgradeDefinitionFactory::new(self.config.name.clone(), graph)
    }

    /// Resolves the definition for `ctx` and runs it.
    pub async fn upgrade(
        &self,
        graph: impl Into<Arc<Graph>>,
        ctx: &Arc<UpgradeContext>,
    ) -> Result<UpgradeReport> {
        let definition = self.factory(graph).create(ctx)?;
        self.run(&definition, ctx).await
    }

    /// Executes the steps in order.
    ///
    /// The first failing step ends the run and its error is returned as is;
    /// the steps before it stay applied.
    pub async fn run(
        &self,
        definition: &UpgradeDefinition,
        ctx: &Arc<UpgradeContext>,
    ) -> Result<UpgradeReport> {
        let span = info_span!(
            "upgrade.run",
            run_id = %ctx.run_id(),
            definition = %definition.name(),
            from = %definition.source_version(),
            to = %definition.destination_version(),
            dry_run = self.config.dry_run
        );

        async {
            let started_at = Utc::now();
            if self.config.log_plan {
                event!(Level::INFO, plan = %definition.describe(), "upgrade plan");
            }
            if definition.is_empty() {
                event!(Level::INFO, "target already at destination version");
            }

            let mut steps = Vec::with_capacity(definition.len());
            let mut reached = definition.source_version().clone();
            for step in definition.steps() {
                if !self.config.dry_run {
                    if let Err(err) = step.task.execute(ctx).await {
                        event!(
                            Level::ERROR,
                            error = %err,
                            from = %step.from,
                            to = %step.to,
                            applied = steps.len(),
                            "upgrade step failed"
                        );
                        return Err(err);
                    }
                    reached = step.to.clone();
                    event!(Level::INFO, version = %reached, "upgrade step applied");
                    if let Some(progress) = &self.progress {
                        progress(&reached);
                    }
                }
                steps.push(StepRecord {
                    from: step.from.clone(),
                    to: step.to.clone(),
                    task: step.task.id().clone(),
                });
            }

            Ok(UpgradeReport {
                run_id: ctx.run_id(),
                definition: definition.name().to_string(),
                source: definition.source_version().clone(),
                destination: definition.destination_version().clone(),
                reached,
                steps,
                dry_run: self.config.dry_run,
                started_at,
                finished_at: Utc::now(),
            })
        }
        .instrument(span)
        .await
    }
}

impl Default for UpgradeExecutor {
    fn default() -> Self {
        Self::new(UpgradeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryPersistence;
    use crate::task::Task;

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        let db = MemoryPersistence::new();
        let graph = Graph::builder()
            .edge("1", "2", Task::statement("to_2", "CREATE TABLE a (id INTEGER)"))
            .build()
            .unwrap();
        let ctx = Arc::new(UpgradeContext::builder("1").database(Arc::new(db.clone())).build());

        let executor = UpgradeExecutor::new(UpgradeConfig::new("dry").dry_run(true));
        let report = executor.upgrade(graph, &ctx).await.unwrap();

        assert!(report.dry_run);
        assert_eq!(report.steps.len(), 1);
        assert_eq!(report.reached, Version::new("1"));
        assert!(!report.is_complete());
        assert!(db.journal().is_empty());
    }
}
