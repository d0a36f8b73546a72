use super::{UpgradeDefinition, UpgradeStep};
use crate::context::UpgradeContext;
use crate::core::Result;
use crate::graph::Graph;
use std::sync::Arc;
use tracing::{Level, event};

/// Turns a graph into the definition a given context needs.
#[derive(Debug, Clone)]
pub struct UpgradeDefinitionFactory {
    name: String,
    graph: Arc<Graph>,
}

impl UpgradeDefinitionFactory {
    pub fn new(name: impl Into<String>, graph: impl Into<Arc<Graph>>) -> Self {
        Self {
            name: name.into(),
            graph: graph.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Resolves the path from the context's current version.
    ///
    /// Every resolution error surfaces here, before anything executes. A
    /// context already at the terminal version gets an empty definition.
    pub fn create(&self, ctx: &UpgradeContext) -> Result<UpgradeDefinition> {
        let current = ctx.current_version();
        let path = self.graph.resolve_path(current).inspect_err(|err| {
            event!(
                Level::ERROR,
                version = %current,
                error = %err,
                "upgrade path resolution failed"
            );
        })?;

        let steps = path
            .edges()
            .iter()
            .map(|edge| UpgradeStep {
                from: edge.source().clone(),
                to: edge.destination().clone(),
                task: Arc::clone(edge.task()),
            })
            .collect::<Vec<_>>();

        event!(
            Level::DEBUG,
            definition = %self.name,
            from = %path.source(),
            to = %path.destination(),
            steps = steps.len(),
            "upgrade path resolved"
        );

        Ok(UpgradeDefinition::new(
            self.name.clone(),
            path.source().clone(),
            path.destination().clone(),
            steps,
        ))
    }

    /// Pre-flight check; never fails, reports `false` instead.
    pub fn is_upgrade_supported(&self, ctx: &UpgradeContext) -> bool {
        self.graph.is_supported(ctx.current_version())
    }
}
