use crate::core::Version;
use crate::task::TaskId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub from: Version,
    pub to: Version,
    pub task: TaskId,
}

/// Outcome of a successful upgrade run.
///
/// For a dry run `steps` lists what would have been applied and `reached`
/// stays at `source`.
#[derive(Debug, Clone, Serialize)]
pub struct UpgradeReport {
    pub run_id: Uuid,
    pub definition: String,
    pub source: Version,
    pub destination: Version,
    pub reached: Version,
    pub steps: Vec<StepRecord>,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl UpgradeReport {
    pub fn is_complete(&self) -> bool {
        self.reached == self.destination
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
