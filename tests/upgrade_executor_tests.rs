/// Upgrade executor tests
///
/// End-to-end runs from a context's version to the terminal version
/// Run with: cargo test --test upgrade_executor_tests

mod common;

use common::{context, context_with_db, noop};
use schema_upgrade::{
    Graph, MemoryPersistence, Task, UpgradeConfig, UpgradeError, UpgradeExecutor, Version,
};
use std::sync::{Arc, Mutex};

fn accounts_graph() -> Graph {
    Graph::builder()
        .edge(
            Version::initial(),
            "1",
            Task::statement("create_accounts", "CREATE TABLE accounts (id INTEGER)"),
        )
        .edge(
            "1",
            "2",
            Task::transactional(
                "add_balance",
                Task::serial(
                    "balance",
                    [
                        Task::statement("alter", "ALTER TABLE accounts ADD balance INTEGER"),
                        Task::statement("backfill", "UPDATE accounts SET balance = 0"),
                    ],
                ),
            ),
        )
        .edge(
            "2",
            "3",
            Task::parallel(
                "indexes",
                [
                    Task::statement("idx_id", "CREATE INDEX idx_id ON accounts (id)"),
                    Task::statement(
                        "idx_balance",
                        "CREATE INDEX idx_balance ON accounts (balance)",
                    ),
                ],
            ),
        )
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_full_run_reaches_terminal_version() {
    let db = MemoryPersistence::new();
    let ctx = context_with_db(Version::initial(), &db);
    let reached = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&reached);

    let executor = UpgradeExecutor::new(UpgradeConfig::new("accounts"))
        .on_version_reached(move |version| seen.lock().unwrap().push(version.clone()));
    let report = executor.upgrade(accounts_graph(), &ctx).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.definition, "accounts");
    assert_eq!(report.run_id, ctx.run_id());
    assert_eq!(report.destination, Version::new("3"));
    assert_eq!(
        report.steps.iter().map(|s| s.task.to_string()).collect::<Vec<_>>(),
        vec!["create_accounts", "add_balance", "indexes"]
    );
    assert_eq!(
        *reached.lock().unwrap(),
        vec![Version::new("1"), Version::new("2"), Version::new("3")]
    );
    assert_eq!(db.applied_statements().len(), 5);
    assert!(db.is_auto_commit());
    assert!(report.finished_at >= report.started_at);
}

#[tokio::test]
async fn test_failed_step_stops_the_run() {
    let db = MemoryPersistence::new().fail_statements_containing("idx_balance");
    let ctx = context_with_db("1", &db);
    let reached = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&reached);

    let executor = UpgradeExecutor::default()
        .on_version_reached(move |version| seen.lock().unwrap().push(version.clone()));
    let err = executor.upgrade(accounts_graph(), &ctx).await.unwrap_err();

    assert!(matches!(err, UpgradeError::Aggregate(ref a) if a.task.as_str() == "indexes"));
    assert_eq!(*reached.lock().unwrap(), vec![Version::new("2")]);
}

#[tokio::test]
async fn test_run_at_terminal_version_is_a_no_op() {
    let executor = UpgradeExecutor::default();
    let report = executor.upgrade(accounts_graph(), &context("3")).await.unwrap();

    assert!(report.steps.is_empty());
    assert!(report.is_complete());
    assert_eq!(report.reached, Version::new("3"));
}

#[tokio::test]
async fn test_unknown_version_fails_before_running() {
    let executor = UpgradeExecutor::default();
    let err = executor
        .upgrade(accounts_graph(), &context("legacy"))
        .await
        .unwrap_err();
    assert!(matches!(err, UpgradeError::UnknownVersion(_)));
}

#[tokio::test]
async fn test_report_serializes() {
    let graph = Graph::builder().edge("1", "2", noop("bump")).build().unwrap();
    let executor = UpgradeExecutor::new(UpgradeConfig::new("json").log_plan(false));
    let report = executor.upgrade(graph, &context("1")).await.unwrap();

    let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(value["definition"], "json");
    assert_eq!(value["reached"]["named"], "2");
    assert_eq!(value["steps"][0]["task"], "bump");
    assert_eq!(value["dry_run"], false);
}
