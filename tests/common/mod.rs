#![allow(dead_code)]

use schema_upgrade::{MemoryPersistence, Task, UpgradeContext, Version};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Task bumping `counter` and then succeeding or failing with `"<id> failed"`.
pub fn counting_task(id: &str, counter: &Arc<AtomicUsize>, fail: bool) -> Task {
    let counter = Arc::clone(counter);
    let message = format!("{} failed", id);
    Task::callable(id, move |_ctx| {
        let counter = Arc::clone(&counter);
        let message = message.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            if fail {
                anyhow::bail!(message);
            }
            Ok(())
        }
    })
}

pub fn noop(id: &str) -> Task {
    Task::callable(id, |_ctx| async { Ok(()) })
}

pub fn context(version: impl Into<Version>) -> Arc<UpgradeContext> {
    Arc::new(UpgradeContext::new(version))
}

pub fn context_with_db(version: impl Into<Version>, db: &MemoryPersistence) -> Arc<UpgradeContext> {
    Arc::new(
        UpgradeContext::builder(version)
            .database(Arc::new(db.clone()))
            .build(),
    )
}

pub fn count(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}
