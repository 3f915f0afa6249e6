use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::config::FireOpsConfig;
use crate::database::open_database;
use crate::report::WorkflowReport;
use crate::store::{InMemoryStore, Repository, Snapshot, SnapshotLock};

pub mod customer;
pub mod facility;
pub mod init;
pub mod order;
pub mod task;

/// Run `f` against the configured store.
///
/// For the snapshot backend the file is locked for the whole call, loaded
/// into memory and written back if anything was written, including when `f`
/// fails part way: writes that were acknowledged stay applied.
pub async fn with_repository<F, Fut, R>(config: &FireOpsConfig, data: &Path, f: F) -> Result<R>
where
    F: FnOnce(Repository) -> Fut,
    Fut: std::future::Future<Output = Result<R>>,
{
    if let Some(database) = &config.store.database {
        let store = open_database(database).await?;
        return f(Repository::new(store)).await;
    }

    let mut lock = SnapshotLock::open(data)?;
    let _guard = lock.acquire()?;

    let snapshot = Snapshot::load(data).await?;
    let store = Arc::new(InMemoryStore::from_snapshot(snapshot));
    let outcome = f(Repository::new(store.clone())).await;

    if store.write_count() + store.insert_count() > 0 {
        store.snapshot().await.save(data).await?;
    } else {
        debug!(path = %data.display(), "Nothing written, snapshot left as is");
    }
    outcome
}

pub fn print_report(report: &WorkflowReport) {
    println!("{}", report);
}
