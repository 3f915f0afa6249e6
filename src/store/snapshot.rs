//! JSON snapshot of all four tables
//!
//! The CLI keeps its data in a single JSON file. Each invocation takes an
//! exclusive lock next to the file, loads it into an [`InMemoryStore`], runs
//! one workflow and writes the result back.
//!
//! [`InMemoryStore`]: super::memory::InMemoryStore

use fd_lock::{RwLock, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::errors::StoreError;
use super::types::Record;
use crate::entities::{Customer, Facility, Order, Task};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub facilities: Vec<Facility>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            ..Default::default()
        }
    }

    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut snapshot = Self::empty();
        for record in records {
            match record {
                Record::Customer(c) => snapshot.customers.push(c),
                Record::Facility(f) => snapshot.facilities.push(f),
                Record::Order(o) => snapshot.orders.push(o),
                Record::Task(t) => snapshot.tasks.push(t),
            }
        }
        snapshot.customers.sort_by(|a, b| a.id.cmp(&b.id));
        snapshot.facilities.sort_by(|a, b| a.id.cmp(&b.id));
        snapshot.orders.sort_by(|a, b| a.id.cmp(&b.id));
        snapshot.tasks.sort_by(|a, b| a.id.cmp(&b.id));
        snapshot
    }

    pub fn into_records(self) -> impl Iterator<Item = Record> {
        self.customers
            .into_iter()
            .map(Record::Customer)
            .chain(self.facilities.into_iter().map(Record::Facility))
            .chain(self.orders.into_iter().map(Record::Order))
            .chain(self.tasks.into_iter().map(Record::Task))
    }

    /// Load a snapshot; a missing file is an empty snapshot
    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        if !tokio::fs::try_exists(path).await? {
            debug!(path = %path.display(), "No snapshot file, starting empty");
            return Ok(Self::empty());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::Serialization {
                message: format!(
                    "unsupported snapshot version {} in {} (expected {})",
                    snapshot.version,
                    path.display(),
                    SNAPSHOT_VERSION
                ),
            });
        }
        Ok(snapshot)
    }

    /// Write the snapshot through a temporary file and rename it into place
    pub async fn save(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, content).await?;
        tokio::fs::rename(&temp_path, path).await?;

        info!(
            path = %path.display(),
            customers = self.customers.len(),
            facilities = self.facilities.len(),
            orders = self.orders.len(),
            tasks = self.tasks.len(),
            "Snapshot saved"
        );
        Ok(())
    }
}

/// Lock file guarding a snapshot against concurrent CLI sessions
pub struct SnapshotLock {
    lock: RwLock<File>,
    path: PathBuf,
}

impl SnapshotLock {
    pub fn open(snapshot_path: &Path) -> Result<Self, StoreError> {
        let path = snapshot_path.with_extension("lock");
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)?;
        Ok(Self {
            lock: RwLock::new(file),
            path,
        })
    }

    /// Take the exclusive lock, failing fast if another session holds it
    pub fn acquire(&mut self) -> Result<RwLockWriteGuard<'_, File>, StoreError> {
        let path = self.path.display().to_string();
        self.lock.try_write().map_err(|_| StoreError::Backend {
            message: format!("snapshot is locked by another session ({path})"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ControlCategory;

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = Snapshot::load(&dir.path().join("absent.json")).await.unwrap();
        assert_eq!(snapshot, Snapshot::empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("fireops.json");

        let customer = Customer::new("Sameiet Lia").with_id("c-1");
        let facility = Facility::new("Lia blokk A", Some("c-1".into()), [ControlCategory::SmokeVents])
            .with_id("f-1");
        let snapshot = Snapshot::from_records([
            Record::Facility(facility),
            Record::Customer(customer),
        ]);
        snapshot.save(&path).await.unwrap();

        let loaded = Snapshot::load(&path).await.unwrap();
        assert_eq!(loaded, snapshot);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_unknown_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.json");
        tokio::fs::write(&path, r#"{"version": 99}"#).await.unwrap();
        let err = Snapshot::load(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization { .. }));
    }

    #[test]
    fn test_second_lock_fails_while_first_is_held() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fireops.json");

        let mut first = SnapshotLock::open(&path).unwrap();
        let _guard = first.acquire().unwrap();

        let mut second = SnapshotLock::open(&path).unwrap();
        assert!(second.acquire().is_err());
    }
}
