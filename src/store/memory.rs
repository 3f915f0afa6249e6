use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::RwLock;
use tracing::debug;

use super::errors::StoreError;
use super::snapshot::Snapshot;
use super::traits::EntityStore;
use super::types::{Filter, Patch, Record};
use crate::entities::{EntityId, EntityKind, EntityRef};

type Table = BTreeMap<EntityId, Record>;

/// Store that keeps all four tables in memory.
///
/// Backs the CLI (loaded from a snapshot file) and the test suites. Writes and
/// inserts can be made to fail on purpose to exercise partial-failure paths.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<HashMap<EntityKind, Table>>,
    failing_writes: Mutex<HashSet<EntityRef>>,
    failing_inserts: Mutex<HashSet<EntityKind>>,
    writes: AtomicUsize,
    inserts: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding every record of the snapshot
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut tables: HashMap<EntityKind, Table> = HashMap::new();
        for record in snapshot.into_records() {
            tables
                .entry(record.kind())
                .or_default()
                .insert(record.id().clone(), record);
        }
        Self {
            tables: RwLock::new(tables),
            ..Default::default()
        }
    }

    /// Export the current contents
    pub async fn snapshot(&self) -> Snapshot {
        let tables = self.tables.read().await;
        let records = tables.values().flat_map(|table| table.values().cloned());
        Snapshot::from_records(records)
    }

    /// Seed a record without counting it as an insert
    pub async fn seed(&self, record: Record) {
        let mut tables = self.tables.write().await;
        tables
            .entry(record.kind())
            .or_default()
            .insert(record.id().clone(), record);
    }

    /// Make every subsequent write to this record fail
    pub fn fail_writes_to(&self, target: EntityRef) {
        if let Ok(mut failing) = self.failing_writes.lock() {
            failing.insert(target);
        }
    }

    /// Make every subsequent insert of this kind fail
    pub fn fail_inserts_of(&self, kind: EntityKind) {
        if let Ok(mut failing) = self.failing_inserts.lock() {
            failing.insert(kind);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failing) = self.failing_writes.lock() {
            failing.clear();
        }
        if let Ok(mut failing) = self.failing_inserts.lock() {
            failing.clear();
        }
    }

    /// Number of write calls attempted, successful or not
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Number of insert calls attempted, successful or not
    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::Relaxed)
    }

    fn write_fails(&self, target: &EntityRef) -> bool {
        self.failing_writes
            .lock()
            .map(|failing| failing.contains(target))
            .unwrap_or(false)
    }

    fn insert_fails(&self, kind: EntityKind) -> bool {
        self.failing_inserts
            .lock()
            .map(|failing| failing.contains(&kind))
            .unwrap_or(false)
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn read(&self, kind: EntityKind, id: &EntityId) -> Result<Record, StoreError> {
        let tables = self.tables.read().await;
        tables
            .get(&kind)
            .and_then(|table| table.get(id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind,
                id: id.clone(),
            })
    }

    async fn query(&self, kind: EntityKind, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables
            .get(&kind)
            .map(|table| {
                table
                    .values()
                    .filter(|record| filter.matches(record))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }

    async fn write(&self, kind: EntityKind, id: &EntityId, patch: &Patch) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::Relaxed);

        if patch.kind() != kind {
            return Err(StoreError::KindMismatch {
                expected: kind,
                found: patch.kind(),
            });
        }

        let target = EntityRef::new(kind, id);
        if self.write_fails(&target) {
            return Err(StoreError::Rejected {
                kind,
                id: id.clone(),
                reason: "write failure injected".to_string(),
            });
        }

        let mut tables = self.tables.write().await;
        let record = tables
            .get_mut(&kind)
            .and_then(|table| table.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                kind,
                id: id.clone(),
            })?;

        // Apply to a copy so a rejected patch leaves the row untouched
        let mut updated = record.clone();
        updated.apply(patch, Utc::now())?;
        *record = updated;

        debug!(kind = %kind, id = %id, "Record updated");
        Ok(())
    }

    async fn insert(&self, record: Record) -> Result<EntityId, StoreError> {
        self.inserts.fetch_add(1, Ordering::Relaxed);

        let kind = record.kind();
        let id = record.id().clone();
        if self.insert_fails(kind) {
            return Err(StoreError::Rejected {
                kind,
                id,
                reason: "insert failure injected".to_string(),
            });
        }

        let mut tables = self.tables.write().await;
        let table = tables.entry(kind).or_default();
        if table.contains_key(&id) {
            return Err(StoreError::AlreadyExists { kind, id });
        }
        table.insert(id.clone(), record);

        debug!(kind = %kind, id = %id, "Record inserted");
        Ok(id)
    }
}
