//! Entity store abstraction
//!
//! The workflows never talk to a database directly. They go through this
//! trait so the same code runs against the in-memory store, the JSON snapshot
//! used by the CLI, SQLite, or a mock in tests.

use async_trait::async_trait;

use super::errors::StoreError;
use super::types::{Filter, Patch, Record};
use crate::entities::{EntityId, EntityKind};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

/// Generic CRUD over the Customer, Facility, Order and Task tables.
///
/// Each call is independently durable once it returns `Ok`. There is no
/// multi-record transaction; callers sequence writes themselves.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Read one record by id
    async fn read(&self, kind: EntityKind, id: &EntityId) -> Result<Record, StoreError>;

    /// All records of a kind matching the filter
    async fn query(&self, kind: EntityKind, filter: &Filter) -> Result<Vec<Record>, StoreError>;

    /// Apply a partial update to an existing record
    async fn write(&self, kind: EntityKind, id: &EntityId, patch: &Patch) -> Result<(), StoreError>;

    /// Insert a new record, returning its id
    async fn insert(&self, record: Record) -> Result<EntityId, StoreError>;
}
