//! Entity store access
//!
//! The persistence layer is an external collaborator: generic read / query /
//! write / insert over four tables, no multi-record transactions. This module
//! defines that interface and the backends the crate ships with.

pub mod errors;
pub mod memory;
pub mod repository;
pub mod snapshot;
pub mod traits;
pub mod types;

pub use errors::StoreError;
pub use memory::InMemoryStore;
pub use repository::Repository;
pub use snapshot::{Snapshot, SnapshotLock};
pub use traits::EntityStore;
pub use types::{
    Comparison, CustomerPatch, FacilityPatch, Field, FieldValue, Filter, OrderPatch, Patch,
    Predicate, Record, TaskPatch,
};

#[cfg(any(test, feature = "testing"))]
pub use traits::MockEntityStore;
