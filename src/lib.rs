// fireops - fire-safety operations core
// Facility completion rollup, order lifecycle / invoicing and customer deactivation

pub mod cascade;
pub mod cli;
pub mod config;
pub mod database;
pub mod entities;
pub mod errors;
pub mod orders;
pub mod priority;
pub mod report;
pub mod rollup;
pub mod store;
pub mod tasks;
pub mod telemetry;

// Re-export key types for easy access
pub use cascade::{
    CustomerDeactivation, CustomerDependents, DeactivationPlan, FacilityDisposition,
    FacilityReassignment, OrderDisposition, ReassignmentOutcome, TaskDisposition,
};
pub use config::{config, FireOpsConfig};
pub use entities::{
    ControlCategory, Customer, EntityId, EntityKind, EntityRef, Facility, FacilityStatus,
    OperatorContext, Order, OrderStatus, Task, TaskStatus, TaskType, Technician,
};
pub use errors::{ValidationError, WorkflowError};
pub use orders::{CompletionRequest, InvoiceSettings, Invoicing, OrderEvent, OrderLifecycleEngine};
pub use priority::Priority;
pub use report::{Step, StepRecord, StepResult, Workflow, WorkflowReport};
pub use rollup::{CompletionRollup, CompletionSummary};
pub use store::{EntityStore, InMemoryStore, Repository, Snapshot, StoreError};
pub use tasks::{NewTask, TaskLedger};
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};
