use thiserror::Error;

use crate::entities::{ControlCategory, EntityId, EntityRef, OrderStatus};
use crate::report::{Step, WorkflowReport};
use crate::store::StoreError;

/// A precondition that failed before any write was issued
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("facility {facility} does not subscribe to control category '{category}'")]
    InvalidCategory {
        facility: EntityId,
        category: ControlCategory,
    },

    #[error("order {order} is not yet invoiced, a technician must be chosen for the invoice task")]
    MissingTechnician { order: EntityId },

    #[error("customer {customer}: facilities are to be moved but no destination customer was chosen")]
    MissingMoveDestination { customer: EntityId },

    #[error("customer {customer}: facilities cannot be moved to the customer being deactivated")]
    MoveToSelf { customer: EntityId },

    #[error("customer {destination} cannot receive facilities: {reason}")]
    DestinationUnavailable { destination: EntityId, reason: String },

    #[error("order {order}: status 'invoiced' is only reached when its invoice task is marked done")]
    InvoicedRequiresSettlement { order: EntityId },

    #[error("order {order} is already invoiced and can no longer change status")]
    OrderInvoiced { order: EntityId },

    #[error("order {order} is already closed (status '{status}')")]
    OrderAlreadyClosed { order: EntityId, status: OrderStatus },

    #[error("order {order} must be completed before it can be invoiced (status '{status}')")]
    NotCompleted { order: EntityId, status: OrderStatus },

    #[error("customer {customer} still has {facilities} facilities, {orders} active orders and {tasks} active tasks")]
    CustomerHasDependents {
        customer: EntityId,
        facilities: usize,
        orders: usize,
        tasks: usize,
    },
}

/// Errors surfaced by the workflows
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A store call failed; nothing after it was attempted
    #[error("{operation} on {target} failed: {source}")]
    Store {
        operation: Step,
        target: EntityRef,
        #[source]
        source: StoreError,
    },

    /// Reading state before deciding what to write failed; nothing was written
    #[error("reading {target} failed: {source}")]
    Read {
        target: EntityRef,
        #[source]
        source: StoreError,
    },

    /// The first write succeeded but a later one did not; see the report
    #[error("{} partially applied:\n{}", .0.workflow, .0)]
    PartialCompletion(Box<WorkflowReport>),

    /// One or more dependent records could not be updated; the customer hide was still attempted
    #[error("customer deactivation partially applied:\n{0}")]
    PartialCascadeFailure(Box<WorkflowReport>),
}

impl WorkflowError {
    pub fn read(target: EntityRef, source: StoreError) -> Self {
        WorkflowError::Read { target, source }
    }

    pub fn store(operation: Step, target: EntityRef, source: StoreError) -> Self {
        WorkflowError::Store {
            operation,
            target,
            source,
        }
    }

    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            WorkflowError::Validation(e) => Some(e),
            _ => None,
        }
    }

    /// The step-by-step report for partially applied workflows
    pub fn report(&self) -> Option<&WorkflowReport> {
        match self {
            WorkflowError::PartialCompletion(report) | WorkflowError::PartialCascadeFailure(report) => {
                Some(report)
            }
            _ => None,
        }
    }
}
