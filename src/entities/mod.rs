// Domain entities - the four tables the workflows operate on

pub mod context;
pub mod customer;
pub mod facility;
pub mod ids;
pub mod order;
pub mod task;

pub use context::{OperatorContext, Technician};
pub use customer::Customer;
pub use facility::{ControlCategory, Facility, FacilityStatus};
pub use ids::{EntityId, EntityKind, EntityRef};
pub use order::{Order, OrderStatus};
pub use task::{Task, TaskStatus, TaskType};

/// Error returned when a status or category label cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what}: '{value}'")]
pub struct ParseLabelError {
    pub what: &'static str,
    pub value: String,
}

impl ParseLabelError {
    pub(crate) fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_string(),
        }
    }
}
