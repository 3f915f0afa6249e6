use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::{ControlCategory, EntityId, ParseLabelError, Technician};

/// Order pipeline: Pending → InProgress → Completed → Invoiced
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Invoiced,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::Invoiced,
    ];

    /// Completed and Invoiced orders drop out of active views
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Invoiced)
    }

    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InProgress => "in-progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Invoiced => "invoiced",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.label() == wanted)
            .ok_or_else(|| ParseLabelError::new("order status", s))
    }
}

/// One dispatched piece of work against a facility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: EntityId,
    pub customer_id: EntityId,
    pub facility_id: EntityId,
    pub status: OrderStatus,
    /// Kind of work, e.g. "Annual alarm inspection"; used in generated task descriptions
    pub work_type: String,
    pub technician: Option<Technician>,
    /// Categories of the facility this order services, possibly empty
    #[serde(default)]
    pub categories: BTreeSet<ControlCategory>,
    /// Bumped by the store on every write; compared by revision-checked patches
    #[serde(default)]
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        customer_id: EntityId,
        facility_id: EntityId,
        work_type: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::generate(),
            customer_id,
            facility_id,
            status: OrderStatus::Pending,
            work_type: work_type.into(),
            technician: None,
            categories: BTreeSet::new(),
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = ControlCategory>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::InProgress.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Invoiced.is_terminal());
    }

    #[test]
    fn test_status_ordering_follows_pipeline() {
        assert!(OrderStatus::Pending < OrderStatus::InProgress);
        assert!(OrderStatus::Completed < OrderStatus::Invoiced);
    }

    #[test]
    fn test_new_order_is_pending_at_revision_zero() {
        let order = Order::new("c-1".into(), "f-1".into(), "Annual inspection");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.revision, 0);
        assert!(order.is_active());
        assert_eq!(order.created_at, order.updated_at);
    }

    #[test]
    fn test_parse_order_status() {
        assert_eq!("In-Progress".parse(), Ok(OrderStatus::InProgress));
        assert!("closed".parse::<OrderStatus>().is_err());
    }
}
