use serde::Serialize;
use std::fmt;

use crate::entities::{EntityId, Facility, Order, Task};
use crate::store::{Repository, StoreError};

/// Everything that still references a customer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDependents {
    pub customer: EntityId,
    /// Every facility referencing the customer, hidden ones included
    pub facilities: Vec<Facility>,
    pub active_orders: Vec<Order>,
    pub active_tasks: Vec<Task>,
    /// Completed or invoiced orders; kept as history and never touched
    pub terminal_orders: usize,
    pub terminal_tasks: usize,
}

impl CustomerDependents {
    pub async fn load(repo: &Repository, customer: &EntityId) -> Result<Self, StoreError> {
        let facilities = repo.facilities_of(customer).await?;
        let active_orders = repo.active_orders_of(customer).await?;
        let active_tasks = repo.active_tasks_of(customer).await?;
        let all_orders = repo.orders_of(customer).await?.len();
        let all_tasks = repo.tasks_of(customer).await?.len();

        Ok(Self {
            customer: customer.clone(),
            facilities,
            terminal_orders: all_orders.saturating_sub(active_orders.len()),
            terminal_tasks: all_tasks.saturating_sub(active_tasks.len()),
            active_orders,
            active_tasks,
        })
    }

    /// The customer has no facilities and no active orders or tasks.
    ///
    /// Shared by the deactivation preview and the orphan check after a
    /// facility changes owner. Terminal history does not count.
    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty() && self.active_orders.is_empty() && self.active_tasks.is_empty()
    }

    pub fn counts(&self) -> DependentCounts {
        DependentCounts {
            facilities: self.facilities.len(),
            active_orders: self.active_orders.len(),
            active_tasks: self.active_tasks.len(),
            terminal_orders: self.terminal_orders,
            terminal_tasks: self.terminal_tasks,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DependentCounts {
    pub facilities: usize,
    pub active_orders: usize,
    pub active_tasks: usize,
    pub terminal_orders: usize,
    pub terminal_tasks: usize,
}

impl fmt::Display for DependentCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "   Facilities:    {}", self.facilities)?;
        writeln!(f, "   Active orders: {}", self.active_orders)?;
        writeln!(f, "   Active tasks:  {}", self.active_tasks)?;
        write!(
            f,
            "   Preserved:     {} closed order(s), {} done task(s)",
            self.terminal_orders, self.terminal_tasks
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ControlCategory, OrderStatus};
    use crate::store::{InMemoryStore, Record};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_terminal_history_does_not_count_as_dependent() {
        let store = Arc::new(InMemoryStore::new());
        store
            .seed(Record::Order(
                Order::new("c-1".into(), "f-gone".into(), "Service")
                    .with_id("o-1")
                    .with_status(OrderStatus::Invoiced),
            ))
            .await;
        let repo = Repository::new(store);

        let dependents = CustomerDependents::load(&repo, &"c-1".into()).await.unwrap();
        assert!(dependents.is_empty());
        assert_eq!(dependents.counts().terminal_orders, 1);
    }

    #[tokio::test]
    async fn test_hidden_facility_still_counts() {
        let store = Arc::new(InMemoryStore::new());
        let mut facility = Facility::new("Lager", Some("c-1".into()), [ControlCategory::Alarm]);
        facility.hidden = true;
        store.seed(Record::Facility(facility)).await;
        let repo = Repository::new(store);

        let dependents = CustomerDependents::load(&repo, &"c-1".into()).await.unwrap();
        assert!(!dependents.is_empty());
        assert_eq!(dependents.counts().facilities, 1);
    }
}
