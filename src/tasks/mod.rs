//! Task creation shared by the workflows that spawn follow-up work

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entities::{EntityId, OperatorContext, Order, Task, TaskStatus, TaskType, Technician};
use crate::priority::Priority;
use crate::store::{Record, Repository, StoreError};

/// How generated invoice tasks are filed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSettings {
    pub priority: Priority,
    /// Days from completion until the invoice task is due; 0 means due immediately
    pub due_in_days: u32,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self {
            priority: Priority::High,
            due_in_days: 0,
        }
    }
}

/// A task about to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub task_type: TaskType,
    pub customer_id: Option<EntityId>,
    pub facility_id: Option<EntityId>,
    pub order_id: Option<EntityId>,
    pub assignee: Option<Technician>,
    pub priority: Priority,
    pub description: String,
    pub due_at: Option<DateTime<Utc>>,
}

impl NewTask {
    /// The billing follow-up for a closed order
    pub fn invoice_for(
        order: &Order,
        technician: Technician,
        settings: &InvoiceSettings,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            task_type: TaskType::Invoice,
            customer_id: Some(order.customer_id.clone()),
            facility_id: Some(order.facility_id.clone()),
            order_id: Some(order.id.clone()),
            assignee: Some(technician),
            priority: settings.priority,
            description: format!("Invoice order: {}", order.work_type),
            due_at: Some(now + Duration::days(i64::from(settings.due_in_days))),
        }
    }

    pub fn into_task(self, id: EntityId, now: DateTime<Utc>) -> Task {
        Task {
            id,
            task_type: self.task_type,
            customer_id: self.customer_id,
            facility_id: self.facility_id,
            order_id: self.order_id,
            assignee: self.assignee,
            status: TaskStatus::NotStarted,
            priority: self.priority,
            description: self.description,
            due_at: self.due_at,
            created_at: now,
        }
    }
}

#[derive(Clone)]
pub struct TaskLedger {
    repo: Repository,
}

impl TaskLedger {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Insert a task. Not idempotent: calling twice files two tasks.
    pub async fn create(&self, ctx: &OperatorContext, task: NewTask) -> Result<EntityId, StoreError> {
        let task = task.into_task(EntityId::generate(), Utc::now());
        let task_type = task.task_type;
        let order_id = task.order_id.clone();

        let id = self.repo.insert(Record::Task(task)).await?;
        info!(
            task.id = %id,
            task.kind = %task_type,
            order.id = ?order_id.as_ref().map(|o| o.as_str()),
            operator = %ctx.operator,
            correlation.id = %ctx.correlation_id,
            "Task created"
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use std::sync::Arc;

    #[test]
    fn test_invoice_task_shape() {
        let order = Order::new("c-1".into(), "f-1".into(), "Annual alarm inspection").with_id("o-1");
        let now = Utc::now();
        let task = NewTask::invoice_for(&order, Technician::new("Ola"), &InvoiceSettings::default(), now);

        assert_eq!(task.task_type, TaskType::Invoice);
        assert_eq!(task.order_id, Some(EntityId::new("o-1")));
        assert_eq!(task.customer_id, Some(EntityId::new("c-1")));
        assert_eq!(task.facility_id, Some(EntityId::new("f-1")));
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.due_at, Some(now));
        assert_eq!(task.description, "Invoice order: Annual alarm inspection");
    }

    #[test]
    fn test_due_offset_from_settings() {
        let order = Order::new("c-1".into(), "f-1".into(), "Service");
        let now = Utc::now();
        let settings = InvoiceSettings {
            priority: Priority::Normal,
            due_in_days: 14,
        };
        let task = NewTask::invoice_for(&order, Technician::new("Ola"), &settings, now);
        assert_eq!(task.due_at, Some(now + Duration::days(14)));
        assert_eq!(task.priority, Priority::Normal);
    }

    #[tokio::test]
    async fn test_create_inserts_not_started_task() {
        let store = Arc::new(InMemoryStore::new());
        let ledger = TaskLedger::new(Repository::new(store.clone()));
        let order = Order::new("c-1".into(), "f-1".into(), "Service").with_id("o-1");

        let id = ledger
            .create(
                &OperatorContext::new("kari"),
                NewTask::invoice_for(&order, Technician::new("Ola"), &InvoiceSettings::default(), Utc::now()),
            )
            .await
            .unwrap();

        let task = Repository::new(store).task(&id).await.unwrap();
        assert_eq!(task.status, TaskStatus::NotStarted);
        assert!(task.is_invoice_for(&EntityId::new("o-1")));
    }
}
