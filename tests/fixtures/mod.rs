//! Shared seed data for the workflow integration tests
#![allow(dead_code)]

use chrono::Utc;
use std::sync::Arc;

use fireops::priority::Priority;
use fireops::store::Record;
use fireops::{
    ControlCategory, Customer, EntityId, Facility, InMemoryStore, NewTask, OperatorContext, Order,
    OrderStatus, Repository, Task, TaskStatus, TaskType,
};

/// An in-memory store plus a repository over it
pub struct World {
    pub store: Arc<InMemoryStore>,
    pub repo: Repository,
}

impl World {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let repo = Repository::new(store.clone());
        Self { store, repo }
    }

    pub async fn customer(&self, id: &str, name: &str) -> EntityId {
        self.store
            .seed(Record::Customer(Customer::new(name).with_id(id)))
            .await;
        EntityId::new(id)
    }

    pub async fn hidden_customer(&self, id: &str, name: &str) -> EntityId {
        let mut customer = Customer::new(name).with_id(id);
        customer.hidden = true;
        self.store.seed(Record::Customer(customer)).await;
        EntityId::new(id)
    }

    pub async fn facility(
        &self,
        id: &str,
        name: &str,
        customer: Option<&str>,
        categories: &[ControlCategory],
    ) -> EntityId {
        let facility = Facility::new(name, customer.map(EntityId::new), categories.iter().copied())
            .with_id(id);
        self.store.seed(Record::Facility(facility)).await;
        EntityId::new(id)
    }

    pub async fn order(&self, id: &str, customer: &str, facility: &str, status: OrderStatus) -> EntityId {
        self.order_covering(id, customer, facility, status, &[]).await
    }

    pub async fn order_covering(
        &self,
        id: &str,
        customer: &str,
        facility: &str,
        status: OrderStatus,
        categories: &[ControlCategory],
    ) -> EntityId {
        let order = Order::new(customer.into(), facility.into(), "Annual service")
            .with_id(id)
            .with_status(status)
            .with_categories(categories.iter().copied());
        self.store.seed(Record::Order(order)).await;
        EntityId::new(id)
    }

    pub async fn task(
        &self,
        id: &str,
        task_type: TaskType,
        customer: Option<&str>,
        order: Option<&str>,
        status: TaskStatus,
    ) -> EntityId {
        let mut task: Task = NewTask {
            task_type,
            customer_id: customer.map(EntityId::new),
            facility_id: None,
            order_id: order.map(EntityId::new),
            assignee: None,
            priority: Priority::Normal,
            description: format!("{} task", task_type),
            due_at: None,
        }
        .into_task(EntityId::new(id), Utc::now());
        task.status = status;
        self.store.seed(Record::Task(task)).await;
        EntityId::new(id)
    }

    pub async fn invoice_tasks_for(&self, order: &EntityId) -> Vec<Task> {
        self.repo.invoice_tasks_for(order).await.unwrap()
    }
}

pub fn operator() -> OperatorContext {
    OperatorContext::new("kari.nordmann")
}

/// "Nordbygg AS" with facility "Nordbygg Kjeller" and one pending order
pub async fn nordbygg() -> World {
    let world = World::new();
    world.customer("c-nordbygg", "Nordbygg AS").await;
    world
        .facility(
            "f-kjeller",
            "Nordbygg Kjeller",
            Some("c-nordbygg"),
            &[ControlCategory::Alarm, ControlCategory::EmergencyLighting],
        )
        .await;
    world
        .order("o-kjeller", "c-nordbygg", "f-kjeller", OrderStatus::Pending)
        .await;
    world
}

/// "Sameiet Lia" with two facilities and one invoiced order, plus "Sameiet Lia 2"
pub async fn sameiet_lia() -> World {
    let world = World::new();
    world.customer("c-lia", "Sameiet Lia").await;
    world.customer("c-lia-2", "Sameiet Lia 2").await;
    world
        .facility("f-lia-a", "Lia blokk A", Some("c-lia"), &[ControlCategory::SmokeVents])
        .await;
    world
        .facility(
            "f-lia-b",
            "Lia blokk B",
            Some("c-lia"),
            &[ControlCategory::SmokeVents, ControlCategory::ExtinguishingEquipment],
        )
        .await;
    world
        .order("o-lia", "c-lia", "f-lia-a", OrderStatus::Invoiced)
        .await;
    world
}
