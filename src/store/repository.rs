use std::sync::Arc;

use super::errors::StoreError;
use super::traits::EntityStore;
use super::types::{Field, FieldValue, Filter, Patch, Record};
use crate::entities::{
    Customer, EntityId, EntityKind, Facility, Order, OrderStatus, Task, TaskStatus, TaskType,
};

/// Typed reads and writes on top of an [`EntityStore`]
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn EntityStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn customer(&self, id: &EntityId) -> Result<Customer, StoreError> {
        match self.store.read(EntityKind::Customer, id).await? {
            Record::Customer(customer) => Ok(customer),
            other => Err(mismatch(EntityKind::Customer, &other)),
        }
    }

    pub async fn facility(&self, id: &EntityId) -> Result<Facility, StoreError> {
        match self.store.read(EntityKind::Facility, id).await? {
            Record::Facility(facility) => Ok(facility),
            other => Err(mismatch(EntityKind::Facility, &other)),
        }
    }

    pub async fn order(&self, id: &EntityId) -> Result<Order, StoreError> {
        match self.store.read(EntityKind::Order, id).await? {
            Record::Order(order) => Ok(order),
            other => Err(mismatch(EntityKind::Order, &other)),
        }
    }

    pub async fn task(&self, id: &EntityId) -> Result<Task, StoreError> {
        match self.store.read(EntityKind::Task, id).await? {
            Record::Task(task) => Ok(task),
            other => Err(mismatch(EntityKind::Task, &other)),
        }
    }

    /// Customers shown in default listings
    pub async fn visible_customers(&self) -> Result<Vec<Customer>, StoreError> {
        let rows = self
            .store
            .query(EntityKind::Customer, &Filter::all().where_eq(Field::Hidden, false))
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|record| match record {
                Record::Customer(customer) => Some(customer),
                _ => None,
            })
            .collect())
    }

    /// Every facility referencing the customer, hidden ones included
    pub async fn facilities_of(&self, customer_id: &EntityId) -> Result<Vec<Facility>, StoreError> {
        let filter = Filter::all().where_eq(Field::CustomerId, customer_id);
        Ok(self
            .store
            .query(EntityKind::Facility, &filter)
            .await?
            .into_iter()
            .filter_map(|record| match record {
                Record::Facility(facility) => Some(facility),
                _ => None,
            })
            .collect())
    }

    pub async fn orders_of(&self, customer_id: &EntityId) -> Result<Vec<Order>, StoreError> {
        self.orders_matching(Filter::all().where_eq(Field::CustomerId, customer_id))
            .await
    }

    /// Orders of the customer that are neither Completed nor Invoiced
    pub async fn active_orders_of(&self, customer_id: &EntityId) -> Result<Vec<Order>, StoreError> {
        self.orders_matching(
            Filter::all()
                .where_eq(Field::CustomerId, customer_id)
                .where_ne(Field::Status, OrderStatus::Completed)
                .where_ne(Field::Status, OrderStatus::Invoiced),
        )
        .await
    }

    pub async fn tasks_of(&self, customer_id: &EntityId) -> Result<Vec<Task>, StoreError> {
        self.tasks_matching(Filter::all().where_eq(Field::CustomerId, customer_id))
            .await
    }

    /// Tasks of the customer that are not Done
    pub async fn active_tasks_of(&self, customer_id: &EntityId) -> Result<Vec<Task>, StoreError> {
        self.tasks_matching(
            Filter::all()
                .where_eq(Field::CustomerId, customer_id)
                .where_ne(Field::Status, TaskStatus::Done),
        )
        .await
    }

    /// Invoice tasks referencing an order
    pub async fn invoice_tasks_for(&self, order_id: &EntityId) -> Result<Vec<Task>, StoreError> {
        self.tasks_matching(
            Filter::all()
                .where_eq(Field::OrderId, FieldValue::Id(order_id.clone()))
                .where_eq(Field::TaskType, TaskType::Invoice),
        )
        .await
    }

    pub async fn write(&self, kind: EntityKind, id: &EntityId, patch: &Patch) -> Result<(), StoreError> {
        self.store.write(kind, id, patch).await
    }

    pub async fn insert(&self, record: Record) -> Result<EntityId, StoreError> {
        self.store.insert(record).await
    }

    async fn orders_matching(&self, filter: Filter) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .store
            .query(EntityKind::Order, &filter)
            .await?
            .into_iter()
            .filter_map(|record| match record {
                Record::Order(order) => Some(order),
                _ => None,
            })
            .collect())
    }

    async fn tasks_matching(&self, filter: Filter) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .store
            .query(EntityKind::Task, &filter)
            .await?
            .into_iter()
            .filter_map(|record| match record {
                Record::Task(task) => Some(task),
                _ => None,
            })
            .collect())
    }
}

fn mismatch(expected: EntityKind, found: &Record) -> StoreError {
    StoreError::KindMismatch {
        expected,
        found: found.kind(),
    }
}
