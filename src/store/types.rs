// Record, patch and filter types shared by every store backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::errors::StoreError;
use crate::entities::{
    ControlCategory, Customer, EntityId, EntityKind, Facility, FacilityStatus, Order,
    OrderStatus, Task, TaskStatus, TaskType, Technician,
};

/// One row of any of the four tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Customer(Customer),
    Facility(Facility),
    Order(Order),
    Task(Task),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::Customer(_) => EntityKind::Customer,
            Record::Facility(_) => EntityKind::Facility,
            Record::Order(_) => EntityKind::Order,
            Record::Task(_) => EntityKind::Task,
        }
    }

    pub fn id(&self) -> &EntityId {
        match self {
            Record::Customer(c) => &c.id,
            Record::Facility(f) => &f.id,
            Record::Order(o) => &o.id,
            Record::Task(t) => &t.id,
        }
    }

    /// Value of a filterable field; `None` when the record has no such field
    pub fn field(&self, field: Field) -> Option<FieldValue> {
        match (self, field) {
            (Record::Customer(c), Field::Hidden) => Some(FieldValue::Bool(c.hidden)),
            (Record::Facility(f), Field::CustomerId) => Some(FieldValue::from(f.customer_id.clone())),
            (Record::Facility(f), Field::Hidden) => Some(FieldValue::Bool(f.hidden)),
            (Record::Order(o), Field::CustomerId) => Some(FieldValue::Id(o.customer_id.clone())),
            (Record::Order(o), Field::FacilityId) => Some(FieldValue::Id(o.facility_id.clone())),
            (Record::Order(o), Field::Status) => Some(FieldValue::OrderStatus(o.status)),
            (Record::Task(t), Field::CustomerId) => Some(FieldValue::from(t.customer_id.clone())),
            (Record::Task(t), Field::FacilityId) => Some(FieldValue::from(t.facility_id.clone())),
            (Record::Task(t), Field::OrderId) => Some(FieldValue::from(t.order_id.clone())),
            (Record::Task(t), Field::Status) => Some(FieldValue::TaskStatus(t.status)),
            (Record::Task(t), Field::TaskType) => Some(FieldValue::TaskType(t.task_type)),
            _ => None,
        }
    }

    /// Apply a patch in place. Shared by all backends so revision handling is identical.
    pub fn apply(&mut self, patch: &Patch, now: DateTime<Utc>) -> Result<(), StoreError> {
        match (self, patch) {
            (Record::Customer(customer), Patch::Customer(p)) => {
                if let Some(name) = &p.name {
                    customer.name = name.clone();
                }
                if let Some(hidden) = p.hidden {
                    customer.hidden = hidden;
                }
                Ok(())
            }
            (Record::Facility(facility), Patch::Facility(p)) => {
                if let Some(customer_id) = &p.customer_id {
                    facility.customer_id = customer_id.clone();
                }
                if let Some(categories) = &p.categories {
                    facility.categories = categories.clone();
                }
                if let Some(completion) = &p.completion {
                    facility.completion = completion.clone();
                }
                for (category, done) in &p.set_flags {
                    facility.completion.insert(*category, *done);
                }
                if let Some(status) = p.operator_status {
                    facility.operator_status = status;
                }
                if let Some(hidden) = p.hidden {
                    facility.hidden = hidden;
                }
                Ok(())
            }
            (Record::Order(order), Patch::Order(p)) => {
                if let Some(expected) = p.expected_revision {
                    if order.revision != expected {
                        return Err(StoreError::RevisionConflict {
                            id: order.id.clone(),
                            expected,
                            found: order.revision,
                        });
                    }
                }
                if let Some(status) = p.status {
                    order.status = status;
                }
                if let Some(technician) = &p.technician {
                    order.technician = technician.clone();
                }
                order.revision += 1;
                order.updated_at = now;
                Ok(())
            }
            (Record::Task(task), Patch::Task(p)) => {
                if let Some(status) = p.status {
                    task.status = status;
                }
                if let Some(assignee) = &p.assignee {
                    task.assignee = assignee.clone();
                }
                if let Some(customer_id) = &p.customer_id {
                    task.customer_id = customer_id.clone();
                }
                Ok(())
            }
            (record, patch) => Err(StoreError::KindMismatch {
                expected: record.kind(),
                found: patch.kind(),
            }),
        }
    }
}

/// Partial update of a customer row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub hidden: Option<bool>,
}

/// Partial update of a facility row.
///
/// `customer_id: Some(None)` clears the owner reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityPatch {
    pub customer_id: Option<Option<EntityId>>,
    pub categories: Option<BTreeSet<ControlCategory>>,
    /// Replaces the whole flag map
    pub completion: Option<BTreeMap<ControlCategory, bool>>,
    /// Individual flag writes, applied after `completion`
    pub set_flags: BTreeMap<ControlCategory, bool>,
    pub operator_status: Option<FacilityStatus>,
    pub hidden: Option<bool>,
}

/// Partial update of an order row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub technician: Option<Option<Technician>>,
    /// Reject the write unless the stored revision equals this value
    pub expected_revision: Option<u64>,
}

/// Partial update of a task row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub assignee: Option<Option<Technician>>,
    pub customer_id: Option<Option<EntityId>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Patch {
    Customer(CustomerPatch),
    Facility(FacilityPatch),
    Order(OrderPatch),
    Task(TaskPatch),
}

impl Patch {
    pub fn kind(&self) -> EntityKind {
        match self {
            Patch::Customer(_) => EntityKind::Customer,
            Patch::Facility(_) => EntityKind::Facility,
            Patch::Order(_) => EntityKind::Order,
            Patch::Task(_) => EntityKind::Task,
        }
    }

    pub fn hide_customer() -> Self {
        Patch::Customer(CustomerPatch {
            hidden: Some(true),
            ..Default::default()
        })
    }

    pub fn facility_owner(customer_id: Option<EntityId>) -> Self {
        Patch::Facility(FacilityPatch {
            customer_id: Some(customer_id),
            ..Default::default()
        })
    }

    pub fn facility_flag(category: ControlCategory, complete: bool) -> Self {
        Patch::Facility(FacilityPatch {
            set_flags: BTreeMap::from([(category, complete)]),
            ..Default::default()
        })
    }

    pub fn facility_status(status: FacilityStatus) -> Self {
        Patch::Facility(FacilityPatch {
            operator_status: Some(status),
            ..Default::default()
        })
    }

    pub fn hide_facility() -> Self {
        Patch::Facility(FacilityPatch {
            hidden: Some(true),
            ..Default::default()
        })
    }

    /// Status write guarded by the revision the caller read
    pub fn order_status(status: OrderStatus, expected_revision: u64) -> Self {
        Patch::Order(OrderPatch {
            status: Some(status),
            expected_revision: Some(expected_revision),
            ..Default::default()
        })
    }

    pub fn task_status(status: TaskStatus) -> Self {
        Patch::Task(TaskPatch {
            status: Some(status),
            ..Default::default()
        })
    }
}

/// Fields that can appear in a filter predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    CustomerId,
    FacilityId,
    OrderId,
    Status,
    TaskType,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    Id(EntityId),
    Null,
    Bool(bool),
    OrderStatus(OrderStatus),
    TaskStatus(TaskStatus),
    TaskType(TaskType),
}

impl From<Option<EntityId>> for FieldValue {
    fn from(value: Option<EntityId>) -> Self {
        value.map(FieldValue::Id).unwrap_or(FieldValue::Null)
    }
}

impl From<&EntityId> for FieldValue {
    fn from(value: &EntityId) -> Self {
        FieldValue::Id(value.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub field: Field,
    pub op: Comparison,
    pub value: FieldValue,
}

impl Predicate {
    /// A record without the field never matches
    pub fn matches(&self, record: &Record) -> bool {
        match record.field(self.field) {
            Some(actual) => match self.op {
                Comparison::Eq => actual == self.value,
                Comparison::Ne => actual != self.value,
            },
            None => false,
        }
    }
}

/// Conjunction of predicates; the empty filter matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub predicates: Vec<Predicate>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: Field, value: impl Into<FieldValue>) -> Self {
        self.predicates.push(Predicate {
            field,
            op: Comparison::Eq,
            value: value.into(),
        });
        self
    }

    pub fn where_ne(mut self, field: Field, value: impl Into<FieldValue>) -> Self {
        self.predicates.push(Predicate {
            field,
            op: Comparison::Ne,
            value: value.into(),
        });
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }

    /// Equality constraint on a field, if the filter has one
    pub fn equality_on(&self, field: Field) -> Option<&FieldValue> {
        self.predicates
            .iter()
            .find(|p| p.field == field && p.op == Comparison::Eq)
            .map(|p| &p.value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<OrderStatus> for FieldValue {
    fn from(value: OrderStatus) -> Self {
        FieldValue::OrderStatus(value)
    }
}

impl From<TaskStatus> for FieldValue {
    fn from(value: TaskStatus) -> Self {
        FieldValue::TaskStatus(value)
    }
}

impl From<TaskType> for FieldValue {
    fn from(value: TaskType) -> Self {
        FieldValue::TaskType(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ControlCategory, Customer, Facility, Order};

    #[test]
    fn test_filter_eq_and_ne() {
        let order = Record::Order(
            Order::new("c-1".into(), "f-1".into(), "Service").with_status(OrderStatus::Completed),
        );

        let by_customer = Filter::all().where_eq(Field::CustomerId, &EntityId::new("c-1"));
        assert!(by_customer.matches(&order));

        let active = Filter::all()
            .where_ne(Field::Status, OrderStatus::Completed)
            .where_ne(Field::Status, OrderStatus::Invoiced);
        assert!(!active.matches(&order));
    }

    #[test]
    fn test_predicate_on_missing_field_never_matches() {
        let customer = Record::Customer(Customer::new("Nordbygg AS"));
        let filter = Filter::all().where_ne(Field::Status, OrderStatus::Pending);
        assert!(!filter.matches(&customer));
    }

    #[test]
    fn test_unlinked_facility_matches_null() {
        let facility = Record::Facility(Facility::new("Kjeller", None, [ControlCategory::Alarm]));
        assert!(Filter::all()
            .where_eq(Field::CustomerId, FieldValue::Null)
            .matches(&facility));
    }

    #[test]
    fn test_order_patch_bumps_revision_and_checks_expected() {
        let mut record = Record::Order(Order::new("c-1".into(), "f-1".into(), "Service"));
        let now = Utc::now();

        record
            .apply(&Patch::order_status(OrderStatus::InProgress, 0), now)
            .unwrap();
        let Record::Order(order) = &record else { unreachable!() };
        assert_eq!(order.revision, 1);
        assert_eq!(order.status, OrderStatus::InProgress);

        let stale = record.apply(&Patch::order_status(OrderStatus::Completed, 0), now);
        assert!(matches!(
            stale,
            Err(StoreError::RevisionConflict { expected: 0, found: 1, .. })
        ));
    }

    #[test]
    fn test_patch_kind_mismatch_is_rejected() {
        let mut record = Record::Customer(Customer::new("Lia"));
        let result = record.apply(&Patch::task_status(TaskStatus::Done), Utc::now());
        assert!(matches!(
            result,
            Err(StoreError::KindMismatch {
                expected: EntityKind::Customer,
                found: EntityKind::Task
            })
        ));
    }

    #[test]
    fn test_facility_owner_patch_can_clear_reference() {
        let mut record = Record::Facility(Facility::new(
            "Kjeller",
            Some("c-1".into()),
            [ControlCategory::Alarm],
        ));
        record.apply(&Patch::facility_owner(None), Utc::now()).unwrap();
        let Record::Facility(facility) = &record else { unreachable!() };
        assert_eq!(facility.customer_id, None);
    }
}
