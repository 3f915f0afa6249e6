use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque record identifier, shared by all four tables
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The four record types of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Customer,
    Facility,
    Order,
    Task,
}

impl EntityKind {
    pub fn table_name(self) -> &'static str {
        match self {
            EntityKind::Customer => "customers",
            EntityKind::Facility => "facilities",
            EntityKind::Order => "orders",
            EntityKind::Task => "tasks",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Customer => "customer",
            EntityKind::Facility => "facility",
            EntityKind::Order => "order",
            EntityKind::Task => "task",
        };
        f.write_str(label)
    }
}

/// A typed pointer to one record, used in reports and errors
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: EntityId,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: &EntityId) -> Self {
        Self {
            kind,
            id: id.clone(),
        }
    }

    pub fn customer(id: &EntityId) -> Self {
        Self::new(EntityKind::Customer, id)
    }

    pub fn facility(id: &EntityId) -> Self {
        Self::new(EntityKind::Facility, id)
    }

    pub fn order(id: &EntityId) -> Self {
        Self::new(EntityKind::Order, id)
    }

    pub fn task(id: &EntityId) -> Self {
        Self::new(EntityKind::Task, id)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = EntityId::generate();
        let b = EntityId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_entity_ref_display() {
        let id = EntityId::new("o-17");
        assert_eq!(EntityRef::order(&id).to_string(), "order o-17");
        assert_eq!(EntityKind::Facility.table_name(), "facilities");
    }

    #[test]
    fn test_entity_id_serializes_as_plain_string() {
        let id = EntityId::new("c-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"c-1\"");
    }
}
