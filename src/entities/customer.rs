use serde::{Deserialize, Serialize};

use super::EntityId;

/// The billable entity facilities and orders belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: EntityId,
    pub name: String,
    /// Hidden customers are soft-deleted: left out of listings, still addressable by id
    #[serde(default)]
    pub hidden: bool,
}

impl Customer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::generate(),
            name: name.into(),
            hidden: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn is_visible(&self) -> bool {
        !self.hidden
    }
}
