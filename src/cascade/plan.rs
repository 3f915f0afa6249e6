use serde::{Deserialize, Serialize};

use crate::entities::EntityId;
use crate::errors::ValidationError;

/// What happens to the facilities of a deactivated customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FacilityDisposition {
    /// Hidden together with the customer, reference kept
    KeepLinked,
    /// Customer reference cleared, facility stays visible
    Unlink,
    /// Repointed to another customer, which must be chosen before finalizing
    MoveTo(Option<EntityId>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderDisposition {
    #[default]
    LeaveUnchanged,
    ForceComplete,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskDisposition {
    #[default]
    LeaveUnchanged,
    ForceComplete,
}

/// Operator choices collected before any write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivationPlan {
    pub facilities: FacilityDisposition,
    pub orders: OrderDisposition,
    pub tasks: TaskDisposition,
}

impl DeactivationPlan {
    pub fn new(facilities: FacilityDisposition) -> Self {
        Self {
            facilities,
            orders: OrderDisposition::default(),
            tasks: TaskDisposition::default(),
        }
    }

    pub fn force_complete_orders(mut self) -> Self {
        self.orders = OrderDisposition::ForceComplete;
        self
    }

    pub fn force_complete_tasks(mut self) -> Self {
        self.tasks = TaskDisposition::ForceComplete;
        self
    }

    /// Checks that need no store access. Returns the move destination, if any.
    pub fn validate(&self, customer: &EntityId) -> Result<Option<&EntityId>, ValidationError> {
        match &self.facilities {
            FacilityDisposition::MoveTo(None) => Err(ValidationError::MissingMoveDestination {
                customer: customer.clone(),
            }),
            FacilityDisposition::MoveTo(Some(destination)) if destination == customer => {
                Err(ValidationError::MoveToSelf {
                    customer: customer.clone(),
                })
            }
            FacilityDisposition::MoveTo(Some(destination)) => Ok(Some(destination)),
            FacilityDisposition::KeepLinked | FacilityDisposition::Unlink => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_requires_destination() {
        let plan = DeactivationPlan::new(FacilityDisposition::MoveTo(None));
        assert!(matches!(
            plan.validate(&"c-1".into()),
            Err(ValidationError::MissingMoveDestination { .. })
        ));
    }

    #[test]
    fn test_move_to_self_is_refused() {
        let plan = DeactivationPlan::new(FacilityDisposition::MoveTo(Some("c-1".into())));
        assert!(matches!(
            plan.validate(&"c-1".into()),
            Err(ValidationError::MoveToSelf { .. })
        ));
    }

    #[test]
    fn test_defaults_leave_orders_and_tasks() {
        let plan = DeactivationPlan::new(FacilityDisposition::Unlink);
        assert_eq!(plan.orders, OrderDisposition::LeaveUnchanged);
        assert_eq!(plan.tasks, TaskDisposition::LeaveUnchanged);
        assert_eq!(plan.validate(&"c-1".into()), Ok(None));
    }
}
