use serde::Serialize;
use tracing::{info, Instrument};

use super::dependents::CustomerDependents;
use crate::entities::{EntityId, EntityKind, EntityRef, OperatorContext};
use crate::errors::{ValidationError, WorkflowError};
use crate::report::Step;
use crate::store::{Patch, Repository};
use crate::telemetry::create_workflow_span;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReassignmentOutcome {
    pub previous_customer: Option<EntityId>,
    /// Set when the previous customer was left without dependents; removal is offered, not done
    pub orphaned_customer: Option<EntityId>,
}

/// Facility owner edits and the orphan check that follows them
#[derive(Clone)]
pub struct FacilityReassignment {
    repo: Repository,
}

impl FacilityReassignment {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Point a facility at another customer, or at none
    pub async fn reassign(
        &self,
        ctx: &OperatorContext,
        facility_id: &EntityId,
        new_customer: Option<EntityId>,
    ) -> Result<ReassignmentOutcome, WorkflowError> {
        let target = EntityRef::facility(facility_id);
        let span = create_workflow_span("reassign_facility", &target, ctx);

        async move {
            let facility = self
                .repo
                .facility(facility_id)
                .await
                .map_err(|e| WorkflowError::read(target.clone(), e))?;

            if let Some(customer_id) = &new_customer {
                match self.repo.customer(customer_id).await {
                    Ok(customer) if customer.is_visible() => {}
                    Ok(_) => {
                        return Err(ValidationError::DestinationUnavailable {
                            destination: customer_id.clone(),
                            reason: "customer is hidden".to_string(),
                        }
                        .into())
                    }
                    Err(e) if e.is_not_found() => {
                        return Err(ValidationError::DestinationUnavailable {
                            destination: customer_id.clone(),
                            reason: "customer does not exist".to_string(),
                        }
                        .into())
                    }
                    Err(e) => return Err(WorkflowError::read(EntityRef::customer(customer_id), e)),
                }
            }

            let previous = facility.customer_id.clone();
            if previous == new_customer {
                return Ok(ReassignmentOutcome {
                    previous_customer: previous,
                    orphaned_customer: None,
                });
            }

            self.repo
                .write(EntityKind::Facility, facility_id, &Patch::facility_owner(new_customer.clone()))
                .await
                .map_err(|e| WorkflowError::store(Step::ReassignFacility, target.clone(), e))?;
            info!(
                facility.id = %facility_id,
                from = ?previous.as_ref().map(|c| c.as_str()),
                to = ?new_customer.as_ref().map(|c| c.as_str()),
                "Facility owner changed"
            );

            let orphaned_customer = match &previous {
                Some(previous_id) => self.orphan_candidate(previous_id).await?,
                None => None,
            };

            Ok(ReassignmentOutcome {
                previous_customer: previous,
                orphaned_customer,
            })
        }
        .instrument(span)
        .await
    }

    /// Hide a customer left without dependents. Refused when anything references it again.
    pub async fn remove_orphaned_customer(
        &self,
        ctx: &OperatorContext,
        customer_id: &EntityId,
    ) -> Result<(), WorkflowError> {
        let target = EntityRef::customer(customer_id);
        let span = create_workflow_span("remove_orphaned_customer", &target, ctx);

        async move {
            let dependents = CustomerDependents::load(&self.repo, customer_id)
                .await
                .map_err(|e| WorkflowError::read(target.clone(), e))?;
            if !dependents.is_empty() {
                let counts = dependents.counts();
                return Err(ValidationError::CustomerHasDependents {
                    customer: customer_id.clone(),
                    facilities: counts.facilities,
                    orders: counts.active_orders,
                    tasks: counts.active_tasks,
                }
                .into());
            }

            self.repo
                .write(EntityKind::Customer, customer_id, &Patch::hide_customer())
                .await
                .map_err(|e| WorkflowError::store(Step::HideCustomer, target.clone(), e))?;
            info!(customer.id = %customer_id, "Orphaned customer removed");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// The previous owner if it is visible and has nothing left
    async fn orphan_candidate(&self, customer_id: &EntityId) -> Result<Option<EntityId>, WorkflowError> {
        let customer_ref = EntityRef::customer(customer_id);
        let customer = match self.repo.customer(customer_id).await {
            Ok(customer) => customer,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(WorkflowError::read(customer_ref, e)),
        };
        if !customer.is_visible() {
            return Ok(None);
        }

        let dependents = CustomerDependents::load(&self.repo, customer_id)
            .await
            .map_err(|e| WorkflowError::read(customer_ref, e))?;
        Ok(dependents.is_empty().then(|| customer_id.clone()))
    }
}
