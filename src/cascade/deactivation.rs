use tracing::{info, warn, Instrument};

use super::dependents::{CustomerDependents, DependentCounts};
use super::plan::{DeactivationPlan, FacilityDisposition, OrderDisposition, TaskDisposition};
use crate::entities::{
    Customer, EntityId, EntityKind, EntityRef, OperatorContext, OrderStatus, TaskStatus,
    TaskType,
};
use crate::errors::{ValidationError, WorkflowError};
use crate::report::{Step, Workflow, WorkflowReport};
use crate::store::{Patch, Repository, StoreError};
use crate::telemetry::create_workflow_span;

/// Soft-removal of a customer with operator-chosen dispositions for its dependents
#[derive(Clone)]
pub struct CustomerDeactivation {
    repo: Repository,
}

impl CustomerDeactivation {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// What a deactivation would touch
    pub async fn preview(&self, customer_id: &EntityId) -> Result<DependentCounts, WorkflowError> {
        self.load_customer(customer_id).await?;
        let dependents = CustomerDependents::load(&self.repo, customer_id)
            .await
            .map_err(|e| WorkflowError::read(EntityRef::customer(customer_id), e))?;
        Ok(dependents.counts())
    }

    /// Customers that may receive the facilities: visible and not the one being deactivated
    pub async fn move_destinations(&self, customer_id: &EntityId) -> Result<Vec<Customer>, WorkflowError> {
        let mut customers: Vec<Customer> = self
            .repo
            .visible_customers()
            .await
            .map_err(|e| WorkflowError::read(EntityRef::customer(customer_id), e))?
            .into_iter()
            .filter(|c| &c.id != customer_id)
            .collect();
        customers.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(customers)
    }

    /// Hide the customer after applying the plan to every dependent.
    ///
    /// Validation runs before any write. After that every step is attempted
    /// even if an earlier one failed, and hiding the customer is always
    /// attempted last. Any failure comes back as `PartialCascadeFailure`.
    pub async fn deactivate(
        &self,
        ctx: &OperatorContext,
        customer_id: &EntityId,
        plan: &DeactivationPlan,
    ) -> Result<WorkflowReport, WorkflowError> {
        let customer_ref = EntityRef::customer(customer_id);
        let span = create_workflow_span("deactivate_customer", &customer_ref, ctx);

        async move {
            self.load_customer(customer_id).await?;
            if let Some(destination) = plan.validate(customer_id)? {
                self.check_destination(destination).await?;
            }

            let dependents = CustomerDependents::load(&self.repo, customer_id)
                .await
                .map_err(|e| WorkflowError::read(customer_ref.clone(), e))?;
            info!(
                customer.id = %customer_id,
                facilities = dependents.facilities.len(),
                active_orders = dependents.active_orders.len(),
                active_tasks = dependents.active_tasks.len(),
                "Deactivating customer"
            );

            let mut report = WorkflowReport::new(Workflow::CustomerDeactivation, customer_ref.clone(), ctx);

            self.apply_facility_disposition(&dependents, &plan.facilities, &mut report)
                .await;

            if plan.orders == OrderDisposition::ForceComplete {
                for order in &dependents.active_orders {
                    let result = self
                        .repo
                        .write(
                            EntityKind::Order,
                            &order.id,
                            &Patch::order_status(OrderStatus::Completed, order.revision),
                        )
                        .await;
                    self.record(&mut report, Step::ForceCompleteOrder, EntityRef::order(&order.id), result);
                }
            }

            if plan.tasks == TaskDisposition::ForceComplete {
                for task in &dependents.active_tasks {
                    let result = self
                        .repo
                        .write(EntityKind::Task, &task.id, &Patch::task_status(TaskStatus::Done))
                        .await;
                    let closed = result.is_ok();
                    self.record(&mut report, Step::ForceCompleteTask, EntityRef::task(&task.id), result);

                    // A force-closed invoice task does not settle its order
                    if let (true, TaskType::Invoice, Some(order_id)) = (closed, task.task_type, &task.order_id) {
                        report.skipped(
                            Step::AdvanceToInvoiced,
                            EntityRef::order(order_id),
                            format!(
                                "invoice task {} closed by deactivation; run `fireops task status {} done` to invoice the order",
                                task.id, task.id
                            ),
                        );
                    }
                }
            }

            let result = self
                .repo
                .write(EntityKind::Customer, customer_id, &Patch::hide_customer())
                .await;
            self.record(&mut report, Step::HideCustomer, customer_ref.clone(), result);

            let failed = report.failures().count();
            if failed > 0 {
                warn!(customer.id = %customer_id, failed, "Customer deactivation partially applied");
                return Err(WorkflowError::PartialCascadeFailure(Box::new(report)));
            }

            info!(customer.id = %customer_id, steps = report.steps.len(), "Customer deactivated");
            Ok(report)
        }
        .instrument(span)
        .await
    }

    async fn apply_facility_disposition(
        &self,
        dependents: &CustomerDependents,
        disposition: &FacilityDisposition,
        report: &mut WorkflowReport,
    ) {
        for facility in &dependents.facilities {
            let target = EntityRef::facility(&facility.id);
            let (step, patch) = match disposition {
                FacilityDisposition::KeepLinked if facility.hidden => {
                    report.skipped(Step::HideFacility, target, "facility already hidden");
                    continue;
                }
                FacilityDisposition::KeepLinked => (Step::HideFacility, Patch::hide_facility()),
                FacilityDisposition::Unlink => (Step::UnlinkFacility, Patch::facility_owner(None)),
                FacilityDisposition::MoveTo(destination) => {
                    (Step::MoveFacility, Patch::facility_owner(destination.clone()))
                }
            };
            let result = self.repo.write(EntityKind::Facility, &facility.id, &patch).await;
            self.record(report, step, target, result);
        }
    }

    fn record(&self, report: &mut WorkflowReport, step: Step, target: EntityRef, result: Result<(), StoreError>) {
        if let Err(e) = &result {
            warn!(target = %target, step = %step, error = %e, "Cascade step failed");
        }
        report.record(step, target, &result);
    }

    async fn check_destination(&self, destination: &EntityId) -> Result<(), WorkflowError> {
        match self.repo.customer(destination).await {
            Ok(customer) if customer.is_visible() => Ok(()),
            Ok(_) => Err(ValidationError::DestinationUnavailable {
                destination: destination.clone(),
                reason: "customer is hidden".to_string(),
            }
            .into()),
            Err(e) if e.is_not_found() => Err(ValidationError::DestinationUnavailable {
                destination: destination.clone(),
                reason: "customer does not exist".to_string(),
            }
            .into()),
            Err(e) => Err(WorkflowError::read(EntityRef::customer(destination), e)),
        }
    }

    async fn load_customer(&self, customer_id: &EntityId) -> Result<Customer, WorkflowError> {
        self.repo
            .customer(customer_id)
            .await
            .map_err(|e| WorkflowError::read(EntityRef::customer(customer_id), e))
    }
}
