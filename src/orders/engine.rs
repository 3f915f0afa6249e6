use chrono::Utc;
use tracing::{info, warn, Instrument};

use super::lifecycle::OrderEvent;
use crate::entities::{
    EntityId, EntityKind, EntityRef, FacilityStatus, OperatorContext, Order, OrderStatus, Task,
    TaskStatus, TaskType, Technician,
};
use crate::errors::{ValidationError, WorkflowError};
use crate::report::{Step, Workflow, WorkflowReport};
use crate::rollup::CompletionRollup;
use crate::store::{Patch, Repository};
use crate::tasks::{InvoiceSettings, NewTask, TaskLedger};
use crate::telemetry::create_workflow_span;

/// How the operator answered "is this order already invoiced?"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invoicing {
    /// Billed by an outside process; no invoice task is filed
    AlreadyInvoiced,
    /// An invoice task is filed for the chosen technician, who must be given
    NotYetInvoiced { technician: Option<Technician> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub order: EntityId,
    pub invoicing: Invoicing,
}

impl CompletionRequest {
    pub fn already_invoiced(order: impl Into<EntityId>) -> Self {
        Self {
            order: order.into(),
            invoicing: Invoicing::AlreadyInvoiced,
        }
    }

    pub fn invoice_to(order: impl Into<EntityId>, technician: Technician) -> Self {
        Self {
            order: order.into(),
            invoicing: Invoicing::NotYetInvoiced {
                technician: Some(technician),
            },
        }
    }
}

/// Order status progression and the invoice handoff
#[derive(Clone)]
pub struct OrderLifecycleEngine {
    repo: Repository,
    tasks: TaskLedger,
    rollup: CompletionRollup,
    invoice: InvoiceSettings,
}

impl OrderLifecycleEngine {
    pub fn new(repo: Repository, invoice: InvoiceSettings) -> Self {
        Self {
            tasks: TaskLedger::new(repo.clone()),
            rollup: CompletionRollup::new(repo.clone()),
            repo,
            invoice,
        }
    }

    /// Direct status edit. Never reaches Invoiced and never leaves it.
    pub async fn edit_status(
        &self,
        ctx: &OperatorContext,
        order_id: &EntityId,
        status: OrderStatus,
    ) -> Result<Order, WorkflowError> {
        let target = EntityRef::order(order_id);
        let span = create_workflow_span("edit_order_status", &target, ctx);

        async move {
            let mut order = self.load_order(order_id).await?;
            let next = order.status.apply(OrderEvent::Edit(status), order_id)?;
            if next == order.status {
                return Ok(order);
            }

            self.repo
                .write(EntityKind::Order, order_id, &Patch::order_status(next, order.revision))
                .await
                .map_err(|e| WorkflowError::store(Step::EditOrderStatus, target.clone(), e))?;

            info!(order.id = %order_id, from = %order.status, to = %next, "Order status edited");
            order.status = next;
            order.revision += 1;
            Ok(order)
        }
        .instrument(span)
        .await
    }

    /// Close an order, filing the invoice task when the operator says it is not yet billed.
    ///
    /// All validation happens before the first write. The status write comes
    /// first; if anything after it fails the status is kept and the failure
    /// is returned as `PartialCompletion` with the full report. Calling it
    /// again on the Completed order retries the remaining steps.
    pub async fn complete_order(
        &self,
        ctx: &OperatorContext,
        request: CompletionRequest,
    ) -> Result<WorkflowReport, WorkflowError> {
        let order_ref = EntityRef::order(&request.order);
        let span = create_workflow_span("complete_order", &order_ref, ctx);

        async move {
            let order = self.load_order(&request.order).await?;
            let next = order.status.apply(OrderEvent::Close, &order.id)?;

            let technician = match request.invoicing {
                Invoicing::AlreadyInvoiced => None,
                Invoicing::NotYetInvoiced { technician: Some(t) } => Some(t),
                Invoicing::NotYetInvoiced { technician: None } => {
                    return Err(ValidationError::MissingTechnician { order: order.id.clone() }.into());
                }
            };

            let mut report = WorkflowReport::new(Workflow::OrderCompletion, order_ref.clone(), ctx);

            // Revision guard: a concurrent close bumps the revision and this write is refused
            self.repo
                .write(EntityKind::Order, &order.id, &Patch::order_status(next, order.revision))
                .await
                .map_err(|e| WorkflowError::store(Step::CloseOrder, order_ref.clone(), e))?;
            report.applied(Step::CloseOrder, order_ref.clone());
            if order.status == OrderStatus::Completed {
                info!(order.id = %order.id, "Completion retried on a completed order");
            } else {
                info!(order.id = %order.id, from = %order.status, "Order completed");
            }

            match technician {
                Some(technician) => {
                    let task = NewTask::invoice_for(&order, technician, &self.invoice, Utc::now());
                    match self.tasks.create(ctx, task).await {
                        Ok(task_id) => report.applied(Step::CreateInvoiceTask, EntityRef::task(&task_id)),
                        Err(e) => {
                            warn!(order.id = %order.id, error = %e, "Invoice task could not be created");
                            report.failed(Step::CreateInvoiceTask, order_ref.clone(), &e);
                        }
                    }
                }
                None => report.skipped(
                    Step::CreateInvoiceTask,
                    order_ref.clone(),
                    "order is invoiced outside this system",
                ),
            }

            self.mark_facility_categories(ctx, &order, &mut report).await;

            if report.has_failures() {
                Err(WorkflowError::PartialCompletion(Box::new(report)))
            } else {
                Ok(report)
            }
        }
        .instrument(span)
        .await
    }

    /// Change a task's status. An invoice task reaching Done settles its order.
    pub async fn set_task_status(
        &self,
        ctx: &OperatorContext,
        task_id: &EntityId,
        status: TaskStatus,
    ) -> Result<WorkflowReport, WorkflowError> {
        let task_ref = EntityRef::task(task_id);
        let span = create_workflow_span("set_task_status", &task_ref, ctx);

        async move {
            let task = self
                .repo
                .task(task_id)
                .await
                .map_err(|e| WorkflowError::read(task_ref.clone(), e))?;

            let mut report = WorkflowReport::new(Workflow::TaskStatusChange, task_ref.clone(), ctx);

            if task.status != status {
                self.repo
                    .write(EntityKind::Task, task_id, &Patch::task_status(status))
                    .await
                    .map_err(|e| WorkflowError::store(Step::SetTaskStatus, task_ref.clone(), e))?;
                report.applied(Step::SetTaskStatus, task_ref.clone());
                info!(task.id = %task_id, from = %task.status, to = %status, "Task status set");
            } else {
                report.skipped(Step::SetTaskStatus, task_ref.clone(), "status unchanged");
            }

            if status == TaskStatus::Done {
                self.settle_invoice(&task, &mut report).await;
            }

            if report.has_failures() {
                Err(WorkflowError::PartialCompletion(Box::new(report)))
            } else {
                Ok(report)
            }
        }
        .instrument(span)
        .await
    }

    async fn settle_invoice(&self, task: &Task, report: &mut WorkflowReport) {
        let order_id = match (&task.task_type, &task.order_id) {
            (TaskType::Invoice, Some(order_id)) => order_id,
            _ => return,
        };
        let order_ref = EntityRef::order(order_id);

        let order = match self.repo.order(order_id).await {
            Ok(order) => order,
            Err(e) => {
                report.failed(Step::AdvanceToInvoiced, order_ref, &e);
                return;
            }
        };

        match order.status.apply(OrderEvent::InvoiceSettled, order_id) {
            Ok(_) if order.status == OrderStatus::Invoiced => {
                report.skipped(Step::AdvanceToInvoiced, order_ref, "order is already invoiced");
            }
            Ok(next) => {
                let result = self
                    .repo
                    .write(EntityKind::Order, order_id, &Patch::order_status(next, order.revision))
                    .await;
                if result.is_ok() {
                    info!(order.id = %order_id, task.id = %task.id, "Order invoiced");
                }
                report.record(Step::AdvanceToInvoiced, order_ref, &result);
            }
            Err(refused) => {
                warn!(order.id = %order_id, status = %order.status, "Invoice task done before its order was completed");
                report.skipped(Step::AdvanceToInvoiced, order_ref, refused.to_string());
            }
        }
    }

    /// Mark the categories the order covered as complete on its facility and
    /// close the facility once nothing is left.
    async fn mark_facility_categories(&self, ctx: &OperatorContext, order: &Order, report: &mut WorkflowReport) {
        if order.categories.is_empty() {
            return;
        }
        let facility_ref = EntityRef::facility(&order.facility_id);

        let facility = match self.repo.facility(&order.facility_id).await {
            Ok(facility) => facility,
            Err(e) => {
                report.failed(Step::SetCategoryFlag, facility_ref, &e);
                return;
            }
        };

        let mut summary = facility.completion_summary();
        let mut flagged = false;
        for category in &order.categories {
            match facility.completion_flag(*category) {
                None => {
                    report.skipped(
                        Step::SetCategoryFlag,
                        facility_ref.clone(),
                        format!("facility does not subscribe to '{category}'"),
                    );
                }
                Some(true) => {
                    report.skipped(
                        Step::SetCategoryFlag,
                        facility_ref.clone(),
                        format!("'{category}' already complete"),
                    );
                }
                Some(false) => {
                    match self
                        .rollup
                        .set_category_complete(ctx, &order.facility_id, *category, true)
                        .await
                    {
                        Ok(updated) => {
                            summary = updated;
                            flagged = true;
                            report.applied(Step::SetCategoryFlag, facility_ref.clone());
                        }
                        Err(e) => report.failed(Step::SetCategoryFlag, facility_ref.clone(), &e),
                    }
                }
            }
        }

        // A status the operator chose stays unless this order completed the last category
        if flagged && summary.is_complete() && facility.operator_status != FacilityStatus::Completed {
            let result = self
                .repo
                .write(
                    EntityKind::Facility,
                    &order.facility_id,
                    &Patch::facility_status(FacilityStatus::Completed),
                )
                .await;
            if result.is_ok() {
                info!(facility.id = %order.facility_id, order.id = %order.id, "All categories complete, facility completed");
            }
            report.record(Step::SetFacilityStatus, facility_ref, &result);
        }
    }

    async fn load_order(&self, order_id: &EntityId) -> Result<Order, WorkflowError> {
        self.repo
            .order(order_id)
            .await
            .map_err(|e| WorkflowError::read(EntityRef::order(order_id), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MockEntityStore, Record};
    use mockall::predicate::eq;
    use mockall::Sequence;
    use std::sync::Arc;

    fn pending_order() -> Order {
        Order::new("c-1".into(), "f-1".into(), "Annual alarm inspection").with_id("o-1")
    }

    #[tokio::test]
    async fn test_status_write_precedes_task_insert() {
        let mut store = MockEntityStore::new();
        let mut seq = Sequence::new();

        store
            .expect_read()
            .with(eq(EntityKind::Order), eq(EntityId::new("o-1")))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(Record::Order(pending_order())));
        store
            .expect_write()
            .withf(|kind, id, patch| {
                *kind == EntityKind::Order
                    && id.as_str() == "o-1"
                    && *patch == Patch::order_status(OrderStatus::Completed, 0)
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        store
            .expect_insert()
            .withf(|record| matches!(record, Record::Task(t) if t.task_type == TaskType::Invoice))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|record| Ok(record.id().clone()));

        let engine = OrderLifecycleEngine::new(Repository::new(Arc::new(store)), InvoiceSettings::default());
        let report = engine
            .complete_order(
                &OperatorContext::new("kari"),
                CompletionRequest::invoice_to("o-1", Technician::new("Ola")),
            )
            .await
            .unwrap();

        assert_eq!(report.successes().count(), 2);
    }

    #[tokio::test]
    async fn test_missing_technician_writes_nothing() {
        let mut store = MockEntityStore::new();
        store
            .expect_read()
            .returning(|_, _| Ok(Record::Order(pending_order())));
        store.expect_write().never();
        store.expect_insert().never();

        let engine = OrderLifecycleEngine::new(Repository::new(Arc::new(store)), InvoiceSettings::default());
        let err = engine
            .complete_order(
                &OperatorContext::new("kari"),
                CompletionRequest {
                    order: "o-1".into(),
                    invoicing: Invoicing::NotYetInvoiced { technician: None },
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err.validation(),
            Some(ValidationError::MissingTechnician { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_status_write_skips_task() {
        let mut store = MockEntityStore::new();
        store
            .expect_read()
            .returning(|_, _| Ok(Record::Order(pending_order())));
        store.expect_write().times(1).returning(|_, id, _| {
            Err(crate::store::StoreError::RevisionConflict {
                id: id.clone(),
                expected: 0,
                found: 1,
            })
        });
        store.expect_insert().never();

        let engine = OrderLifecycleEngine::new(Repository::new(Arc::new(store)), InvoiceSettings::default());
        let err = engine
            .complete_order(
                &OperatorContext::new("kari"),
                CompletionRequest::invoice_to("o-1", Technician::new("Ola")),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WorkflowError::Store { operation: Step::CloseOrder, .. }
        ));
    }
}
