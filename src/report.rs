//! Per-step outcome aggregation for multi-write workflows
//!
//! Workflows that write more than one record never roll back. Instead every
//! write is recorded here with its target and result so the operator can see
//! exactly which step failed and finish it by hand or retry.

use serde::Serialize;
use std::fmt;

use crate::entities::{EntityRef, OperatorContext};
use crate::store::StoreError;

/// The workflow a report belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Workflow {
    OrderCompletion,
    TaskStatusChange,
    CustomerDeactivation,
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Workflow::OrderCompletion => "order completion",
            Workflow::TaskStatusChange => "task status change",
            Workflow::CustomerDeactivation => "customer deactivation",
        };
        f.write_str(label)
    }
}

/// A single write a workflow attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    CloseOrder,
    EditOrderStatus,
    CreateInvoiceTask,
    SetCategoryFlag,
    SetSubscriptions,
    SetFacilityStatus,
    SetTaskStatus,
    AdvanceToInvoiced,
    HideFacility,
    UnlinkFacility,
    MoveFacility,
    ForceCompleteOrder,
    ForceCompleteTask,
    HideCustomer,
    ReassignFacility,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Step::CloseOrder => "set order status to completed",
            Step::EditOrderStatus => "edit order status",
            Step::CreateInvoiceTask => "create invoice task",
            Step::SetCategoryFlag => "set control category flag",
            Step::SetSubscriptions => "change subscribed categories",
            Step::SetFacilityStatus => "set facility status",
            Step::SetTaskStatus => "set task status",
            Step::AdvanceToInvoiced => "advance order to invoiced",
            Step::HideFacility => "hide facility with customer",
            Step::UnlinkFacility => "unlink facility from customer",
            Step::MoveFacility => "move facility to another customer",
            Step::ForceCompleteOrder => "force-complete order",
            Step::ForceCompleteTask => "force-complete task",
            Step::HideCustomer => "hide customer",
            Step::ReassignFacility => "change facility owner",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "outcome")]
pub enum StepResult {
    Applied,
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step: Step,
    pub target: EntityRef,
    pub result: StepResult,
}

impl StepRecord {
    pub fn is_failure(&self) -> bool {
        matches!(self.result, StepResult::Failed { .. })
    }

    pub fn is_applied(&self) -> bool {
        matches!(self.result, StepResult::Applied)
    }
}

/// Ordered list of every step a workflow attempted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowReport {
    pub workflow: Workflow,
    pub subject: EntityRef,
    pub operator: String,
    pub correlation_id: String,
    pub steps: Vec<StepRecord>,
}

impl WorkflowReport {
    pub fn new(workflow: Workflow, subject: EntityRef, ctx: &OperatorContext) -> Self {
        Self {
            workflow,
            subject,
            operator: ctx.operator.clone(),
            correlation_id: ctx.correlation_id.clone(),
            steps: Vec::new(),
        }
    }

    /// Record the outcome of a store call, passing the error back for logging
    pub fn record(&mut self, step: Step, target: EntityRef, result: &Result<(), StoreError>) {
        let result = match result {
            Ok(()) => StepResult::Applied,
            Err(e) => StepResult::Failed {
                error: e.to_string(),
            },
        };
        self.steps.push(StepRecord {
            step,
            target,
            result,
        });
    }

    pub fn applied(&mut self, step: Step, target: EntityRef) {
        self.record(step, target, &Ok(()));
    }

    pub fn failed(&mut self, step: Step, target: EntityRef, error: impl fmt::Display) {
        self.steps.push(StepRecord {
            step,
            target,
            result: StepResult::Failed {
                error: error.to_string(),
            },
        });
    }

    pub fn skipped(&mut self, step: Step, target: EntityRef, reason: impl Into<String>) {
        self.steps.push(StepRecord {
            step,
            target,
            result: StepResult::Skipped {
                reason: reason.into(),
            },
        });
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(|s| s.is_failure())
    }

    pub fn successes(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(|s| s.is_applied())
    }

    pub fn has_failures(&self) -> bool {
        self.steps.iter().any(|s| s.is_failure())
    }

    /// Steps of one kind, in attempt order
    pub fn steps_of(&self, step: Step) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(move |s| s.step == step)
    }
}

impl fmt::Display for WorkflowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self.failures().count();
        writeln!(
            f,
            "{} of {} by {} ({} step(s), {} failed)",
            self.workflow,
            self.subject,
            self.operator,
            self.steps.len(),
            failed
        )?;
        for record in &self.steps {
            match &record.result {
                StepResult::Applied => writeln!(f, "   ✅ {} [{}]", record.step, record.target)?,
                StepResult::Skipped { reason } => {
                    writeln!(f, "   ⏭️  {} [{}]: {}", record.step, record.target, reason)?
                }
                StepResult::Failed { error } => {
                    writeln!(f, "   ❌ {} [{}]: {}", record.step, record.target, error)?
                }
            }
        }
        write!(f, "   correlation id: {}", self.correlation_id)
    }
}
