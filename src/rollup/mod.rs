//! Facility completion rollup
//!
//! Keeps the per-category "service complete" flags of a facility and the
//! derived "N of M complete" summary. The stored facility status is a
//! separate, operator-settable field: the rollup reports when it contradicts
//! the flags but never overwrites it.

mod summary;

pub use summary::CompletionSummary;

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn, Instrument};

use crate::entities::{
    ControlCategory, EntityId, EntityKind, EntityRef, Facility, FacilityStatus, OperatorContext,
};
use crate::errors::{ValidationError, WorkflowError};
use crate::report::Step;
use crate::store::{FacilityPatch, Patch, Repository};
use crate::telemetry::create_workflow_span;

#[derive(Clone)]
pub struct CompletionRollup {
    repo: Repository,
}

impl CompletionRollup {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Set one category's completion flag and return the recomputed summary.
    ///
    /// Fails with `InvalidCategory` before any write when the facility does not
    /// subscribe to `category`. Setting a flag to the value it already has
    /// issues no write.
    pub async fn set_category_complete(
        &self,
        ctx: &OperatorContext,
        facility_id: &EntityId,
        category: ControlCategory,
        complete: bool,
    ) -> Result<CompletionSummary, WorkflowError> {
        let target = EntityRef::facility(facility_id);
        let span = create_workflow_span("set_category_complete", &target, ctx);

        async move {
            let mut facility = self.load(facility_id).await?;

            let current = facility.completion_flag(category).ok_or_else(|| {
                ValidationError::InvalidCategory {
                    facility: facility_id.clone(),
                    category,
                }
            })?;

            if current == complete {
                debug!(
                    facility.id = %facility_id,
                    category = %category,
                    complete,
                    "Flag already has the requested value, nothing to write"
                );
                return Ok(facility.completion_summary());
            }

            self.repo
                .write(EntityKind::Facility, facility_id, &Patch::facility_flag(category, complete))
                .await
                .map_err(|e| WorkflowError::store(Step::SetCategoryFlag, target.clone(), e))?;

            facility.completion.insert(category, complete);
            let summary = facility.completion_summary();
            info!(
                facility.id = %facility_id,
                category = %category,
                complete,
                completed = summary.completed,
                subscribed = summary.subscribed,
                "Category flag updated"
            );
            warn_on_contradiction(&facility, &summary);
            Ok(summary)
        }
        .instrument(span)
        .await
    }

    pub async fn summary(&self, facility_id: &EntityId) -> Result<CompletionSummary, WorkflowError> {
        Ok(self.load(facility_id).await?.completion_summary())
    }

    /// Free write of the stored status. A status that disagrees with the flags is logged, not refused.
    pub async fn set_operator_status(
        &self,
        ctx: &OperatorContext,
        facility_id: &EntityId,
        status: FacilityStatus,
    ) -> Result<CompletionSummary, WorkflowError> {
        let target = EntityRef::facility(facility_id);
        let span = create_workflow_span("set_facility_status", &target, ctx);

        async move {
            let mut facility = self.load(facility_id).await?;

            self.repo
                .write(EntityKind::Facility, facility_id, &Patch::facility_status(status))
                .await
                .map_err(|e| WorkflowError::store(Step::SetFacilityStatus, target.clone(), e))?;

            facility.operator_status = status;
            let summary = facility.completion_summary();
            info!(facility.id = %facility_id, status = %status, "Facility status set");
            warn_on_contradiction(&facility, &summary);
            Ok(summary)
        }
        .instrument(span)
        .await
    }

    /// Replace the subscribed category set.
    ///
    /// Flags of dropped categories are removed, new categories start
    /// incomplete and retained categories keep their flag.
    pub async fn set_subscriptions(
        &self,
        ctx: &OperatorContext,
        facility_id: &EntityId,
        categories: BTreeSet<ControlCategory>,
    ) -> Result<CompletionSummary, WorkflowError> {
        let target = EntityRef::facility(facility_id);
        let span = create_workflow_span("set_subscriptions", &target, ctx);

        async move {
            let mut facility = self.load(facility_id).await?;

            let completion: BTreeMap<ControlCategory, bool> = categories
                .iter()
                .map(|c| (*c, facility.completion_flag(*c).unwrap_or(false)))
                .collect();

            let patch = Patch::Facility(FacilityPatch {
                categories: Some(categories.clone()),
                completion: Some(completion.clone()),
                ..Default::default()
            });
            self.repo
                .write(EntityKind::Facility, facility_id, &patch)
                .await
                .map_err(|e| WorkflowError::store(Step::SetSubscriptions, target.clone(), e))?;

            facility.categories = categories;
            facility.completion = completion;
            let summary = facility.completion_summary();
            info!(
                facility.id = %facility_id,
                subscribed = summary.subscribed,
                completed = summary.completed,
                "Facility subscriptions updated"
            );
            Ok(summary)
        }
        .instrument(span)
        .await
    }

    async fn load(&self, facility_id: &EntityId) -> Result<Facility, WorkflowError> {
        self.repo
            .facility(facility_id)
            .await
            .map_err(|e| WorkflowError::read(EntityRef::facility(facility_id), e))
    }
}

fn warn_on_contradiction(facility: &Facility, summary: &CompletionSummary) {
    if summary.contradicts(facility.operator_status) {
        warn!(
            facility.id = %facility.id,
            status = %facility.operator_status,
            summary = %summary,
            "Stored facility status contradicts the completion flags"
        );
    }
}
