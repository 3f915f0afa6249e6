//! Customer deactivation cascade and the facility reassignment guard
//!
//! Both share [`CustomerDependents::is_empty`], the "customer has no remaining
//! dependents" predicate.

pub mod deactivation;
pub mod dependents;
pub mod plan;
pub mod reassign;

pub use deactivation::CustomerDeactivation;
pub use dependents::{CustomerDependents, DependentCounts};
pub use plan::{DeactivationPlan, FacilityDisposition, OrderDisposition, TaskDisposition};
pub use reassign::{FacilityReassignment, ReassignmentOutcome};
