use serde::Serialize;
use std::fmt;

use crate::entities::{Facility, FacilityStatus};

/// "N of M categories complete", computed from the flags of subscribed categories only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletionSummary {
    pub completed: usize,
    pub subscribed: usize,
}

impl CompletionSummary {
    pub fn of(facility: &Facility) -> Self {
        let mut completed = 0;
        let mut subscribed = 0;
        for (_, done) in facility.subscribed_flags() {
            subscribed += 1;
            if done {
                completed += 1;
            }
        }
        Self {
            completed,
            subscribed,
        }
    }

    /// Every subscribed category is done. A facility without subscriptions is never complete.
    pub fn is_complete(&self) -> bool {
        self.subscribed > 0 && self.completed == self.subscribed
    }

    pub fn remaining(&self) -> usize {
        self.subscribed - self.completed
    }

    /// Whether an operator-chosen status disagrees with the flags.
    ///
    /// Only the two statuses with an unambiguous meaning are checked; the
    /// planning statuses are free text as far as the flags are concerned.
    pub fn contradicts(&self, status: FacilityStatus) -> bool {
        match status {
            FacilityStatus::Completed => !self.is_complete(),
            FacilityStatus::NotStarted => self.completed > 0,
            FacilityStatus::Planned | FacilityStatus::InProgress | FacilityStatus::Deviations => false,
        }
    }
}

impl fmt::Display for CompletionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} categories complete",
            self.completed, self.subscribed
        )
    }
}
