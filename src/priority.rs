use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::entities::ParseLabelError;

/// Task priority levels
/// Higher values sort first in an assignee's task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Whenever there is time (0)
    Low = 0,
    /// Default for manually created tasks (1)
    #[default]
    Normal = 1,
    /// Billing handoffs and customer-facing deadlines (2)
    High = 2,
    /// Safety deviations that block a facility sign-off (3)
    Critical = 3,
}

impl Priority {
    /// Parse a priority from a free-form label as typed in forms and config files.
    /// Accepts the canonical names plus the short forms used in the old task board.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "low" | "lav" | "p3" => Some(Priority::Low),
            "normal" | "medium" | "p2" => Some(Priority::Normal),
            "high" | "høy" | "hoy" | "p1" => Some(Priority::High),
            "critical" | "kritisk" | "p0" => Some(Priority::Critical),
            _ => None,
        }
    }

    /// Get the numeric priority value
    pub fn value(self) -> u32 {
        self as u32
    }
}

impl FromStr for Priority {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::from_label(s).ok_or_else(|| ParseLabelError::new("priority", s))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH",
            Priority::Normal => "NORMAL",
            Priority::Low => "LOW",
        };
        write!(f, "{}", label)
    }
}
