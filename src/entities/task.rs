use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{EntityId, ParseLabelError, Technician};
use crate::priority::Priority;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::NotStarted, TaskStatus::InProgress, TaskStatus::Done];

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done)
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not-started",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.label() == wanted)
            .ok_or_else(|| ParseLabelError::new("task status", s))
    }
}

/// Task tag. Only `Invoice` carries meaning to the workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskType {
    Invoice,
    #[default]
    FollowUp,
    Callback,
    Deviation,
    Other,
}

impl TaskType {
    pub fn label(self) -> &'static str {
        match self {
            TaskType::Invoice => "invoice",
            TaskType::FollowUp => "follow-up",
            TaskType::Callback => "callback",
            TaskType::Deviation => "deviation",
            TaskType::Other => "other",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A follow-up unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: EntityId,
    pub task_type: TaskType,
    pub customer_id: Option<EntityId>,
    pub facility_id: Option<EntityId>,
    pub order_id: Option<EntityId>,
    pub assignee: Option<Technician>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub description: String,
    pub due_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn is_invoice_for(&self, order_id: &EntityId) -> bool {
        self.task_type == TaskType::Invoice && self.order_id.as_ref() == Some(order_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_done_is_terminal() {
        assert!(TaskStatus::Done.is_terminal());
        assert!(!TaskStatus::NotStarted.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_parse_task_status() {
        assert_eq!("done".parse(), Ok(TaskStatus::Done));
        assert_eq!("not-started".parse(), Ok(TaskStatus::NotStarted));
        assert!("closed".parse::<TaskStatus>().is_err());
    }
}
