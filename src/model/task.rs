//! Tasks as the optimizer sees them.

use super::{TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Task priority. Ordered: `Low < Medium < High`.
///
/// Deserializes from either the name (`"high"`) or the stored weight (`3`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case", try_from = "PriorityRepr")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Numeric weight as stored in the `tasks.priority` column.
    pub fn weight(self) -> u32 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }

    /// Inverse of [`Priority::weight`]. Out-of-range values clamp to the
    /// nearest level.
    pub fn from_weight(weight: i32) -> Self {
        match weight {
            i32::MIN..=1 => Priority::Low,
            2 => Priority::Medium,
            _ => Priority::High,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Priority {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "1" => Ok(Priority::Low),
            "medium" | "2" => Ok(Priority::Medium),
            "high" | "3" => Ok(Priority::High),
            other => Err(crate::error::Error::Other(format!(
                "invalid priority: {other}"
            ))),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriorityRepr {
    Weight(i64),
    Name(String),
}

impl TryFrom<PriorityRepr> for Priority {
    type Error = String;

    fn try_from(repr: PriorityRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            PriorityRepr::Weight(1) => Ok(Priority::Low),
            PriorityRepr::Weight(2) => Ok(Priority::Medium),
            PriorityRepr::Weight(3) => Ok(Priority::High),
            PriorityRepr::Weight(w) => Err(format!("priority weight must be 1, 2 or 3, got {w}")),
            PriorityRepr::Name(name) => name.parse().map_err(|e: crate::error::Error| e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Terminal tasks are neither eligible nor counted as workload.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(crate::error::Error::Other(format!(
                "invalid task status: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Eligible task
// ---------------------------------------------------------------------------

/// A task considered for assignment in one optimization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleTask {
    pub id: TaskId,

    /// Display title. Not used for ordering.
    #[serde(default)]
    pub title: String,

    pub priority: Priority,

    /// Tasks without a deadline sort after every task that has one.
    pub deadline: Option<DateTime<Utc>>,

    /// Estimated effort in hours.
    #[serde(default = "default_effort")]
    pub estimated_effort: u32,

    pub current_assignee: Option<UserId>,
}

/// Effort assumed when a task carries no estimate.
pub const DEFAULT_EFFORT: u32 = 1;

fn default_effort() -> u32 {
    DEFAULT_EFFORT
}

impl EligibleTask {
    pub fn new(id: TaskId, priority: Priority) -> Self {
        Self {
            id,
            title: String::new(),
            priority,
            deadline: None,
            estimated_effort: DEFAULT_EFFORT,
            current_assignee: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn effort(mut self, hours: u32) -> Self {
        self.estimated_effort = hours;
        self
    }

    pub fn assigned_to(mut self, user: UserId) -> Self {
        self.current_assignee = Some(user);
        self
    }
}
