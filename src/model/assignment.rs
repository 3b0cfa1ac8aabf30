//! Optimizer output.

use super::{TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One task placed on one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub task_id: TaskId,
    pub title: String,
    pub assignee_id: UserId,

    /// Assignee the task had when the snapshot was taken. Write-back uses it
    /// as the expected value so a concurrent reassignment is not overwritten.
    pub previous_assignee: Option<UserId>,

    pub due_date: Option<DateTime<Utc>>,
}
