//! Assignment engine: deterministic greedy minimum-load distribution.
//!
//! Pure computation over a snapshot. Tasks are ordered by
//! [`order::compare`], then each goes to the currently least-loaded
//! candidate (lowest id on ties) and that candidate's load grows by the
//! task's weight in the configured [`WorkloadMetric`].

pub mod load;
pub mod order;

use crate::error::{Error, Result};
use crate::model::{
    Assignment, AssignmentMode, CandidateUser, EligibleTask, Load, Priority, TaskId, UserId,
    WorkloadMetric,
};
use chrono::{DateTime, TimeDelta, Utc};
use load::LoadTable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Default window, in days, from which the priority weight is subtracted
/// to derive a due date.
pub const DEFAULT_BASE_WINDOW_DAYS: u32 = 7;

/// Largest accepted `base_window_days`.
pub const MAX_BASE_WINDOW_DAYS: u32 = 3650;

/// Knobs for one optimization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub mode: AssignmentMode,
    pub metric: WorkloadMetric,
    /// Compute a due date for every assignment.
    pub due_dates: bool,
    pub base_window_days: u32,
    /// Skip tasks that fail validation and report them, instead of failing
    /// the whole run.
    pub partial_batch: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            mode: AssignmentMode::default(),
            metric: WorkloadMetric::default(),
            due_dates: true,
            base_window_days: DEFAULT_BASE_WINDOW_DAYS,
            partial_batch: true,
        }
    }
}

impl OptimizerConfig {
    /// Reject settings the engine cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.base_window_days > MAX_BASE_WINDOW_DAYS {
            return Err(Error::Config(format!(
                "base_window_days must be at most {MAX_BASE_WINDOW_DAYS}, got {}",
                self.base_window_days
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Why a task did not receive an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Already assigned and the run only assigns unassigned tasks.
    AlreadyAssigned { assignee: UserId },
    /// Rebalancing a task whose assignee is not among the candidates.
    UnknownAssignee { assignee: UserId },
    /// The same task id appeared earlier in the input.
    DuplicateTask,
}

/// Something the caller should know about that did not fail the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    Skipped {
        task_id: TaskId,
        #[serde(flatten)]
        reason: SkipReason,
    },
    DuplicateCandidate {
        user_id: UserId,
    },
    PersistFailed {
        task_id: TaskId,
        assignee_id: UserId,
        error: String,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::Skipped { task_id, reason } => match reason {
                SkipReason::AlreadyAssigned { assignee } => {
                    write!(f, "task {task_id} skipped: already assigned to {assignee}")
                }
                SkipReason::UnknownAssignee { assignee } => {
                    write!(f, "task {task_id} skipped: assignee {assignee} is not a candidate")
                }
                SkipReason::DuplicateTask => write!(f, "task {task_id} skipped: duplicate"),
            },
            Diagnostic::DuplicateCandidate { user_id } => {
                write!(f, "user {user_id} listed more than once")
            }
            Diagnostic::PersistFailed {
                task_id,
                assignee_id,
                error,
            } => write!(f, "task {task_id} -> {assignee_id} not saved: {error}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// Result of one engine call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// In processing order.
    pub assignments: Vec<Assignment>,
    pub diagnostics: Vec<Diagnostic>,
    /// Final load per candidate after all assignments.
    pub loads: BTreeMap<UserId, Load>,
}

impl Plan {
    /// Group assigned task ids by assignee, preserving processing order.
    pub fn by_assignee(&self) -> BTreeMap<UserId, Vec<TaskId>> {
        let mut grouped: BTreeMap<UserId, Vec<TaskId>> = BTreeMap::new();
        for a in &self.assignments {
            grouped.entry(a.assignee_id).or_default().push(a.task_id);
        }
        grouped
    }

    /// Difference between the highest and lowest final load.
    pub fn spread(&self) -> Load {
        let max = self.loads.values().max().copied().unwrap_or(0);
        let min = self.loads.values().min().copied().unwrap_or(0);
        max - min
    }
}

/// Due date for a task of `priority` assigned at `now`.
///
/// `base_window_days - weight`, never less than one day. Fails with
/// [`Error::Config`] when the result is outside the representable range.
pub fn due_date_for(
    priority: Priority,
    now: DateTime<Utc>,
    base_window_days: u32,
) -> Result<DateTime<Utc>> {
    let days = (i64::from(base_window_days) - i64::from(priority.weight())).max(1);
    TimeDelta::try_days(days)
        .and_then(|window| now.checked_add_signed(window))
        .ok_or_else(|| {
            Error::Config(format!("due date window of {days} days overflows the calendar"))
        })
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Distribute `tasks` across `users`.
///
/// Inputs are only read. Empty inputs fail before anything else is looked
/// at. `now` anchors due-date computation so identical inputs give
/// identical plans.
pub fn optimize(
    tasks: &[EligibleTask],
    users: &[CandidateUser],
    config: &OptimizerConfig,
    now: DateTime<Utc>,
) -> Result<Plan> {
    if tasks.is_empty() {
        return Err(Error::NoEligibleTasks);
    }
    if users.is_empty() {
        return Err(Error::NoEligibleUsers);
    }
    config.validate()?;

    let (mut table, duplicate_users) = LoadTable::from_snapshot(users);
    let mut diagnostics: Vec<Diagnostic> = duplicate_users
        .into_iter()
        .map(|user_id| Diagnostic::DuplicateCandidate { user_id })
        .collect();

    let mut seen = HashSet::with_capacity(tasks.len());
    let mut selected: Vec<&EligibleTask> = Vec::with_capacity(tasks.len());
    for task in tasks {
        if !seen.insert(task.id) {
            diagnostics.push(Diagnostic::Skipped {
                task_id: task.id,
                reason: SkipReason::DuplicateTask,
            });
            continue;
        }
        match (config.mode, task.current_assignee) {
            (AssignmentMode::UnassignedOnly, Some(assignee)) => {
                diagnostics.push(Diagnostic::Skipped {
                    task_id: task.id,
                    reason: SkipReason::AlreadyAssigned { assignee },
                });
            }
            (AssignmentMode::Rebalance, Some(assignee)) if !table.contains(assignee) => {
                if !config.partial_batch {
                    return Err(Error::UnknownAssignee {
                        task: task.id,
                        assignee,
                    });
                }
                diagnostics.push(Diagnostic::Skipped {
                    task_id: task.id,
                    reason: SkipReason::UnknownAssignee { assignee },
                });
            }
            _ => selected.push(task),
        }
    }

    // A rebalanced task's weight is already in its holder's snapshot.
    if config.mode == AssignmentMode::Rebalance {
        for task in &selected {
            if let Some(holder) = task.current_assignee {
                table.release(holder, config.metric.weight_of(task));
            }
        }
    }

    order::sort_for_assignment(&mut selected);

    let mut assignments = Vec::with_capacity(selected.len());
    for task in selected {
        let weight = config.metric.weight_of(task);
        let Some((assignee_id, load)) = table.assign(weight) else {
            return Err(Error::NoEligibleUsers);
        };
        debug!(task = %task.id, assignee = %assignee_id, load, "task assigned");

        let due_date = if config.due_dates {
            Some(due_date_for(task.priority, now, config.base_window_days)?)
        } else {
            None
        };

        assignments.push(Assignment {
            task_id: task.id,
            title: task.title.clone(),
            assignee_id,
            previous_assignee: task.current_assignee,
            due_date,
        });
    }

    Ok(Plan {
        assignments,
        diagnostics,
        loads: table.into_loads(),
    })
}
