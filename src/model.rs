//! Core data model.
//!
//! Users own projects, projects contain tasks, tasks are assigned to users.
//! The optimizer sees only the slices of these it needs: candidate users with
//! a workload snapshot, eligible tasks, and the assignments it produces.

pub mod assignment;
pub mod task;
pub mod user;

pub use assignment::Assignment;
pub use task::{EligibleTask, Priority, TaskStatus};
pub use user::CandidateUser;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::Error;

            fn from_str(s: &str) -> crate::error::Result<Self> {
                s.trim().parse::<i64>().map($name).map_err(|_| {
                    crate::error::Error::Other(format!(
                        "invalid {}: {s}",
                        stringify!($name)
                    ))
                })
            }
        }
    };
}

id_newtype!(
    /// Primary key of a user.
    UserId
);
id_newtype!(
    /// Primary key of a task.
    TaskId
);
id_newtype!(
    /// Primary key of a project.
    ProjectId
);

// ---------------------------------------------------------------------------
// Workload
// ---------------------------------------------------------------------------

/// Aggregate workload in whichever [`WorkloadMetric`] the run uses.
pub type Load = u64;

/// How a task contributes to its assignee's workload.
///
/// The same metric must be used for the initial snapshot and for the
/// increments applied during a run, otherwise loads are not comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadMetric {
    /// Sum of estimated effort hours.
    #[default]
    Effort,
    /// Sum of priority weights (low = 1, medium = 2, high = 3).
    #[serde(rename = "priority", alias = "priority_weight")]
    PriorityWeight,
}

impl WorkloadMetric {
    /// Weight a task adds to its assignee under this metric.
    pub fn weight_of(self, task: &EligibleTask) -> Load {
        match self {
            WorkloadMetric::Effort => Load::from(task.estimated_effort),
            WorkloadMetric::PriorityWeight => Load::from(task.priority.weight()),
        }
    }
}

impl std::fmt::Display for WorkloadMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkloadMetric::Effort => "effort",
            WorkloadMetric::PriorityWeight => "priority",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for WorkloadMetric {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "effort" | "hours" => Ok(WorkloadMetric::Effort),
            "priority" | "priority_weight" => Ok(WorkloadMetric::PriorityWeight),
            other => Err(crate::error::Error::Config(format!(
                "unknown workload metric: {other}"
            ))),
        }
    }
}

/// Which tasks a run is allowed to (re)assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMode {
    /// Only tasks without an assignee are assigned; existing assignments stay.
    #[default]
    #[serde(rename = "unassigned", alias = "unassigned_only")]
    UnassignedOnly,
    /// Every eligible task is redistributed across the candidate users.
    Rebalance,
}

impl std::fmt::Display for AssignmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AssignmentMode::UnassignedOnly => "unassigned",
            AssignmentMode::Rebalance => "rebalance",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for AssignmentMode {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unassigned" | "unassigned_only" => Ok(AssignmentMode::UnassignedOnly),
            "rebalance" => Ok(AssignmentMode::Rebalance),
            other => Err(crate::error::Error::Config(format!(
                "unknown assignment mode: {other}"
            ))),
        }
    }
}
