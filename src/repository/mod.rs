//! Collaborators the optimizer depends on but does not implement.
//!
//! [`TaskRepository`] supplies eligible tasks and persists assignments;
//! [`UserRepository`] supplies candidate users with a workload snapshot.
//! `crate::db::Db` implements both over Postgres, [`memory::MemoryStore`]
//! implements both in process.

pub mod memory;

use crate::error::Result;
use crate::model::{Assignment, CandidateUser, EligibleTask, ProjectId, UserId, WorkloadMetric};
use async_trait::async_trait;

/// Which tasks to fetch for a run.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Restrict to one project. `None` means every project.
    pub project_id: Option<ProjectId>,
    /// Include tasks that already have an assignee.
    pub include_assigned: bool,
    /// When including assigned tasks, only those held by these users.
    pub assignee_ids: Option<Vec<UserId>>,
}

impl TaskFilter {
    pub fn project(project_id: ProjectId) -> Self {
        Self {
            project_id: Some(project_id),
            ..Self::default()
        }
    }
}

/// Which users to offer as candidates, and how to measure their workload.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Restrict to these ids. `None` means every active user.
    pub user_ids: Option<Vec<UserId>>,
    pub metric: WorkloadMetric,
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Non-terminal tasks matching `filter`.
    async fn eligible_tasks(&self, filter: &TaskFilter) -> Result<Vec<EligibleTask>>;

    /// Write one assignment back.
    ///
    /// Fails with `NotFound` if the task is gone or finished, and with
    /// `Conflict` if its assignee changed since the snapshot.
    async fn persist_assignment(&self, assignment: &Assignment) -> Result<()>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Active users matching `filter`, each with the summed workload of
    /// their non-terminal tasks.
    async fn active_candidates(&self, filter: &UserFilter) -> Result<Vec<CandidateUser>>;
}
