//! In-process repository.
//!
//! Holds users and tasks in memory behind an async lock. Used for tests,
//! dry runs from fixture files, and embedding the optimizer without a
//! database.

use super::{TaskFilter, TaskRepository, UserFilter, UserRepository};
use crate::error::{Error, Result};
use crate::model::{
    Assignment, CandidateUser, EligibleTask, Load, Priority, ProjectId, TaskId, TaskStatus, UserId,
    WorkloadMetric,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// A stored user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    #[serde(default = "active_default")]
    pub is_active: bool,
}

fn active_default() -> bool {
    true
}

/// A stored task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub title: String,
    pub status: TaskStatus,
    pub priority: Priority,
    /// `None` counts as the default effort.
    pub estimated_hours: Option<u32>,
    pub assigned_to: Option<UserId>,
    pub deadline: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskRecord {
    pub fn new(id: TaskId, project_id: ProjectId, priority: Priority) -> Self {
        Self {
            id,
            project_id,
            title: format!("task {id}"),
            status: TaskStatus::Todo,
            priority,
            estimated_hours: None,
            assigned_to: None,
            deadline: None,
            due_date: None,
        }
    }

    fn to_eligible(&self) -> EligibleTask {
        EligibleTask {
            id: self.id,
            title: self.title.clone(),
            priority: self.priority,
            deadline: self.deadline,
            estimated_effort: self
                .estimated_hours
                .unwrap_or(crate::model::task::DEFAULT_EFFORT),
            current_assignee: self.assigned_to,
        }
    }
}

/// Fixture file layout: `{"users": [...], "tasks": [...]}`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
}

#[derive(Debug, Default)]
struct Inner {
    users: BTreeMap<UserId, UserRecord>,
    tasks: BTreeMap<TaskId, TaskRecord>,
}

/// In-memory implementation of both repositories.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        let inner = Inner {
            users: fixture.users.into_iter().map(|u| (u.id, u)).collect(),
            tasks: fixture.tasks.into_iter().map(|t| (t.id, t)).collect(),
        };
        Self {
            inner: RwLock::new(inner),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Load a JSON fixture from disk.
    pub async fn load(path: &std::path::Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let fixture: Fixture = serde_json::from_str(&content)
            .map_err(|e| Error::Other(format!("invalid fixture {}: {e}", path.display())))?;
        Ok(Self::from_fixture(fixture))
    }

    /// Simulate an outage: every call fails with `RepositoryUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn insert_user(&self, user: UserRecord) {
        self.inner.write().await.users.insert(user.id, user);
    }

    pub async fn insert_task(&self, task: TaskRecord) {
        self.inner.write().await.tasks.insert(task.id, task);
    }

    pub async fn remove_task(&self, id: TaskId) -> Option<TaskRecord> {
        self.inner.write().await.tasks.remove(&id)
    }

    pub async fn task(&self, id: TaskId) -> Option<TaskRecord> {
        self.inner.read().await.tasks.get(&id).cloned()
    }

    /// Change a task's assignee outside of any optimization run.
    pub async fn reassign(&self, id: TaskId, assignee: Option<UserId>) -> Result<()> {
        let mut inner = self.inner.write().await;
        let task = inner
            .tasks
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("task {id}")))?;
        task.assigned_to = assignee;
        Ok(())
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::RepositoryUnavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn eligible_tasks(&self, filter: &TaskFilter) -> Result<Vec<EligibleTask>> {
        self.check_available()?;
        let inner = self.inner.read().await;

        let tasks = inner
            .tasks
            .values()
            .filter(|t| !t.status.is_terminal())
            .filter(|t| filter.project_id.is_none_or(|p| t.project_id == p))
            .filter(|t| match t.assigned_to {
                None => true,
                Some(holder) => {
                    filter.include_assigned
                        && filter
                            .assignee_ids
                            .as_ref()
                            .is_none_or(|ids| ids.contains(&holder))
                }
            })
            .map(TaskRecord::to_eligible)
            .collect();

        Ok(tasks)
    }

    async fn persist_assignment(&self, assignment: &Assignment) -> Result<()> {
        self.check_available()?;
        let mut inner = self.inner.write().await;

        let task = inner
            .tasks
            .get_mut(&assignment.task_id)
            .filter(|t| !t.status.is_terminal())
            .ok_or_else(|| Error::NotFound(format!("task {}", assignment.task_id)))?;

        if task.assigned_to != assignment.previous_assignee {
            return Err(Error::Conflict(format!(
                "task {} assignee changed since snapshot",
                assignment.task_id
            )));
        }

        task.assigned_to = Some(assignment.assignee_id);
        if assignment.due_date.is_some() {
            task.due_date = assignment.due_date;
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn active_candidates(&self, filter: &UserFilter) -> Result<Vec<CandidateUser>> {
        self.check_available()?;
        let inner = self.inner.read().await;

        let mut loads: BTreeMap<UserId, Load> = inner
            .users
            .values()
            .filter(|u| u.is_active)
            .filter(|u| filter.user_ids.as_ref().is_none_or(|ids| ids.contains(&u.id)))
            .map(|u| (u.id, 0))
            .collect();

        for task in inner.tasks.values().filter(|t| !t.status.is_terminal()) {
            let Some(holder) = task.assigned_to else {
                continue;
            };
            if let Some(load) = loads.get_mut(&holder) {
                *load += workload_of(task, filter.metric);
            }
        }

        Ok(loads
            .into_iter()
            .map(|(id, load)| CandidateUser::new(id, load))
            .collect())
    }
}

fn workload_of(task: &TaskRecord, metric: WorkloadMetric) -> Load {
    metric.weight_of(&task.to_eligible())
}
