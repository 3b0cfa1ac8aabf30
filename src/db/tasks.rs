//! Task repository over Postgres: eligible-task query and assignment
//! write-back with optimistic concurrency on the previous assignee.

use crate::error::{Error, Result};
use crate::model::{Assignment, EligibleTask, Priority, TaskId, UserId};
use crate::repository::{TaskFilter, TaskRepository};
use crate::telemetry::metrics;
use async_trait::async_trait;
use opentelemetry::KeyValue;

#[async_trait]
impl TaskRepository for super::Db {
    async fn eligible_tasks(&self, filter: &TaskFilter) -> Result<Vec<EligibleTask>> {
        let assignee_ids: Option<Vec<i64>> = filter
            .assignee_ids
            .as_ref()
            .map(|ids| ids.iter().map(|id| id.0).collect());

        let rows: Vec<EligibleTaskRow> = sqlx::query_as(
            "SELECT id, title, priority, estimated_hours, assigned_to, deadline
             FROM tasks
             WHERE status <> 'done'
               AND ($1::BIGINT IS NULL OR project_id = $1)
               AND (assigned_to IS NULL
                    OR ($2 AND ($3::BIGINT[] IS NULL OR assigned_to = ANY($3))))
             ORDER BY id",
        )
        .bind(filter.project_id.map(|p| p.0))
        .bind(filter.include_assigned)
        .bind(assignee_ids)
        .fetch_all(&self.pool)
        .await?;

        metrics::repository_operations().add(1, &[KeyValue::new("operation", "eligible_tasks")]);

        Ok(rows.into_iter().map(EligibleTaskRow::into_task).collect())
    }

    async fn persist_assignment(&self, assignment: &Assignment) -> Result<()> {
        let rows_affected = sqlx::query(
            "UPDATE tasks SET assigned_to = $1, due_date = COALESCE($2, due_date), updated_at = now()
             WHERE id = $3 AND status <> 'done' AND assigned_to IS NOT DISTINCT FROM $4",
        )
        .bind(assignment.assignee_id.0)
        .bind(assignment.due_date)
        .bind(assignment.task_id.0)
        .bind(assignment.previous_assignee.map(|u| u.0))
        .execute(&self.pool)
        .await?
        .rows_affected();

        metrics::repository_operations()
            .add(1, &[KeyValue::new("operation", "persist_assignment")]);

        if rows_affected == 1 {
            return Ok(());
        }

        // Nothing updated: tell a vanished task apart from a lost race.
        let current: Option<(Option<i64>,)> =
            sqlx::query_as("SELECT assigned_to FROM tasks WHERE id = $1 AND status <> 'done'")
                .bind(assignment.task_id.0)
                .fetch_optional(&self.pool)
                .await?;

        match current {
            None => Err(Error::NotFound(format!("task {}", assignment.task_id))),
            Some((holder,)) => Err(Error::Conflict(format!(
                "task {} now assigned to {}, expected {}",
                assignment.task_id,
                describe(holder.map(UserId)),
                describe(assignment.previous_assignee),
            ))),
        }
    }
}

fn describe(user: Option<UserId>) -> String {
    user.map(|u| u.to_string())
        .unwrap_or_else(|| "nobody".to_string())
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct EligibleTaskRow {
    id: i64,
    title: String,
    priority: i32,
    estimated_hours: Option<i32>,
    assigned_to: Option<i64>,
    deadline: Option<chrono::DateTime<chrono::Utc>>,
}

impl EligibleTaskRow {
    fn into_task(self) -> EligibleTask {
        EligibleTask {
            id: TaskId(self.id),
            title: self.title,
            priority: Priority::from_weight(self.priority),
            deadline: self.deadline,
            estimated_effort: self
                .estimated_hours
                .map(|h| h.max(0) as u32)
                .unwrap_or(crate::model::task::DEFAULT_EFFORT),
            current_assignee: self.assigned_to.map(UserId),
        }
    }
}
