//! User repository over Postgres: active users with their workload summed
//! in SQL, using the same metric the optimizer increments with.

use crate::error::{Error, Result};
use crate::model::{CandidateUser, Load, UserId, WorkloadMetric};
use crate::repository::{UserFilter, UserRepository};
use crate::telemetry::metrics;
use async_trait::async_trait;
use opentelemetry::KeyValue;

#[async_trait]
impl UserRepository for super::Db {
    async fn active_candidates(&self, filter: &UserFilter) -> Result<Vec<CandidateUser>> {
        let user_ids: Option<Vec<i64>> = filter
            .user_ids
            .as_ref()
            .map(|ids| ids.iter().map(|id| id.0).collect());

        // Missing estimates count as one hour, matching EligibleTask's default.
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT u.id,
                    COALESCE(SUM(CASE WHEN $2 = 'priority' THEN t.priority
                                      ELSE COALESCE(t.estimated_hours, 1) END), 0)::BIGINT
             FROM users u
             LEFT JOIN tasks t ON t.assigned_to = u.id AND t.status <> 'done'
             WHERE u.is_active
               AND ($1::BIGINT[] IS NULL OR u.id = ANY($1))
             GROUP BY u.id
             ORDER BY u.id",
        )
        .bind(user_ids)
        .bind(metric_column(filter.metric))
        .fetch_all(&self.pool)
        .await?;

        metrics::repository_operations()
            .add(1, &[KeyValue::new("operation", "active_candidates")]);

        rows.into_iter().map(|(id, load)| candidate(id, load)).collect()
    }
}

/// A SUM over CHECK-constrained columns cannot go negative; if it does the
/// snapshot is corrupt and the run must not proceed on it.
fn candidate(id: i64, load: i64) -> Result<CandidateUser> {
    let load = Load::try_from(load).map_err(|_| {
        Error::RepositoryUnavailable(format!("user {id} has invalid workload {load}"))
    })?;
    Ok(CandidateUser::new(UserId(id), load))
}

fn metric_column(metric: WorkloadMetric) -> &'static str {
    match metric {
        WorkloadMetric::Effort => "effort",
        WorkloadMetric::PriorityWeight => "priority",
    }
}
