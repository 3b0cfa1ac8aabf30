//! Optimization runs end to end: snapshot, plan, write back.
//!
//! The service gathers eligible tasks and candidate users from the
//! repositories, hands them to [`optimizer::optimize`], then persists each
//! assignment on its own. A failed write becomes a diagnostic; the rest of
//! the batch still commits.

use crate::error::{Error, Result};
use crate::model::{Assignment, AssignmentMode, Load, ProjectId, TaskId, UserId, WorkloadMetric};
use crate::optimizer::{self, Diagnostic, OptimizerConfig, SkipReason};
use crate::repository::{TaskFilter, TaskRepository, UserFilter, UserRepository};
use crate::telemetry::metrics;
use crate::telemetry::optimizer::{record_outcome, start_run_span};
use chrono::Utc;
use opentelemetry::KeyValue;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, warn};
use uuid::Uuid;

/// What to optimize.
#[derive(Debug, Clone, Default)]
pub struct OptimizeRequest {
    /// `None` optimizes across every project.
    pub project_id: Option<ProjectId>,
    /// Restrict candidates (and, when rebalancing, the tasks moved) to
    /// these users.
    pub candidate_user_ids: Option<Vec<UserId>>,
    /// Compute the plan without writing anything back.
    pub dry_run: bool,
}

impl OptimizeRequest {
    pub fn project(project_id: ProjectId) -> Self {
        Self {
            project_id: Some(project_id),
            ..Self::default()
        }
    }

    pub fn candidates(mut self, ids: Vec<UserId>) -> Self {
        self.candidate_user_ids = Some(ids);
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationReport {
    pub run_id: Uuid,
    pub mode: AssignmentMode,
    pub metric: WorkloadMetric,
    pub dry_run: bool,
    /// Assignments that were written back (all of them on a dry run), in
    /// processing order.
    pub committed: Vec<Assignment>,
    pub diagnostics: Vec<Diagnostic>,
    /// Planned load per candidate.
    pub loads: BTreeMap<UserId, Load>,
}

impl OptimizationReport {
    /// Committed task ids grouped by assignee.
    pub fn by_assignee(&self) -> BTreeMap<UserId, Vec<TaskId>> {
        let mut grouped: BTreeMap<UserId, Vec<TaskId>> = BTreeMap::new();
        for a in &self.committed {
            grouped.entry(a.assignee_id).or_default().push(a.task_id);
        }
        grouped
    }

    pub fn persist_failures(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::PersistFailed { .. }))
            .count()
    }
}

/// Runs the optimizer against a pair of repositories.
pub struct OptimizerService<T, U> {
    tasks: Arc<T>,
    users: Arc<U>,
    config: OptimizerConfig,
}

impl<T, U> Clone for OptimizerService<T, U> {
    fn clone(&self) -> Self {
        Self {
            tasks: Arc::clone(&self.tasks),
            users: Arc::clone(&self.users),
            config: self.config.clone(),
        }
    }
}

impl<T: TaskRepository, U: UserRepository> OptimizerService<T, U> {
    pub fn new(tasks: Arc<T>, users: Arc<U>, config: OptimizerConfig) -> Self {
        Self {
            tasks,
            users,
            config,
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Snapshot, plan and persist.
    pub async fn run(&self, request: OptimizeRequest) -> Result<OptimizationReport> {
        let run_id = Uuid::new_v4();
        let span = start_run_span(&run_id, self.config.mode, self.config.metric);
        let started = Instant::now();

        let result = self
            .run_inner(run_id, request)
            .instrument(span.clone())
            .await;

        let mode = self.config.mode.to_string();
        match &result {
            Ok(report) => {
                let skipped = report
                    .diagnostics
                    .iter()
                    .filter(|d| matches!(d, Diagnostic::Skipped { .. }))
                    .count();
                record_outcome(
                    &span,
                    report.committed.len(),
                    skipped,
                    report.persist_failures(),
                );
                metrics::optimizer_runs()
                    .add(1, &[KeyValue::new("mode", mode), KeyValue::new("result", "ok")]);
            }
            Err(e) => {
                span.in_scope(|| warn!(error = %e, "optimization run failed"));
                metrics::optimizer_runs().add(
                    1,
                    &[KeyValue::new("mode", mode), KeyValue::new("result", "error")],
                );
            }
        }
        metrics::operation_duration_ms().record(
            started.elapsed().as_secs_f64() * 1000.0,
            &[KeyValue::new("operation", "optimizer.run")],
        );

        result
    }

    async fn run_inner(&self, run_id: Uuid, request: OptimizeRequest) -> Result<OptimizationReport> {
        let rebalance = self.config.mode == AssignmentMode::Rebalance;

        let task_filter = TaskFilter {
            project_id: request.project_id,
            include_assigned: rebalance,
            assignee_ids: if rebalance {
                request.candidate_user_ids.clone()
            } else {
                None
            },
        };
        let user_filter = UserFilter {
            user_ids: request.candidate_user_ids.clone(),
            metric: self.config.metric,
        };

        let tasks = self
            .tasks
            .eligible_tasks(&task_filter)
            .await
            .map_err(Error::into_repository_error)?;
        let users = self
            .users
            .active_candidates(&user_filter)
            .await
            .map_err(Error::into_repository_error)?;

        info!(
            tasks = tasks.len(),
            users = users.len(),
            project = ?request.project_id,
            "snapshot taken"
        );

        let plan = optimizer::optimize(&tasks, &users, &self.config, Utc::now())?;
        self.record_plan_metrics(&plan.diagnostics, plan.assignments.len());

        let mut diagnostics = plan.diagnostics;
        let committed = if request.dry_run {
            plan.assignments
        } else {
            let mut committed = Vec::with_capacity(plan.assignments.len());
            for assignment in plan.assignments {
                match self.tasks.persist_assignment(&assignment).await {
                    Ok(()) => committed.push(assignment),
                    Err(e) => {
                        warn!(
                            task = %assignment.task_id,
                            assignee = %assignment.assignee_id,
                            error = %e,
                            "assignment not persisted"
                        );
                        metrics::persist_failures().add(1, &[]);
                        diagnostics.push(Diagnostic::PersistFailed {
                            task_id: assignment.task_id,
                            assignee_id: assignment.assignee_id,
                            error: e.to_string(),
                        });
                    }
                }
            }
            committed
        };

        info!(
            committed = committed.len(),
            diagnostics = diagnostics.len(),
            dry_run = request.dry_run,
            "optimization run finished"
        );

        Ok(OptimizationReport {
            run_id,
            mode: self.config.mode,
            metric: self.config.metric,
            dry_run: request.dry_run,
            committed,
            diagnostics,
            loads: plan.loads,
        })
    }

    fn record_plan_metrics(&self, diagnostics: &[Diagnostic], assigned: usize) {
        metrics::tasks_assigned().add(
            assigned as u64,
            &[
                KeyValue::new("mode", self.config.mode.to_string()),
                KeyValue::new("metric", self.config.metric.to_string()),
            ],
        );
        for diagnostic in diagnostics {
            if let Diagnostic::Skipped { reason, .. } = diagnostic {
                let reason = match reason {
                    SkipReason::AlreadyAssigned { .. } => "already_assigned",
                    SkipReason::UnknownAssignee { .. } => "unknown_assignee",
                    SkipReason::DuplicateTask => "duplicate_task",
                };
                metrics::tasks_skipped().add(1, &[KeyValue::new("reason", reason)]);
            }
        }
    }
}
