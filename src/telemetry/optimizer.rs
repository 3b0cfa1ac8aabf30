//! Optimization run span helpers.

use crate::model::{AssignmentMode, WorkloadMetric};
use tracing::Span;
use uuid::Uuid;

/// Start a span covering one optimization run.
///
/// The result fields are declared empty and filled via [`record_outcome`].
pub fn start_run_span(run_id: &Uuid, mode: AssignmentMode, metric: WorkloadMetric) -> Span {
    tracing::info_span!(
        "optimizer.run",
        "optimizer.run_id" = %run_id,
        "optimizer.mode" = %mode,
        "optimizer.metric" = %metric,
        "optimizer.assigned" = tracing::field::Empty,
        "optimizer.skipped" = tracing::field::Empty,
        "optimizer.persist_failures" = tracing::field::Empty,
    )
}

/// Record the counts a run ended with.
pub fn record_outcome(span: &Span, assigned: usize, skipped: usize, persist_failures: usize) {
    span.record("optimizer.assigned", assigned as u64);
    span.record("optimizer.skipped", skipped as u64);
    span.record("optimizer.persist_failures", persist_failures as u64);
}
