//! Metric instrument factories for taskopt.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"taskopt"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for taskopt instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("taskopt")
}

/// Counter: optimization runs.
/// Labels: `mode`, `result` ("ok" | "error").
pub fn optimizer_runs() -> Counter<u64> {
    meter()
        .u64_counter("taskopt.optimizer.runs")
        .with_description("Number of optimization runs")
        .build()
}

/// Counter: tasks that received an assignee.
/// Labels: `mode`, `metric`.
pub fn tasks_assigned() -> Counter<u64> {
    meter()
        .u64_counter("taskopt.optimizer.tasks_assigned")
        .with_description("Number of tasks assigned by the optimizer")
        .build()
}

/// Counter: tasks left out of a plan.
/// Labels: `reason`.
pub fn tasks_skipped() -> Counter<u64> {
    meter()
        .u64_counter("taskopt.optimizer.tasks_skipped")
        .with_description("Number of eligible tasks skipped by the optimizer")
        .build()
}

/// Counter: assignments that could not be written back.
pub fn persist_failures() -> Counter<u64> {
    meter()
        .u64_counter("taskopt.optimizer.persist_failures")
        .with_description("Number of assignments that failed to persist")
        .build()
}

/// Counter: repository calls.
/// Labels: `operation`.
pub fn repository_operations() -> Counter<u64> {
    meter()
        .u64_counter("taskopt.repository.operations")
        .with_description("Number of repository operations")
        .build()
}

/// Histogram: run duration in milliseconds.
/// Labels: `operation`.
pub fn operation_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("taskopt.operation.duration_ms")
        .with_description("Operation duration in milliseconds")
        .with_unit("ms")
        .build()
}
