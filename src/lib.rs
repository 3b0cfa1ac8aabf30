//! # taskopt
//!
//! Task-management backend core: users own projects, projects contain
//! tasks, tasks are assigned to users.
//!
//! The centre of the crate is a deterministic greedy assignment optimizer
//! ([`optimizer`]) that spreads eligible tasks across candidate users by
//! current workload, in priority and deadline order. Around it sit the
//! repository seams it reads from and writes to ([`repository`], [`db`]),
//! the run orchestration ([`service`]), configuration and OpenTelemetry
//! observability.

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod optimizer;
pub mod repository;
pub mod service;
pub mod telemetry;
