//! Optimizer policy files.
//!
//! A TOML file with an `[optimizer]` table. Every key is optional and
//! overrides the value it is applied to:
//!
//! ```toml
//! [optimizer]
//! mode = "rebalance"
//! metric = "priority"
//! due_dates = true
//! base_window_days = 10
//! ```

use crate::error::{Error, Result};
use crate::model::{AssignmentMode, WorkloadMetric};
use crate::optimizer::{MAX_BASE_WINDOW_DAYS, OptimizerConfig};
use serde::Deserialize;
use std::path::Path;

/// Top-level TOML wrapper.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyFile {
    #[serde(default)]
    pub optimizer: PolicyOverrides,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyOverrides {
    pub mode: Option<AssignmentMode>,
    pub metric: Option<WorkloadMetric>,
    pub due_dates: Option<bool>,
    pub base_window_days: Option<u32>,
    pub partial_batch: Option<bool>,
}

impl PolicyFile {
    pub fn parse(content: &str) -> Result<Self> {
        let policy: Self =
            toml::from_str(content).map_err(|e| Error::Config(format!("invalid policy: {e}")))?;
        policy.check()?;
        Ok(policy)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read {}: {e}", path.display())))?;
        let policy: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid policy {}: {e}", path.display())))?;
        policy.check()?;
        Ok(policy)
    }

    fn check(&self) -> Result<()> {
        match self.optimizer.base_window_days {
            Some(days) if days > MAX_BASE_WINDOW_DAYS => Err(Error::Config(format!(
                "invalid policy: base_window_days must be at most {MAX_BASE_WINDOW_DAYS}, got {days}"
            ))),
            _ => Ok(()),
        }
    }

    /// Layer the file's settings over `base`.
    pub fn apply(&self, mut base: OptimizerConfig) -> OptimizerConfig {
        let o = &self.optimizer;
        if let Some(mode) = o.mode {
            base.mode = mode;
        }
        if let Some(metric) = o.metric {
            base.metric = metric;
        }
        if let Some(due_dates) = o.due_dates {
            base.due_dates = due_dates;
        }
        if let Some(days) = o.base_window_days {
            base.base_window_days = days;
        }
        if let Some(partial) = o.partial_batch {
            base.partial_batch = partial;
        }
        base
    }
}
