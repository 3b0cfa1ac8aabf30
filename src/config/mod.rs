//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing.
//! The database URL is wrapped in secrecy::SecretString to keep
//! credentials out of logs.

pub mod policy;

use crate::error::{Error, Result};
use crate::model::{AssignmentMode, WorkloadMetric};
use crate::optimizer::OptimizerConfig;
use secrecy::SecretString;

#[derive(Debug)]
pub struct Config {
    pub database_url: SecretString,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
    pub optimizer: OptimizerConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: SecretString::from(required_var("DATABASE_URL")?),
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            optimizer: optimizer_from_env()?,
        })
    }
}

/// Optimizer settings from `TASKOPT_*` variables, defaulting any that are
/// unset. Does not require a database.
pub fn optimizer_from_env() -> Result<OptimizerConfig> {
    let mut config = OptimizerConfig::default();

    if let Some(mode) = optional_var("TASKOPT_MODE") {
        config.mode = mode.parse::<AssignmentMode>()?;
    }
    if let Some(metric) = optional_var("TASKOPT_METRIC") {
        config.metric = metric.parse::<WorkloadMetric>()?;
    }
    if let Some(flag) = optional_var("TASKOPT_DUE_DATES") {
        config.due_dates = parse_bool("TASKOPT_DUE_DATES", &flag)?;
    }
    if let Some(days) = optional_var("TASKOPT_BASE_WINDOW_DAYS") {
        config.base_window_days = days.trim().parse().map_err(|_| {
            Error::Config(format!("TASKOPT_BASE_WINDOW_DAYS must be an integer, got {days}"))
        })?;
    }
    if let Some(flag) = optional_var("TASKOPT_PARTIAL_BATCH") {
        config.partial_batch = parse_bool("TASKOPT_PARTIAL_BATCH", &flag)?;
    }

    config.validate()?;
    Ok(config)
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{name} must be a boolean, got {other}"))),
    }
}
