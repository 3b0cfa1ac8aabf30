//! Error types for taskopt.

use crate::model::{TaskId, UserId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no eligible tasks to assign")]
    NoEligibleTasks,

    #[error("no eligible users to assign to")]
    NoEligibleUsers,

    #[error("task {task} is assigned to user {assignee}, who is not a candidate")]
    UnknownAssignee { task: TaskId, assignee: UserId },

    #[error("repository unavailable: {0}")]
    RepositoryUnavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflicting update: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap a collaborator failure so callers see it as a repository outage.
    ///
    /// Domain errors raised by the repository itself pass through unchanged.
    pub fn into_repository_error(self) -> Self {
        match self {
            Error::Database(e) => Error::RepositoryUnavailable(e.to_string()),
            Error::Io(e) => Error::RepositoryUnavailable(e.to_string()),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
