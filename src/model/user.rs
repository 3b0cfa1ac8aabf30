//! Candidate users and their workload snapshot.

use super::{Load, UserId};
use serde::{Deserialize, Serialize};

/// A user eligible to receive assignments in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateUser {
    pub id: UserId,

    /// Workload of the user's active tasks, taken once when the run starts.
    pub current_load: Load,
}

impl CandidateUser {
    pub fn new(id: UserId, current_load: Load) -> Self {
        Self { id, current_load }
    }
}
