//! Solve request domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::solution::Solution;

/// Identifier of one solve attempt
///
/// A new key is assigned on every enqueue, so one problem accumulates many
/// keys over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobKey(Uuid);

impl JobKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for JobKey {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for JobKey {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Solve request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolverStatus {
    Created,
    Enqueued,
    Running,
    Terminated,
    NotSolved,
}

impl SolverStatus {
    /// A request in one of these states blocks new enqueues for its problem
    pub fn is_active(self) -> bool {
        matches!(self, Self::Created | Self::Enqueued | Self::Running)
    }
}

/// Durable record of a problem's solve attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveRequest {
    pub job_key: JobKey,
    pub problem_id: i64,
    pub solver: String,
    pub status: SolverStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl SolveRequest {
    /// A fresh request, already waiting for its job to launch
    pub fn enqueued(problem_id: i64, solver: impl Into<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            job_key: JobKey::new(),
            problem_id,
            solver: solver.into(),
            status: SolverStatus::Enqueued,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A problem's current solution together with the status of the request
/// that produced it
///
/// This is the snapshot pushed to broadcast subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionRequest {
    pub solution: Solution,
    pub status: SolverStatus,
    pub job_key: Option<JobKey>,
}
