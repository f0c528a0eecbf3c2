//! Solver commands and events

use serde::{Deserialize, Serialize};

use crate::domain::{DetailedSolution, JobKey, Solution, SolutionRequest, SolverStatus};

/// Request to launch a solver job
#[derive(Debug, Clone)]
pub struct StartJob {
    pub problem_id: i64,
    pub job_key: JobKey,
    pub solver_name: String,
    pub detailed_solution: DetailedSolution,
}

/// Request to stop a solver job, or to prevent it from starting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelJob {
    pub job_key: JobKey,
    /// Status of the request when the cancel was issued
    pub current_status: SolverStatus,
    /// Discard the stored solution instead of keeping the last best
    pub clear: bool,
}

/// One lifecycle event of a solver job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionEvent {
    pub solution: Solution,
    pub status: SolverStatus,
    pub job_key: JobKey,
    /// Reset the stored solution to empty instead of applying `solution`
    pub clear: bool,
}

impl SolutionEvent {
    pub fn running(job_key: JobKey, solution: Solution) -> Self {
        Self {
            solution,
            status: SolverStatus::Running,
            job_key,
            clear: false,
        }
    }

    pub fn terminated(job_key: JobKey, solution: Solution, clear: bool) -> Self {
        Self {
            solution,
            status: SolverStatus::Terminated,
            job_key,
            clear,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status == SolverStatus::Terminated
    }

    /// Re-emit a stored snapshot with the clear flag set
    ///
    /// Returns `None` when the snapshot is not tied to a solve attempt.
    pub fn clearing(request: SolutionRequest) -> Option<Self> {
        let job_key = request.job_key?;
        Some(Self {
            solution: request.solution,
            status: request.status,
            job_key,
            clear: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Problem;
    use std::sync::Arc;

    fn empty_solution() -> Solution {
        Solution::empty(Arc::new(Problem {
            id: 7,
            name: "empty".to_string(),
            vehicles: vec![],
            customers: vec![],
        }))
    }

    #[test]
    fn test_event_constructors() {
        let key = JobKey::new();

        let running = SolutionEvent::running(key, empty_solution());
        assert_eq!(running.status, SolverStatus::Running);
        assert!(!running.clear);
        assert!(!running.is_terminal());

        let terminated = SolutionEvent::terminated(key, empty_solution(), true);
        assert!(terminated.is_terminal());
        assert!(terminated.clear);
    }

    #[test]
    fn test_clearing_requires_job_key() {
        let request = SolutionRequest {
            solution: empty_solution(),
            status: SolverStatus::Terminated,
            job_key: None,
        };
        assert!(SolutionEvent::clearing(request.clone()).is_none());

        let key = JobKey::new();
        let event = SolutionEvent::clearing(SolutionRequest {
            job_key: Some(key),
            ..request
        })
        .unwrap();
        assert_eq!(event.job_key, key);
        assert_eq!(event.status, SolverStatus::Terminated);
        assert!(event.clear);
    }
}
