//! In-memory solver repository
//!
//! Keeps problems, their matrices, the current solution of each problem and
//! every solve request in process memory. Used by single-node deployments and
//! by tests.

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use router_core::domain::{
    DetailedSolution, JobKey, Problem, Route, Solution, SolutionRequest, SolveRequest,
    SolverStatus,
};
use router_core::matrix::Matrix;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

use super::SolverRepository;

struct ProblemEntry {
    problem: Arc<Problem>,
    matrix: Arc<dyn Matrix>,
    routes: Vec<Route>,
}

#[derive(Default)]
struct Store {
    problems: HashMap<i64, ProblemEntry>,
    /// Insertion order; the last request of a problem is its current one
    requests: Vec<SolveRequest>,
}

impl Store {
    fn current_request(&self, problem_id: i64) -> Option<&SolveRequest> {
        self.requests
            .iter()
            .rev()
            .find(|r| r.problem_id == problem_id)
    }

    fn snapshot(&self, problem_id: i64) -> Option<SolutionRequest> {
        let entry = self.problems.get(&problem_id)?;
        let request = self.current_request(problem_id);
        Some(SolutionRequest {
            solution: Solution::new(Arc::clone(&entry.problem), entry.routes.clone()),
            status: request.map_or(SolverStatus::NotSolved, |r| r.status),
            job_key: request.map(|r| r.job_key),
        })
    }
}

#[derive(Default)]
pub struct InMemorySolverRepository {
    store: Mutex<Store>,
}

impl InMemorySolverRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a problem and its matrix, replacing any previous entry
    ///
    /// The problem starts out with an empty solution.
    pub fn insert_problem(&self, problem: Problem, matrix: Arc<dyn Matrix>) {
        let id = problem.id;
        self.lock().problems.insert(
            id,
            ProblemEntry {
                problem: Arc::new(problem),
                matrix,
                routes: Vec::new(),
            },
        );
    }

    pub fn with_problem(self, problem: Problem, matrix: Arc<dyn Matrix>) -> Self {
        self.insert_problem(problem, matrix);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SolverRepository for InMemorySolverRepository {
    async fn create_request(&self, request: SolveRequest) -> anyhow::Result<Option<SolveRequest>> {
        let mut store = self.lock();
        if store
            .current_request(request.problem_id)
            .is_some_and(|current| current.status.is_active())
        {
            return Ok(None);
        }
        store.requests.push(request.clone());
        Ok(Some(request))
    }

    async fn current_request_by_problem(
        &self,
        problem_id: i64,
    ) -> anyhow::Result<Option<SolveRequest>> {
        Ok(self.lock().current_request(problem_id).cloned())
    }

    async fn current_request_by_key(
        &self,
        job_key: JobKey,
    ) -> anyhow::Result<Option<SolveRequest>> {
        Ok(self
            .lock()
            .requests
            .iter()
            .find(|r| r.job_key == job_key)
            .cloned())
    }

    async fn current_detailed_solution(
        &self,
        problem_id: i64,
    ) -> anyhow::Result<Option<DetailedSolution>> {
        Ok(self.lock().problems.get(&problem_id).map(|entry| {
            DetailedSolution::new(
                Solution::new(Arc::clone(&entry.problem), entry.routes.clone()),
                Arc::clone(&entry.matrix),
            )
        }))
    }

    async fn current_solution_request(
        &self,
        problem_id: i64,
    ) -> anyhow::Result<Option<SolutionRequest>> {
        Ok(self.lock().snapshot(problem_id))
    }

    async fn add_new_solution(
        &self,
        solution: Solution,
        job_key: JobKey,
        status: SolverStatus,
        clear: bool,
    ) -> anyhow::Result<SolutionRequest> {
        let problem_id = solution.problem.id;
        let status = if clear { SolverStatus::NotSolved } else { status };
        let mut store = self.lock();

        let current = store
            .current_request(problem_id)
            .map(|r| (r.job_key, r.status));
        let is_current = current.is_some_and(|(key, _)| key == job_key);
        let accepted = match current {
            Some((key, current_status)) if key == job_key => clear || current_status.is_active(),
            _ => false,
        };

        if !accepted {
            // A superseded request may still be cleared, its routes are not the problem's anymore
            if clear && !is_current {
                if let Some(request) = store.requests.iter_mut().find(|r| r.job_key == job_key) {
                    request.status = SolverStatus::NotSolved;
                    request.updated_at = Utc::now();
                }
            }
            debug!(
                "Dropping {:?} update of job {} for problem {}",
                status, job_key, problem_id
            );
            return store
                .snapshot(problem_id)
                .with_context(|| format!("problem {} not found", problem_id));
        }

        if let Some(request) = store.requests.iter_mut().find(|r| r.job_key == job_key) {
            request.status = status;
            request.updated_at = Utc::now();
        }

        let entry = store
            .problems
            .get_mut(&problem_id)
            .with_context(|| format!("problem {} not found", problem_id))?;
        entry.routes = if clear { Vec::new() } else { solution.routes };

        Ok(SolutionRequest {
            solution: Solution::new(Arc::clone(&entry.problem), entry.routes.clone()),
            status,
            job_key: Some(job_key),
        })
    }

    async fn refresh_stale_requests(&self, timeout: Duration) -> anyhow::Result<usize> {
        let cutoff = Utc::now() - chrono::Duration::from_std(timeout)?;
        let now = Utc::now();
        let mut refreshed = 0;

        for request in self.lock().requests.iter_mut() {
            if request.status.is_active() && request.updated_at < cutoff {
                request.status = SolverStatus::Terminated;
                request.updated_at = now;
                refreshed += 1;
            }
        }

        Ok(refreshed)
    }
}
