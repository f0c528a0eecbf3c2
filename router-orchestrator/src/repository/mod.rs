//! Persistence port
//!
//! Storage of solve requests and of each problem's current solution. The
//! lifecycle service only talks to storage through [`SolverRepository`].

pub mod memory;

pub use memory::InMemorySolverRepository;

use async_trait::async_trait;
use router_core::domain::{
    DetailedSolution, JobKey, Solution, SolutionRequest, SolveRequest, SolverStatus,
};
use std::time::Duration;

#[async_trait]
pub trait SolverRepository: Send + Sync {
    /// Stores `request` unless its problem already has an active request
    ///
    /// Returns the stored request, or `None` when nothing was created. The
    /// check and the insert are atomic.
    async fn create_request(&self, request: SolveRequest) -> anyhow::Result<Option<SolveRequest>>;

    /// Most recent request of a problem
    async fn current_request_by_problem(
        &self,
        problem_id: i64,
    ) -> anyhow::Result<Option<SolveRequest>>;

    async fn current_request_by_key(&self, job_key: JobKey)
    -> anyhow::Result<Option<SolveRequest>>;

    /// Current solution of a problem with the matrix it is solved against
    async fn current_detailed_solution(
        &self,
        problem_id: i64,
    ) -> anyhow::Result<Option<DetailedSolution>>;

    /// Current solution of a problem with its latest request status
    ///
    /// A problem without requests reports NOT_SOLVED.
    async fn current_solution_request(
        &self,
        problem_id: i64,
    ) -> anyhow::Result<Option<SolutionRequest>>;

    /// Upserts a problem's solution and the status of request `job_key`
    ///
    /// With `clear` the stored routes are emptied and the status reset to
    /// NOT_SOLVED, whatever `solution` and `status` say.
    async fn add_new_solution(
        &self,
        solution: Solution,
        job_key: JobKey,
        status: SolverStatus,
        clear: bool,
    ) -> anyhow::Result<SolutionRequest>;

    /// Terminates active requests not updated within `timeout`
    ///
    /// Returns how many requests were terminated.
    async fn refresh_stale_requests(&self, timeout: Duration) -> anyhow::Result<usize>;
}
