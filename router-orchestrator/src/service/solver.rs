//! Solve request service
//!
//! Lifecycle of solve requests: enqueueing, termination, clearing, and
//! persisting the updates coming back from solver jobs.

use router_core::domain::{JobKey, SolutionRequest, SolveRequest, SolverStatus};
use router_core::dto::{CancelJob, SolutionEvent, StartJob};
use router_runner::SolverRegistry;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ServiceError, ServiceResult};
use crate::events::{BroadcastPort, SolverEventsPort};
use crate::repository::SolverRepository;

pub struct SolveRequestService {
    repository: Arc<dyn SolverRepository>,
    events: Arc<dyn SolverEventsPort>,
    broadcast: Arc<dyn BroadcastPort>,
    solvers: Arc<SolverRegistry>,
}

impl SolveRequestService {
    pub fn new(
        repository: Arc<dyn SolverRepository>,
        events: Arc<dyn SolverEventsPort>,
        broadcast: Arc<dyn BroadcastPort>,
        solvers: Arc<SolverRegistry>,
    ) -> Self {
        Self {
            repository,
            events,
            broadcast,
            solvers,
        }
    }

    /// Enqueues a solve of `problem_id` with `solver_name`
    ///
    /// Returns `None` if the problem already has an active request.
    pub async fn enqueue(&self, problem_id: i64, solver_name: &str) -> ServiceResult<Option<JobKey>> {
        if !self.solvers.contains(solver_name) {
            return Err(ServiceError::UnknownSolver(solver_name.to_string()));
        }

        let detailed = self
            .repository
            .current_detailed_solution(problem_id)
            .await?
            .ok_or_else(|| ServiceError::problem_not_found(problem_id))?;

        let Some(request) = self
            .repository
            .create_request(SolveRequest::enqueued(problem_id, solver_name))
            .await?
        else {
            tracing::info!("Problem {} already has an active solve request", problem_id);
            return Ok(None);
        };

        let job_key = request.job_key;
        self.events
            .enqueue_request_solver(StartJob {
                problem_id,
                job_key,
                solver_name: solver_name.to_string(),
                detailed_solution: detailed,
            })
            .await
            .map_err(|e| ServiceError::Publish(format!("start of job {}: {:#}", job_key, e)))?;

        tracing::info!(
            "Enqueued job {} for problem {} with solver '{}'",
            job_key,
            problem_id,
            solver_name
        );
        Ok(Some(job_key))
    }

    /// Stops job `job_key`, keeping its best solution
    pub async fn terminate(&self, job_key: JobKey) -> ServiceResult<()> {
        self.cancel_or_clear(job_key, false).await
    }

    /// Stops job `job_key` and discards its solution
    ///
    /// On an already terminated request the stored solution is cleared.
    pub async fn clear(&self, job_key: JobKey) -> ServiceResult<()> {
        self.cancel_or_clear(job_key, true).await
    }

    async fn cancel_or_clear(&self, job_key: JobKey, clear: bool) -> ServiceResult<()> {
        let request = self
            .repository
            .current_request_by_key(job_key)
            .await?
            .ok_or_else(|| ServiceError::request_not_found(job_key))?;

        match request.status {
            SolverStatus::Enqueued | SolverStatus::Running => {
                let command = CancelJob {
                    job_key,
                    current_status: request.status,
                    clear,
                };
                self.events
                    .broadcast_cancel_solver(command)
                    .await
                    .map_err(|e| ServiceError::Publish(format!("cancel of job {}: {:#}", job_key, e)))?;
                tracing::info!(
                    "Requested cancel of job {} in status {:?} (clear: {})",
                    job_key,
                    request.status,
                    clear
                );
            }
            SolverStatus::Terminated if clear => {
                let Some(event) = self
                    .repository
                    .current_solution_request(request.problem_id)
                    .await?
                    .and_then(SolutionEvent::clearing)
                else {
                    return Ok(());
                };
                self.events
                    .enqueue_solution_request(event)
                    .await
                    .map_err(|e| ServiceError::Publish(format!("clear of job {}: {:#}", job_key, e)))?;
                tracing::info!("Requested clear of terminated job {}", job_key);
            }
            status => {
                tracing::debug!("Nothing to cancel for job {} in status {:?}", job_key, status);
            }
        }

        Ok(())
    }

    /// Persists a job event and broadcasts the resulting snapshot
    pub async fn update(&self, event: SolutionEvent) -> ServiceResult<SolutionRequest> {
        let snapshot = self
            .repository
            .add_new_solution(event.solution, event.job_key, event.status, event.clear)
            .await?;

        tracing::debug!(
            "Stored {:?} update for job {} (objective: {:.2})",
            snapshot.status,
            event.job_key,
            snapshot.solution.objective()
        );

        self.broadcast
            .broadcast_solution(snapshot.clone())
            .await
            .map_err(|e| ServiceError::Publish(format!("snapshot of job {}: {:#}", event.job_key, e)))?;

        Ok(snapshot)
    }

    /// Status of the problem's current request, NOT_SOLVED if it has none
    pub async fn show_status(&self, problem_id: i64) -> ServiceResult<SolverStatus> {
        Ok(self
            .repository
            .current_request_by_problem(problem_id)
            .await?
            .map_or(SolverStatus::NotSolved, |r| r.status))
    }

    pub async fn current_solution_request(
        &self,
        problem_id: i64,
    ) -> ServiceResult<Option<SolutionRequest>> {
        Ok(self.repository.current_solution_request(problem_id).await?)
    }

    /// Names of the solvers this node can run, sorted
    pub fn solver_names(&self) -> Vec<String> {
        self.solvers.names()
    }

    /// Re-broadcasts the problem's current snapshot
    pub async fn show_detailed_path(&self, problem_id: i64) -> ServiceResult<SolutionRequest> {
        let snapshot = self
            .repository
            .current_solution_request(problem_id)
            .await?
            .ok_or_else(|| ServiceError::problem_not_found(problem_id))?;

        self.broadcast
            .broadcast_solution(snapshot.clone())
            .await
            .map_err(|e| ServiceError::Publish(format!("snapshot of problem {}: {:#}", problem_id, e)))?;

        Ok(snapshot)
    }

    /// Terminates requests that made no progress within `timeout`
    pub async fn expire_stale_requests(&self, timeout: Duration) -> ServiceResult<usize> {
        let expired = self.repository.refresh_stale_requests(timeout).await?;
        if expired > 0 {
            tracing::info!("Terminated {} stale solve request(s)", expired);
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemorySolverRepository;
    use async_trait::async_trait;
    use router_core::domain::{Depot, LatLng, Problem, Route, Solution, Vehicle};
    use router_core::matrix::{Matrix, ProblemMatrix};
    use router_runner::{SolutionSink, Solver, SolverConfig};
    use std::sync::Mutex;

    struct Idle;

    #[async_trait]
    impl Solver for Idle {
        fn name(&self) -> &str {
            "idle"
        }

        async fn solve(
            &self,
            _initial: Solution,
            _matrix: Arc<dyn Matrix>,
            _config: SolverConfig,
            _sink: SolutionSink,
        ) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorded {
        starts: Mutex<Vec<StartJob>>,
        cancels: Mutex<Vec<CancelJob>>,
        solutions: Mutex<Vec<SolutionEvent>>,
        snapshots: Mutex<Vec<SolutionRequest>>,
    }

    #[async_trait]
    impl SolverEventsPort for Recorded {
        async fn enqueue_request_solver(&self, command: StartJob) -> anyhow::Result<()> {
            self.starts.lock().unwrap().push(command);
            Ok(())
        }

        async fn enqueue_solution_request(&self, event: SolutionEvent) -> anyhow::Result<()> {
            self.solutions.lock().unwrap().push(event);
            Ok(())
        }

        async fn broadcast_cancel_solver(&self, command: CancelJob) -> anyhow::Result<()> {
            self.cancels.lock().unwrap().push(command);
            Ok(())
        }
    }

    #[async_trait]
    impl BroadcastPort for Recorded {
        async fn broadcast_solution(&self, snapshot: SolutionRequest) -> anyhow::Result<()> {
            self.snapshots.lock().unwrap().push(snapshot);
            Ok(())
        }
    }

    fn problem() -> Problem {
        Problem {
            id: 1,
            name: "fixture".to_string(),
            vehicles: vec![Vehicle {
                id: 1,
                name: "truck".to_string(),
                capacity: 10,
                depot: Depot {
                    id: 0,
                    name: "depot".to_string(),
                    lat: 0.0,
                    lng: 0.0,
                },
            }],
            customers: vec![],
        }
    }

    fn setup() -> (SolveRequestService, Arc<Recorded>) {
        let matrix = ProblemMatrix::new(vec![0], vec![0.0], vec![0]).unwrap();
        let repository = Arc::new(InMemorySolverRepository::new().with_problem(problem(), Arc::new(matrix)));
        let recorded = Arc::new(Recorded::default());
        let solvers = Arc::new(SolverRegistry::new().with(Arc::new(Idle)));
        let service = SolveRequestService::new(repository, recorded.clone(), recorded.clone(), solvers);
        (service, recorded)
    }

    fn solved(problem: Arc<Problem>) -> Solution {
        Solution::new(
            problem,
            vec![Route {
                distance: 12.0,
                time: 3.0,
                total_demand: 0,
                order: vec![LatLng::new(0.0, 0.0), LatLng::new(0.0, 0.0)],
                customer_ids: vec![],
            }],
        )
    }

    #[tokio::test]
    async fn test_enqueue_publishes_start_once() {
        let (service, recorded) = setup();

        let key = service.enqueue(1, "idle").await.unwrap().unwrap();
        assert!(service.enqueue(1, "idle").await.unwrap().is_none());

        let starts = recorded.starts.lock().unwrap();
        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].job_key, key);
        assert_eq!(starts[0].solver_name, "idle");
        drop(starts);
        assert_eq!(service.show_status(1).await.unwrap(), SolverStatus::Enqueued);
    }

    #[tokio::test]
    async fn test_enqueue_rejects_unknown_solver_and_problem() {
        let (service, recorded) = setup();

        let err = service.enqueue(1, "missing").await.unwrap_err();
        assert!(matches!(err, ServiceError::UnknownSolver(_)));

        let err = service.enqueue(42, "idle").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        assert!(recorded.starts.lock().unwrap().is_empty());
        assert_eq!(service.show_status(1).await.unwrap(), SolverStatus::NotSolved);
    }

    #[tokio::test]
    async fn test_terminate_running_publishes_cancel() {
        let (service, recorded) = setup();
        let key = service.enqueue(1, "idle").await.unwrap().unwrap();

        service.terminate(key).await.unwrap();
        service.clear(key).await.unwrap();

        let cancels = recorded.cancels.lock().unwrap();
        assert_eq!(cancels.len(), 2);
        assert_eq!(cancels[0].current_status, SolverStatus::Enqueued);
        assert!(!cancels[0].clear);
        assert!(cancels[1].clear);
    }

    #[tokio::test]
    async fn test_clear_after_termination_republishes_solution() {
        let (service, recorded) = setup();
        let key = service.enqueue(1, "idle").await.unwrap().unwrap();
        let problem = recorded.starts.lock().unwrap()[0]
            .detailed_solution
            .solution
            .problem
            .clone();
        service
            .update(SolutionEvent::terminated(key, solved(problem), false))
            .await
            .unwrap();

        service.terminate(key).await.unwrap();
        assert!(recorded.cancels.lock().unwrap().is_empty());
        assert!(recorded.solutions.lock().unwrap().is_empty());

        service.clear(key).await.unwrap();
        let solutions = recorded.solutions.lock().unwrap();
        assert_eq!(solutions.len(), 1);
        assert!(solutions[0].clear);
        assert_eq!(solutions[0].job_key, key);
    }

    #[tokio::test]
    async fn test_unknown_key_is_not_found() {
        let (service, _) = setup();
        let err = service.terminate(JobKey::new()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_persists_and_broadcasts() {
        let (service, recorded) = setup();
        let key = service.enqueue(1, "idle").await.unwrap().unwrap();
        let problem = recorded.starts.lock().unwrap()[0]
            .detailed_solution
            .solution
            .problem
            .clone();

        let snapshot = service
            .update(SolutionEvent::running(key, solved(problem.clone())))
            .await
            .unwrap();
        assert_eq!(snapshot.status, SolverStatus::Running);
        assert_eq!(service.show_status(1).await.unwrap(), SolverStatus::Running);

        let cleared = service
            .update(SolutionEvent::terminated(key, solved(problem), true))
            .await
            .unwrap();
        assert_eq!(cleared.status, SolverStatus::NotSolved);
        assert!(cleared.solution.is_empty());

        let snapshots = recorded.snapshots.lock().unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[1], cleared);
    }

    #[tokio::test]
    async fn test_show_detailed_path_rebroadcasts() {
        let (service, recorded) = setup();

        let snapshot = service.show_detailed_path(1).await.unwrap();
        assert_eq!(snapshot.status, SolverStatus::NotSolved);
        assert_eq!(recorded.snapshots.lock().unwrap().len(), 1);

        assert!(service.show_detailed_path(9).await.is_err());
        assert_eq!(service.solver_names(), vec!["idle".to_string()]);
    }

    #[tokio::test]
    async fn test_expire_stale_requests() {
        let (service, _) = setup();
        service.enqueue(1, "idle").await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        let expired = service
            .expire_stale_requests(Duration::from_millis(5))
            .await
            .unwrap();
        assert_eq!(expired, 1);
        assert_eq!(service.show_status(1).await.unwrap(), SolverStatus::Terminated);
    }
}
