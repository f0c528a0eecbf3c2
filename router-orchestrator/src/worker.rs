//! Solver queue worker
//!
//! Consumes the solver queues of one node: launches jobs on start commands,
//! forwards their events into the solution queue, routes cancels to the
//! manager and persists every solution update through the service.

use router_core::dto::{CancelJob, SolutionEvent, StartJob};
use router_runner::SolverManager;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::events::SolverQueues;
use crate::service::SolveRequestService;

pub struct SolverWorker {
    manager: Arc<SolverManager>,
    service: Arc<SolveRequestService>,
    solutions: mpsc::Sender<SolutionEvent>,
}

impl SolverWorker {
    /// Creates a worker forwarding job events into `solutions`
    pub fn new(
        manager: Arc<SolverManager>,
        service: Arc<SolveRequestService>,
        solutions: mpsc::Sender<SolutionEvent>,
    ) -> Self {
        Self {
            manager,
            service,
            solutions,
        }
    }

    /// Runs until `shutdown` flips to true or every queue is closed
    pub async fn run(self, mut queues: SolverQueues, mut shutdown: watch::Receiver<bool>) {
        info!("Starting solver worker");

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                Some(command) = queues.cancel_rx.recv() => self.handle_cancel(command),

                Some(command) = queues.start_rx.recv() => self.handle_start(command),

                Some(event) = queues.solution_rx.recv() => self.handle_solution(event).await,

                else => break,
            }
        }

        info!("Solver worker stopped");
    }

    fn handle_start(&self, command: StartJob) {
        debug!(
            "Start command for job {} (problem {})",
            command.job_key, command.problem_id
        );

        let job_key = command.job_key;
        let mut events =
            self.manager
                .solve(job_key, command.detailed_solution, &command.solver_name);
        let solutions = self.solutions.clone();

        tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if solutions.send(event).await.is_err() {
                    warn!("Solution queue closed, dropping events of job {}", job_key);
                    break;
                }
            }
        });
    }

    fn handle_cancel(&self, command: CancelJob) {
        self.manager
            .cancel_solver(command.job_key, command.current_status, command.clear);
    }

    async fn handle_solution(&self, event: SolutionEvent) {
        let job_key = event.job_key;
        match self.service.update(event).await {
            Ok(snapshot) => debug!("Job {} now {:?}", job_key, snapshot.status),
            Err(e) => error!("Failed to store update for job {}: {}", job_key, e),
        }
    }
}
