//! Solver manager
//!
//! Keeps the table of live jobs. Each `solve` call launches one task that
//! runs a solver and feeds its output through the reduction pipeline; the
//! task removes its own table entry once its TERMINATED event is out.
//!
//! Keys cancelled while still ENQUEUED land on a blacklist, so the launch
//! that arrives later resolves to an immediate TERMINATED event instead of
//! starting a solver.

use router_core::domain::{DetailedSolution, JobKey, SolverStatus};
use router_core::dto::SolutionEvent;
use router_core::matrix::{CachedMatrix, Matrix};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::pipeline::run_pipeline;
use crate::solver::{
    CancelHandle, CancelSignal, SinkClosed, SolutionSink, Solver, SolverConfig, SolverRegistry,
    cancel_pair,
};

/// Buffered candidates between a solver and its pipeline
const RAW_SOLUTION_BUFFER: usize = 1;

/// Default number of buffered events between a job and its consumer
const DEFAULT_EVENT_BUFFER: usize = 16;

/// Default lifetime of a blacklist entry whose start never arrives
const DEFAULT_BLACKLIST_TTL: Duration = Duration::from_secs(600);

/// Lifecycle events of one job, in order
///
/// Ends after the job's TERMINATED event. An empty stream means the
/// request started nothing new.
#[derive(Debug)]
pub struct SolutionEvents {
    rx: mpsc::Receiver<SolutionEvent>,
}

impl SolutionEvents {
    fn empty() -> Self {
        let (_, rx) = mpsc::channel(1);
        Self { rx }
    }

    fn single(event: SolutionEvent) -> Self {
        let (tx, rx) = mpsc::channel(1);
        // Capacity 1 on a fresh channel, cannot be full
        let _ = tx.try_send(event);
        Self { rx }
    }

    pub async fn next(&mut self) -> Option<SolutionEvent> {
        self.rx.recv().await
    }

    /// Drains the stream until the job is done
    pub async fn collect(mut self) -> Vec<SolutionEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.rx.recv().await {
            events.push(event);
        }
        events
    }
}

#[derive(Default)]
struct RegistryState {
    jobs: HashMap<JobKey, CancelHandle>,
    /// Keys cancelled before launch, with the time they were blacklisted
    blacklist: HashMap<JobKey, Instant>,
    shut_down: bool,
}

impl RegistryState {
    fn prune_blacklist(&mut self, ttl: Duration) {
        let before = self.blacklist.len();
        self.blacklist.retain(|_, since| since.elapsed() < ttl);
        let pruned = before - self.blacklist.len();
        if pruned > 0 {
            debug!("Expired {} blacklist entries", pruned);
        }
    }
}

fn lock(state: &Mutex<RegistryState>) -> MutexGuard<'_, RegistryState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns every solver job running in this process
pub struct SolverManager {
    solvers: Arc<SolverRegistry>,
    config: SolverConfig,
    event_buffer: usize,
    blacklist_ttl: Duration,
    state: Arc<Mutex<RegistryState>>,
}

impl SolverManager {
    pub fn new(solvers: Arc<SolverRegistry>, config: SolverConfig) -> Self {
        Self {
            solvers,
            config,
            event_buffer: DEFAULT_EVENT_BUFFER,
            blacklist_ttl: DEFAULT_BLACKLIST_TTL,
            state: Arc::new(Mutex::new(RegistryState::default())),
        }
    }

    /// Number of events a job may get ahead of its consumer before pausing
    pub fn with_event_buffer(mut self, event_buffer: usize) -> Self {
        self.event_buffer = event_buffer.max(1);
        self
    }

    /// How long a blacklisted key waits for its start command
    ///
    /// A cancel can reach this manager after its job already ran here; such
    /// an entry is never consumed and expires instead.
    pub fn with_blacklist_ttl(mut self, ttl: Duration) -> Self {
        self.blacklist_ttl = ttl;
        self
    }

    /// Starts solving under `job_key`
    ///
    /// - Key already running: returns an empty stream, nothing is restarted.
    /// - Key blacklisted: consumes the entry and returns a single TERMINATED
    ///   event carrying the untouched initial solution. No solver runs.
    ///   Entries older than the blacklist ttl no longer count.
    /// - Unknown solver: logs and returns the same single TERMINATED event.
    /// - Otherwise: launches the job and returns its event stream.
    ///
    /// Must be called from within a tokio runtime.
    pub fn solve(
        &self,
        job_key: JobKey,
        detailed: DetailedSolution,
        solver_name: &str,
    ) -> SolutionEvents {
        let mut state = lock(&self.state);

        if state.shut_down {
            warn!("Manager is shut down, ignoring job {}", job_key);
            return SolutionEvents::empty();
        }

        state.prune_blacklist(self.blacklist_ttl);
        if state.blacklist.remove(&job_key).is_some() {
            info!("Job {} was cancelled before it started", job_key);
            return SolutionEvents::single(SolutionEvent::terminated(
                job_key,
                detailed.solution,
                false,
            ));
        }

        if state.jobs.contains_key(&job_key) {
            debug!("Job {} is already running, ignoring duplicate start", job_key);
            return SolutionEvents::empty();
        }

        let solver = match self.solvers.get(solver_name) {
            Ok(solver) => solver,
            Err(e) => {
                error!("Cannot start job {}: {}", job_key, e);
                return SolutionEvents::single(SolutionEvent::terminated(
                    job_key,
                    detailed.solution,
                    false,
                ));
            }
        };

        let (handle, signal) = cancel_pair();
        let (events_tx, events_rx) = mpsc::channel(self.event_buffer);
        state.jobs.insert(job_key, handle);
        drop(state);

        tokio::spawn(run_job(
            Arc::clone(&self.state),
            job_key,
            solver,
            detailed,
            self.config,
            signal,
            events_tx,
        ));

        SolutionEvents { rx: events_rx }
    }

    /// Requests that `job_key` stops, or never starts
    ///
    /// `current_status` is the request status the caller saw. ENQUEUED
    /// blacklists the key unless its job is already live here, in which case
    /// the job is cancelled like a RUNNING one. RUNNING signals the job and
    /// returns without waiting; the job's stream ends with a TERMINATED event
    /// carrying `clear`.
    pub fn cancel_solver(&self, job_key: JobKey, current_status: SolverStatus, clear: bool) {
        let mut state = lock(&self.state);
        state.prune_blacklist(self.blacklist_ttl);

        match current_status {
            SolverStatus::Enqueued | SolverStatus::Running => {
                if let Some(handle) = state.jobs.get(&job_key) {
                    info!("Cancelling job {} (clear: {})", job_key, clear);
                    handle.cancel(clear);
                } else if current_status == SolverStatus::Enqueued {
                    info!("Blacklisting job {} before launch", job_key);
                    state.blacklist.insert(job_key, Instant::now());
                } else {
                    debug!("Job {} is not running here", job_key);
                }
            }
            other => {
                debug!("Nothing to cancel for job {} in status {:?}", job_key, other);
            }
        }
    }

    /// Cancels every running job and forgets the blacklist
    ///
    /// Later `solve` calls start nothing. Meant for process shutdown.
    pub fn destroy(&self) {
        let mut state = lock(&self.state);
        state.shut_down = true;
        info!("Shutting down solver manager with {} running job(s)", state.jobs.len());
        for handle in state.jobs.values() {
            handle.cancel(false);
        }
        state.blacklist.clear();
    }

    pub fn is_running(&self, job_key: &JobKey) -> bool {
        lock(&self.state).jobs.contains_key(job_key)
    }

    pub fn is_blacklisted(&self, job_key: &JobKey) -> bool {
        lock(&self.state)
            .blacklist
            .get(job_key)
            .is_some_and(|since| since.elapsed() < self.blacklist_ttl)
    }

    pub fn running_jobs(&self) -> Vec<JobKey> {
        lock(&self.state).jobs.keys().copied().collect()
    }
}

impl Drop for SolverManager {
    fn drop(&mut self) {
        for handle in lock(&self.state).jobs.values() {
            handle.cancel(false);
        }
    }
}

/// Body of one job task
async fn run_job(
    state: Arc<Mutex<RegistryState>>,
    job_key: JobKey,
    solver: Arc<dyn Solver>,
    detailed: DetailedSolution,
    config: SolverConfig,
    signal: CancelSignal,
    events: mpsc::Sender<SolutionEvent>,
) {
    let solver_name = solver.name().to_string();
    let initial = detailed.solution;
    let matrix: Arc<dyn Matrix> = Arc::new(CachedMatrix::new(detailed.matrix));

    let (raw_tx, raw_rx) = mpsc::channel(RAW_SOLUTION_BUFFER);
    let sink = SolutionSink::new(raw_tx, signal.clone(), Instant::now() + config.time_limit);

    info!("Starting job {} with solver '{}'", job_key, solver_name);
    let solver_initial = initial.clone();
    let solver_task =
        tokio::spawn(async move { solver.solve(solver_initial, matrix, config, sink).await });

    let outcome = run_pipeline(job_key, initial, raw_rx, signal, &events).await;

    match solver_task.await {
        Ok(Ok(())) => debug!("Solver '{}' finished job {}", solver_name, job_key),
        Ok(Err(e)) if e.downcast_ref::<SinkClosed>().is_some() => {
            debug!("Solver '{}' stopped on closed sink for job {}", solver_name, job_key)
        }
        Ok(Err(e)) => error!(
            "Solver '{}' failed on job {}: {:#}",
            solver_name, job_key, e
        ),
        Err(e) if e.is_panic() => error!("Solver '{}' panicked on job {}", solver_name, job_key),
        Err(e) => warn!("Solver task for job {} did not complete: {}", job_key, e),
    }

    lock(&state).jobs.remove(&job_key);
    info!(
        "Job {} removed from registry (cancelled: {}, objective: {:.2})",
        job_key,
        outcome.cancelled,
        outcome.best.ranking_objective()
    );

    // The stream ends only once the key is free again
    drop(events);
}
