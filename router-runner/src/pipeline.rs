//! Best-solution reduction pipeline
//!
//! Sits between a solver's raw output and the outside world. Whatever the
//! solver emits, the pipeline only lets through strictly improving,
//! non-empty solutions, and always closes a job with exactly one
//! TERMINATED event.

use router_core::domain::{JobKey, Solution};
use router_core::dto::SolutionEvent;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::solver::CancelSignal;

/// Best-so-far accumulator with objective deduplication
#[derive(Debug, Clone)]
pub struct BestSolutionReducer {
    best: Solution,
    last_emitted: Option<f64>,
}

impl BestSolutionReducer {
    /// Seeds the accumulator with the job's initial solution
    pub fn new(initial: Solution) -> Self {
        Self {
            best: initial,
            last_emitted: None,
        }
    }

    /// Offers a raw candidate
    ///
    /// Returns the new best when the candidate is non-empty and strictly
    /// lower than the accumulator, and its objective differs from the last
    /// value returned. Everything else is noise and is dropped.
    pub fn offer(&mut self, candidate: Solution) -> Option<Solution> {
        if candidate.is_empty() {
            return None;
        }

        let objective = candidate.objective();
        if objective.is_nan() || objective >= self.best.ranking_objective() {
            return None;
        }

        self.best = candidate;
        if self.last_emitted == Some(objective) {
            return None;
        }
        self.last_emitted = Some(objective);
        Some(self.best.clone())
    }

    pub fn best(&self) -> &Solution {
        &self.best
    }

    pub fn into_best(self) -> Solution {
        self.best
    }
}

/// How a pipeline run ended
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Final accumulator value, carried by the TERMINATED event
    pub best: Solution,
    pub clear: bool,
    /// Stopped by a cancel request rather than by the solver finishing
    pub cancelled: bool,
}

/// Drives one job's raw stream through a [`BestSolutionReducer`]
///
/// Emits a RUNNING event per improvement and, once the raw stream ends or
/// cancellation is observed, exactly one TERMINATED event. Dropping `raw` on
/// return is what tells a still-running solver to stop.
pub async fn run_pipeline(
    job_key: JobKey,
    initial: Solution,
    mut raw: mpsc::Receiver<Solution>,
    mut cancel: CancelSignal,
    events: &mpsc::Sender<SolutionEvent>,
) -> PipelineOutcome {
    let mut reducer = BestSolutionReducer::new(initial);

    let (clear, cancelled) = loop {
        tokio::select! {
            biased;

            request = cancel.cancelled() => {
                info!("Job {} cancelled (clear: {})", job_key, request.clear);
                break (request.clear, true);
            }

            candidate = raw.recv() => match candidate {
                Some(candidate) => {
                    let Some(best) = reducer.offer(candidate) else {
                        continue;
                    };
                    debug!("Job {} improved to {:.2}", job_key, best.objective());
                    if events.send(SolutionEvent::running(job_key, best)).await.is_err() {
                        warn!("Event consumer for job {} is gone, stopping solver", job_key);
                        break (false, true);
                    }
                }
                None => {
                    let clear = cancel.requested().is_some_and(|r| r.clear);
                    break (clear, false);
                }
            },
        }
    };
    drop(raw);

    let best = reducer.into_best();
    info!(
        "Job {} terminated with objective {:.2}",
        job_key,
        best.ranking_objective()
    );
    if events
        .send(SolutionEvent::terminated(job_key, best.clone(), clear))
        .await
        .is_err()
    {
        debug!("Terminal event for job {} had no consumer", job_key);
    }

    PipelineOutcome {
        best,
        clear,
        cancelled,
    }
}
