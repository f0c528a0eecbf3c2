//! Candidate solution channel between a solver and the pipeline

use router_core::domain::Solution;
use std::fmt;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::cancel::CancelSignal;

/// Returned by [`SolutionSink::emit`] once the job no longer accepts candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkClosed;

impl fmt::Display for SinkClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("solution sink closed")
    }
}

impl std::error::Error for SinkClosed {}

/// Write end of a job's raw solution stream
///
/// The channel is bounded: `emit` suspends while the pipeline is busy, so a
/// solver can never run ahead of its consumer by more than the buffer.
#[derive(Debug)]
pub struct SolutionSink {
    tx: mpsc::Sender<Solution>,
    cancel: CancelSignal,
    deadline: Instant,
}

impl SolutionSink {
    pub fn new(tx: mpsc::Sender<Solution>, cancel: CancelSignal, deadline: Instant) -> Self {
        Self {
            tx,
            cancel,
            deadline,
        }
    }

    /// Hands a candidate to the pipeline
    pub async fn emit(&self, solution: Solution) -> Result<(), SinkClosed> {
        if self.cancel.is_cancelled() {
            return Err(SinkClosed);
        }
        self.tx.send(solution).await.map_err(|_| SinkClosed)
    }

    /// Blocking variant of [`emit`](Self::emit) for solvers running on a
    /// blocking thread
    ///
    /// Must not be called from inside the async runtime.
    pub fn emit_blocking(&self, solution: Solution) -> Result<(), SinkClosed> {
        if self.cancel.is_cancelled() {
            return Err(SinkClosed);
        }
        self.tx.blocking_send(solution).map_err(|_| SinkClosed)
    }

    /// Cancellation was requested, or the pipeline stopped listening
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }

    /// Resolves once cancellation is requested
    pub async fn cancelled(&self) {
        let mut signal = self.cancel.clone();
        tokio::select! {
            _ = signal.cancelled() => {}
            _ = self.tx.closed() => {}
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Should the solver keep going
    pub fn should_continue(&self) -> bool {
        !self.is_cancelled() && !self.is_expired()
    }
}
