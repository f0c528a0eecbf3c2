//! Solver contract
//!
//! Every pluggable routing algorithm implements [`Solver`]. An invocation
//! receives the job's initial solution, a matrix, a [`SolverConfig`] and a
//! [`SolutionSink`] it writes candidate solutions into. The sequence ends
//! when `solve` returns.
//!
//! Solvers are not required to improve monotonically; the manager's
//! pipeline keeps only strictly better candidates. They are required to
//! stop on their own, either when the sink's deadline passes or when the
//! sink reports cancellation.

mod cancel;
mod registry;
mod sink;

pub use cancel::{CancelHandle, CancelRequest, CancelSignal, cancel_pair};
pub use registry::SolverRegistry;
pub use sink::{SinkClosed, SolutionSink};

use async_trait::async_trait;
use router_core::domain::Solution;
use router_core::matrix::Matrix;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Configuration handed to every solver invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Wall-clock budget of one invocation
    pub time_limit: Duration,
}

impl SolverConfig {
    pub fn new(time_limit: Duration) -> Self {
        Self { time_limit }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

/// A pluggable routing algorithm
#[async_trait]
pub trait Solver: Send + Sync {
    /// Name used to select this solver in solve requests
    fn name(&self) -> &str;

    /// Produces candidate solutions into `sink` until the budget is spent,
    /// cancellation is observed, or the algorithm has nothing left to try
    ///
    /// Each call starts from scratch. An `Err` ends the job abnormally; the
    /// best candidate emitted so far is still reported. Propagating
    /// [`SinkClosed`] from `sink.emit` is treated as a normal stop.
    async fn solve(
        &self,
        initial: Solution,
        matrix: Arc<dyn Matrix>,
        config: SolverConfig,
        sink: SolutionSink,
    ) -> anyhow::Result<()>;
}
