//! Messaging ports
//!
//! Commands travel from the lifecycle service to solver workers through a
//! [`SolverEventsPort`]; durable snapshots reach subscribers through a
//! [`BroadcastPort`]. Delivery is fire-and-forget and at-least-once.

pub mod local;

pub use local::{LocalBroadcast, LocalBus, SolverQueues};

use async_trait::async_trait;
use router_core::domain::SolutionRequest;
use router_core::dto::{CancelJob, SolutionEvent, StartJob};

#[async_trait]
pub trait SolverEventsPort: Send + Sync {
    /// Queues a job launch for one worker
    async fn enqueue_request_solver(&self, command: StartJob) -> anyhow::Result<()>;

    /// Queues a solution update for persistence
    async fn enqueue_solution_request(&self, event: SolutionEvent) -> anyhow::Result<()>;

    /// Delivers a cancel to every worker
    async fn broadcast_cancel_solver(&self, command: CancelJob) -> anyhow::Result<()>;
}

#[async_trait]
pub trait BroadcastPort: Send + Sync {
    async fn broadcast_solution(&self, snapshot: SolutionRequest) -> anyhow::Result<()>;
}
