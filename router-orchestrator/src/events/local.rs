//! In-process message bus
//!
//! Bounded tokio channels standing in for a broker when every component
//! lives in one process.

use anyhow::anyhow;
use async_trait::async_trait;
use router_core::domain::SolutionRequest;
use router_core::dto::{CancelJob, SolutionEvent, StartJob};
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use super::{BroadcastPort, SolverEventsPort};

/// Sending half of the solver queues
#[derive(Debug, Clone)]
pub struct LocalBus {
    start_tx: mpsc::Sender<StartJob>,
    cancel_tx: mpsc::Sender<CancelJob>,
    solution_tx: mpsc::Sender<SolutionEvent>,
}

/// Receiving half of the solver queues, consumed by a worker
#[derive(Debug)]
pub struct SolverQueues {
    pub start_rx: mpsc::Receiver<StartJob>,
    pub cancel_rx: mpsc::Receiver<CancelJob>,
    pub solution_rx: mpsc::Receiver<SolutionEvent>,
}

impl LocalBus {
    /// Creates the three queues, each holding up to `capacity` messages
    pub fn new(capacity: usize) -> (Self, SolverQueues) {
        let capacity = capacity.max(1);
        let (start_tx, start_rx) = mpsc::channel(capacity);
        let (cancel_tx, cancel_rx) = mpsc::channel(capacity);
        let (solution_tx, solution_rx) = mpsc::channel(capacity);

        (
            Self {
                start_tx,
                cancel_tx,
                solution_tx,
            },
            SolverQueues {
                start_rx,
                cancel_rx,
                solution_rx,
            },
        )
    }

    /// Sender a worker uses to forward job events into the solution queue
    pub fn solution_sender(&self) -> mpsc::Sender<SolutionEvent> {
        self.solution_tx.clone()
    }
}

#[async_trait]
impl SolverEventsPort for LocalBus {
    async fn enqueue_request_solver(&self, command: StartJob) -> anyhow::Result<()> {
        self.start_tx
            .send(command)
            .await
            .map_err(|_| anyhow!("start queue closed"))
    }

    async fn enqueue_solution_request(&self, event: SolutionEvent) -> anyhow::Result<()> {
        self.solution_tx
            .send(event)
            .await
            .map_err(|_| anyhow!("solution queue closed"))
    }

    async fn broadcast_cancel_solver(&self, command: CancelJob) -> anyhow::Result<()> {
        self.cancel_tx
            .send(command)
            .await
            .map_err(|_| anyhow!("cancel queue closed"))
    }
}

/// Fans snapshots out to every current subscriber
///
/// Slow subscribers miss snapshots rather than stall the publisher.
#[derive(Debug, Clone)]
pub struct LocalBroadcast {
    tx: broadcast::Sender<SolutionRequest>,
}

impl LocalBroadcast {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SolutionRequest> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl BroadcastPort for LocalBroadcast {
    async fn broadcast_solution(&self, snapshot: SolutionRequest) -> anyhow::Result<()> {
        // No subscribers is not an error
        if let Err(e) = self.tx.send(snapshot) {
            debug!("No subscriber for snapshot of problem {}", e.0.solution.problem.id);
        }
        Ok(())
    }
}
