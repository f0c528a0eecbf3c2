//! Routing node
//!
//! Wires the lifecycle service, the solver manager and the local bus into
//! one running unit, with a background sweeper terminating stale requests.

use router_core::domain::SolutionRequest;
use router_runner::{SolverManager, SolverRegistry};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::events::{LocalBroadcast, LocalBus};
use crate::repository::SolverRepository;
use crate::service::SolveRequestService;
use crate::worker::SolverWorker;

pub struct RoutingNode {
    config: Config,
    service: Arc<SolveRequestService>,
    manager: Arc<SolverManager>,
    broadcast: LocalBroadcast,
    shutdown_tx: watch::Sender<bool>,
    worker: JoinHandle<()>,
    sweeper: JoinHandle<()>,
}

impl RoutingNode {
    /// Validates `config` and starts the worker and sweeper tasks
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: Config,
        solvers: SolverRegistry,
        repository: Arc<dyn SolverRepository>,
    ) -> anyhow::Result<Self> {
        config.validate()?;

        let solvers = Arc::new(solvers);
        let (bus, queues) = LocalBus::new(config.event_queue_size);
        let broadcast = LocalBroadcast::new(config.event_queue_size);

        let manager = Arc::new(
            SolverManager::new(Arc::clone(&solvers), config.solver_config())
                .with_event_buffer(config.event_queue_size)
                .with_blacklist_ttl(config.stale_request_timeout),
        );
        let solution_tx = bus.solution_sender();
        let service = Arc::new(SolveRequestService::new(
            repository,
            Arc::new(bus),
            Arc::new(broadcast.clone()),
            solvers,
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = SolverWorker::new(Arc::clone(&manager), Arc::clone(&service), solution_tx);
        let worker = tokio::spawn(worker.run(queues, shutdown_rx.clone()));
        let sweeper = start_sweeper(&config, Arc::clone(&service), shutdown_rx);

        info!(
            "Routing node {} started with solvers {:?}",
            config.node_id,
            service.solver_names()
        );

        Ok(Self {
            config,
            service,
            manager,
            broadcast,
            shutdown_tx,
            worker,
            sweeper,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn service(&self) -> &SolveRequestService {
        &self.service
    }

    pub fn manager(&self) -> &SolverManager {
        &self.manager
    }

    /// Receives every snapshot broadcast after this call
    pub fn subscribe(&self) -> broadcast::Receiver<SolutionRequest> {
        self.broadcast.subscribe()
    }

    /// Cancels running jobs and stops the background tasks
    ///
    /// Updates still queued when the worker stops are not persisted; the
    /// sweeper of the next run terminates their requests.
    pub async fn shutdown(self) {
        info!("Shutting down routing node {}", self.config.node_id);

        self.manager.destroy();
        let _ = self.shutdown_tx.send(true);

        for (name, handle) in [("worker", self.worker), ("sweeper", self.sweeper)] {
            if let Err(e) = handle.await {
                warn!("Node {} task failed: {}", name, e);
            }
        }
    }
}

/// Periodically terminates requests that stopped making progress
fn start_sweeper(
    config: &Config,
    service: Arc<SolveRequestService>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let period = config.sweep_interval;
    let timeout = config.stale_request_timeout;

    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    debug!("Sweeping stale solve requests");

                    if let Err(e) = service.expire_stale_requests(timeout).await {
                        warn!("Failed to sweep stale requests: {}", e);
                    }
                }
            }
        }
    })
}
