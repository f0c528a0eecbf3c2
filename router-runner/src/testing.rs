//! Fixtures shared by the runner's unit tests

use async_trait::async_trait;
use router_core::domain::{Depot, LatLng, Problem, Route, Solution, Vehicle};
use router_core::matrix::Matrix;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::solver::{SolutionSink, Solver, SolverConfig};

pub fn problem() -> Arc<Problem> {
    Arc::new(Problem {
        id: 1,
        name: "fixture".to_string(),
        vehicles: vec![Vehicle {
            id: 1,
            name: "truck".to_string(),
            capacity: 100,
            depot: Depot {
                id: 0,
                name: "depot".to_string(),
                lat: 0.0,
                lng: 0.0,
            },
        }],
        customers: vec![],
    })
}

/// Single-route solution whose objective is `objective`
pub fn with_objective(objective: f64) -> Solution {
    Solution::new(
        problem(),
        vec![Route {
            distance: objective,
            time: 1.0,
            total_demand: 1,
            order: vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)],
            customer_ids: vec![1],
        }],
    )
}

/// What a [`ScriptedSolver`] does once its script is exhausted
#[derive(Debug, Clone, Copy)]
pub enum Then {
    Finish,
    Fail,
    Panic,
    WaitForCancel,
}

/// Emits a fixed list of objectives, then finishes, fails, panics or idles
pub struct ScriptedSolver {
    pub name: &'static str,
    pub objectives: Vec<f64>,
    pub delay: Duration,
    pub then: Then,
    pub calls: AtomicUsize,
}

impl ScriptedSolver {
    pub fn new(name: &'static str, objectives: &[f64], then: Then) -> Self {
        Self {
            name,
            objectives: objectives.to_vec(),
            delay: Duration::ZERO,
            then,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Solver for ScriptedSolver {
    fn name(&self) -> &str {
        self.name
    }

    async fn solve(
        &self,
        _initial: Solution,
        _matrix: Arc<dyn Matrix>,
        _config: SolverConfig,
        sink: SolutionSink,
    ) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        for objective in &self.objectives {
            if !self.delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.delay) => {}
                    _ = sink.cancelled() => return Ok(()),
                }
            }
            sink.emit(with_objective(*objective)).await?;
        }

        match self.then {
            Then::Finish => Ok(()),
            Then::Fail => anyhow::bail!("scripted failure"),
            Then::Panic => panic!("scripted panic"),
            Then::WaitForCancel => {
                sink.cancelled().await;
                Ok(())
            }
        }
    }
}
