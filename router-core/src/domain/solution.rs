//! Solution domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::domain::problem::{LatLng, Problem};
use crate::matrix::Matrix;

/// One vehicle's tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Total distance driven, depot to depot
    pub distance: f64,
    /// Total driving time in milliseconds, the unit of [`Matrix::time`]
    pub time: f64,
    pub total_demand: u32,
    /// Visited coordinates, starting and ending at the depot
    pub order: Vec<LatLng>,
    pub customer_ids: Vec<i64>,
}

/// Immutable snapshot of routes assigned to a problem
///
/// Produced by solver implementations, or by the manager itself when it
/// needs to report the initial solution back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub problem: Arc<Problem>,
    pub routes: Vec<Route>,
}

impl Solution {
    pub fn new(problem: Arc<Problem>, routes: Vec<Route>) -> Self {
        Self { problem, routes }
    }

    /// The "no solution yet" placeholder for a problem
    pub fn empty(problem: Arc<Problem>) -> Self {
        Self::new(problem, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.routes.iter().all(|r| r.order.is_empty())
    }

    /// Every vehicle carries no more than its capacity
    pub fn is_feasible(&self) -> bool {
        self.problem
            .vehicles
            .iter()
            .zip(&self.routes)
            .all(|(vehicle, route)| vehicle.capacity >= route.total_demand)
    }

    /// Total distance over all routes. Lower is better.
    pub fn objective(&self) -> f64 {
        self.routes.iter().map(|r| r.distance).sum()
    }

    /// Objective used to rank solutions: an empty solution ranks as +inf
    pub fn ranking_objective(&self) -> f64 {
        if self.is_empty() {
            f64::INFINITY
        } else {
            self.objective()
        }
    }

    /// Duration of the longest route, in milliseconds
    pub fn total_time(&self) -> f64 {
        self.routes.iter().map(|r| r.time).fold(0.0, f64::max)
    }
}

/// A solution together with the matrix it was computed against
///
/// This is what a "start job" command carries to the solver manager.
#[derive(Clone)]
pub struct DetailedSolution {
    pub solution: Solution,
    pub matrix: Arc<dyn Matrix>,
}

impl DetailedSolution {
    pub fn new(solution: Solution, matrix: Arc<dyn Matrix>) -> Self {
        Self { solution, matrix }
    }
}

impl fmt::Debug for DetailedSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetailedSolution")
            .field("solution", &self.solution)
            .finish_non_exhaustive()
    }
}
