//! Core domain types
//!
//! This module contains the core structures used across the router crates.
//! They are shared between the lifecycle service (which persists them) and
//! the solver manager (which produces new solutions from them).

pub mod problem;
pub mod request;
pub mod solution;

pub use problem::{Customer, Depot, LatLng, Location, Problem, Vehicle};
pub use request::{JobKey, SolutionRequest, SolveRequest, SolverStatus};
pub use solution::{DetailedSolution, Route, Solution};
