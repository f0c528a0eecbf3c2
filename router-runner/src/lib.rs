//! Router runner
//!
//! Runs solver jobs in-process. [`solver`] defines the contract every
//! routing algorithm implements, [`pipeline`] reduces a solver's raw output
//! to a stream of strict improvements, and [`scheduler`] owns the jobs.

pub mod pipeline;
pub mod scheduler;
pub mod solver;

#[cfg(test)]
mod testing;

pub use scheduler::{SolutionEvents, SolverManager};
pub use solver::{SolutionSink, Solver, SolverConfig, SolverRegistry};
