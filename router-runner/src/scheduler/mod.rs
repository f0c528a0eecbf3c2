//! Scheduler layer for the runner
//!
//! This layer owns the solver jobs running in this process: launching them,
//! cancelling them, and tearing them down with the process.

pub mod manager;

pub use manager::{SolutionEvents, SolverManager};
