//! Service layer for the routing node
//!
//! This layer contains the solve request lifecycle and sits between the
//! ports and whatever front end drives the node.

pub mod solver;

pub use solver::SolveRequestService;
