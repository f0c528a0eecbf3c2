//! Data Transfer Objects for inter-component communication
//!
//! Commands travel from the lifecycle service to whatever hosts the solver
//! manager; solution events travel back. They are fire-and-forget and may be
//! delivered more than once.

pub mod command;

pub use command::{CancelJob, SolutionEvent, StartJob};
