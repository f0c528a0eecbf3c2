//! Router orchestrator
//!
//! Solve request lifecycle for vehicle-routing problems. A
//! [`RoutingNode`] ties the [`SolveRequestService`], the solver queues and
//! the runner's [`router_runner::SolverManager`] together; storage and
//! messaging are reached through the ports in [`repository`] and [`events`].

pub mod config;
pub mod error;
pub mod events;
pub mod node;
pub mod repository;
pub mod service;
pub mod telemetry;
pub mod worker;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use node::RoutingNode;
pub use service::SolveRequestService;
