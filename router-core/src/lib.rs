//! Router Core
//!
//! Core types and abstractions for the vehicle-routing solve orchestrator.
//!
//! This crate contains:
//! - Domain types: problems, solutions, solve requests and their status
//! - DTOs: commands and events exchanged between the lifecycle service and the solver manager
//! - Matrices: distance/time lookups, including the memoizing wrapper solvers query

pub mod domain;
pub mod dto;
pub mod error;
pub mod matrix;

pub use error::{Error, Result};
