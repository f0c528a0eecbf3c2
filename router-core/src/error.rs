//! Error types shared by the router crates

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by core lookups and constructors
#[derive(Debug, Error)]
pub enum Error {
    /// A location id, job key, problem id or solver name has no matching record
    #[error("Not found: {0}")]
    NotFound(String),

    /// Matrix arrays do not describe a square relation over the location ids
    #[error("Invalid matrix: {0}")]
    InvalidMatrix(String),
}

impl Error {
    /// Create a not found error for an unknown location id
    pub fn unknown_location(id: i64) -> Self {
        Self::NotFound(format!("location {}", id))
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
