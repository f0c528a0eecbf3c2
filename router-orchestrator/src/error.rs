//! Service error type

use router_core::domain::JobKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("unknown solver '{0}'")]
    UnknownSolver(String),

    #[error("repository error: {0:#}")]
    Repository(#[from] anyhow::Error),

    #[error(transparent)]
    Core(#[from] router_core::Error),

    #[error("failed to publish {0}")]
    Publish(String),
}

impl ServiceError {
    pub fn problem_not_found(problem_id: i64) -> Self {
        Self::NotFound(format!("problem {}", problem_id))
    }

    pub fn request_not_found(job_key: JobKey) -> Self {
        Self::NotFound(format!("solve request {}", job_key))
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
