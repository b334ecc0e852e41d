//! Scheduler error types

use eventhub_domain::EventHubError;
use thiserror::Error;

use crate::errors::InfraError;

/// Errors raised while managing background jobs
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler already running")]
    AlreadyRunning,

    #[error("Scheduler not running")]
    NotRunning,

    #[error("Failed to create scheduler: {0}")]
    CreationFailed(String),

    #[error("Failed to start scheduler: {0}")]
    StartFailed(String),

    #[error("Failed to stop scheduler: {0}")]
    StopFailed(String),

    /// Bad cron expression or rejected job
    #[error("Failed to register job: {0}")]
    JobRegistrationFailed(String),

    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let inner = match err {
            SchedulerError::JobRegistrationFailed(_) => EventHubError::Config(err.to_string()),
            _ => EventHubError::Internal(err.to_string()),
        };
        InfraError(inner)
    }
}

impl From<SchedulerError> for EventHubError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
