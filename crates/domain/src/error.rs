//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`TimerHubError`] via `#[from]` (or an explicit `into_domain`).

/// Top-level error shared by every port and service.
#[derive(Debug, thiserror::Error)]
pub enum TimerHubError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// User input or configuration that violates a domain invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("duration must be a positive number of milliseconds")]
    NonPositiveDuration,

    #[error("duration must not exceed 24 hours")]
    DurationTooLong,

    #[error("could not parse duration {0:?}")]
    UnparseableDuration(String),

    #[error("label must be at most {max} characters, got {actual}")]
    LabelTooLong { max: usize, actual: usize },

    #[error("timer id must not be empty")]
    EmptyTimerId,

    #[error("entity id must not be empty")]
    EmptyEntityId,
}

/// A lookup that found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
