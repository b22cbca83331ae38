//! Audio adapter error types.

use std::time::Duration;

use timerhub_domain::error::TimerHubError;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// The player could not be started or waited on.
    #[error("failed to run audio command")]
    Spawn(#[source] std::io::Error),

    #[error("audio command exited with status {0:?}")]
    Exit(Option<i32>),

    #[error("audio command did not finish within {0:?}")]
    Timeout(Duration),

    /// A platform-relative URL whose directory is not configured.
    #[error("cannot resolve sound location {0}")]
    Unresolvable(String),
}

impl From<AudioError> for TimerHubError {
    fn from(err: AudioError) -> Self {
        Self::Storage(Box::new(err))
    }
}
