//! Storage-specific error type wrapping filesystem errors.

use timerhub_domain::error::TimerHubError;

/// Errors originating from the file storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading, writing or renaming a file failed.
    #[error("filesystem error")]
    Io(#[from] std::io::Error),

    /// The key cannot be mapped to a file name.
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
}

impl From<StorageError> for TimerHubError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
