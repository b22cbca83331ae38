//! # timerhub-adapter-storage-file
//!
//! Key/value persistence on the local filesystem.
//!
//! ## Responsibilities
//! - Implement [`KeyValueStore`] from `timerhub-app::ports`
//! - Map each key to `<dir>/<key>.json`
//! - Replace files atomically (write to a sibling temp file, then rename)
//!
//! ## Dependency rule
//! Depends on `timerhub-app` (for port traits) and `timerhub-domain` (for
//! error types). The `app` and `domain` crates must never reference this adapter.

mod error;

pub use error::StorageError;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use timerhub_app::ports::KeyValueStore;
use timerhub_domain::error::TimerHubError;

/// Stores each value in its own file under a data directory.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Open (and create if needed) the store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!(dir = %dir.display(), "opened file store");
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path(key)?).await {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, key: &str, value: String) -> Result<(), StorageError> {
        let path = self.path(key)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path(key)?).await {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, TimerHubError> {
        Ok(self.read(key).await?)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), TimerHubError> {
        Ok(self.write(key, value).await?)
    }

    async fn delete(&self, key: &str) -> Result<(), TimerHubError> {
        Ok(self.remove(key).await?)
    }
}
