//! Key/value port backing the local timer store.

use std::future::Future;
use std::sync::Arc;

use timerhub_domain::error::TimerHubError;

/// String key/value persistence, one value per card storage key.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, TimerHubError>> + Send;

    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), TimerHubError>> + Send;

    /// Remove `key`; removing a missing key is not an error.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), TimerHubError>> + Send;
}

impl<T: KeyValueStore> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, TimerHubError>> + Send {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), TimerHubError>> + Send {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), TimerHubError>> + Send {
        (**self).delete(key)
    }
}
