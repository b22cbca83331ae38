//! Key/value-backed timer store.

use serde_json::Value;

use timerhub_domain::error::TimerHubError;
use timerhub_domain::time::now_ms;
use timerhub_domain::timer::record::{StoredTimers, validate_stored};
use timerhub_domain::timer::{Timer, TimerSource};

use super::encode;
use crate::ports::{KeyValueStore, TimerStore};

/// Stores the card's collection under a single key.
///
/// Content that fails the structural check is deleted and treated as an
/// empty collection rather than reported.
pub struct LocalTimerStore<K> {
    kv: K,
    key: String,
}

impl<K: KeyValueStore> LocalTimerStore<K> {
    pub fn new(kv: K, key: impl Into<String>) -> Self {
        Self { kv, key: key.into() }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    async fn discard(&self, reason: &str) -> Result<Vec<Timer>, TimerHubError> {
        tracing::warn!(key = %self.key, reason, "discarding corrupted timer storage");
        self.kv.delete(&self.key).await?;
        Ok(Vec::new())
    }
}

impl<K: KeyValueStore> TimerStore for LocalTimerStore<K> {
    async fn load(&self) -> Result<Vec<Timer>, TimerHubError> {
        let Some(text) = self.kv.get(&self.key).await? else {
            return Ok(Vec::new());
        };
        let Ok(value) = serde_json::from_str::<Value>(&text) else {
            return self.discard("invalid json").await;
        };
        if !validate_stored(&value) {
            return self.discard("invalid schema").await;
        }
        match serde_json::from_value::<StoredTimers>(value) {
            Ok(stored) => Ok(stored.into_timers(TimerSource::LocalStorage, &self.key)),
            Err(_) => self.discard("undecodable collection").await,
        }
    }

    async fn save(&self, timers: &[Timer]) -> Result<(), TimerHubError> {
        let payload = encode(&StoredTimers::new(timers, now_ms()))?;
        self.kv.set(&self.key, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use timerhub_domain::id::TimerId;
    use timerhub_domain::timer::{TimerPatch, TimerState};

    #[derive(Default)]
    struct InMemoryKv {
        values: Mutex<HashMap<String, String>>,
    }

    impl InMemoryKv {
        fn with(key: &str, value: &str) -> Self {
            let kv = Self::default();
            kv.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            kv
        }

        fn raw(&self, key: &str) -> Option<String> {
            self.values.lock().unwrap().get(key).cloned()
        }
    }

    impl KeyValueStore for InMemoryKv {
        async fn get(&self, key: &str) -> Result<Option<String>, TimerHubError> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: String) -> Result<(), TimerHubError> {
            self.values.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), TimerHubError> {
            self.values.lock().unwrap().remove(key);
            Ok(())
        }
    }

    fn timer(id: &str, end: i64) -> Timer {
        Timer::builder()
            .id(id)
            .label(id)
            .duration(Some(60_000))
            .state(TimerState::Running { end })
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_load_empty_when_nothing_stored() {
        let store = LocalTimerStore::new(InMemoryKv::default(), "card");
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_round_trip_saved_timers() {
        let store = LocalTimerStore::new(InMemoryKv::default(), "card");
        store.save(&[timer("a", 10), timer("b", 20)]).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id.as_str(), "a");
        assert_eq!(loaded[0].source, TimerSource::LocalStorage);
        assert_eq!(loaded[0].source_entity, "card");
        assert_eq!(loaded[1].state, TimerState::Running { end: 20 });
    }

    #[tokio::test]
    async fn should_discard_corrupted_json() {
        let store = LocalTimerStore::new(InMemoryKv::with("card", "{not json"), "card");
        assert!(store.load().await.unwrap().is_empty());
        assert_eq!(store.kv.raw("card"), None);
    }

    #[tokio::test]
    async fn should_discard_structurally_invalid_collection() {
        let store = LocalTimerStore::new(
            InMemoryKv::with("card", r#"{"timers":[{"id":7}]}"#),
            "card",
        );
        assert!(store.load().await.unwrap().is_empty());
        assert_eq!(store.kv.raw("card"), None);
    }

    #[tokio::test]
    async fn should_update_and_remove_by_id() {
        let store = LocalTimerStore::new(InMemoryKv::default(), "card");
        store.save(&[timer("a", 10), timer("b", 20)]).await.unwrap();

        store
            .update(&TimerId::from("a"), TimerPatch::expired_at(99))
            .await
            .unwrap();
        store.remove(&TimerId::from("b")).await.unwrap();
        store.remove(&TimerId::from("missing")).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].expired_at, Some(99));
    }

    #[tokio::test]
    async fn should_persist_paused_timer_with_remaining_as_end() {
        let store = LocalTimerStore::new(InMemoryKv::default(), "card");
        let mut paused = timer("a", 10);
        paused.state = TimerState::Paused { remaining: 4_000 };
        store.save(&[paused]).await.unwrap();

        let raw: Value = serde_json::from_str(&store.kv.raw("card").unwrap()).unwrap();
        assert_eq!(raw["timers"][0]["end"], 4_000);
        assert_eq!(raw["timers"][0]["paused"], true);
        assert_eq!(raw["version"], 1);
    }
}
