//! Timer store implementations.
//!
//! - [`LocalTimerStore`] keeps the collection under one key of a
//!   [`KeyValueStore`](crate::ports::KeyValueStore).
//! - [`MessageBusTimerStore`] publishes retained payloads and reads them
//!   back from the sensor the platform mirrors the topic into.
//! - [`HelperTimerStore`] rewrites the JSON state of a text helper entity.
//! - [`CardStore`] selects between the first two from card configuration.

mod helper;
mod local;
mod message_bus;

pub use helper::HelperTimerStore;
pub use local::LocalTimerStore;
pub use message_bus::{MessageBusTimerStore, mirror_snapshot};

use timerhub_domain::config::{CardConfig, StorageKind};
use timerhub_domain::error::TimerHubError;
use timerhub_domain::timer::{Timer, TimerSource};

use crate::ports::{EntityStateReader, KeyValueStore, MessagePublisher, TimerStore};

/// The storage backend a card is configured with.
pub enum CardStore<K, R, B> {
    Local(LocalTimerStore<K>),
    MessageBus(MessageBusTimerStore<R, B>),
}

impl<K, R, B> CardStore<K, R, B>
where
    K: KeyValueStore,
    R: EntityStateReader,
    B: MessagePublisher,
{
    /// Build the backend selected by `config.storage`.
    pub fn from_config(config: &CardConfig, kv: K, reader: R, publisher: B) -> Self {
        match config.storage {
            StorageKind::Local => Self::Local(LocalTimerStore::new(kv, config.storage_key())),
            StorageKind::Mqtt => Self::MessageBus(MessageBusTimerStore::new(
                reader,
                publisher,
                config.mqtt.clone(),
            )),
        }
    }

    /// Source tag and source entity given to timers created in this store.
    #[must_use]
    pub fn target(&self) -> (TimerSource, String) {
        match self {
            Self::Local(store) => (TimerSource::LocalStorage, store.key().to_string()),
            Self::MessageBus(store) => (TimerSource::MessageBus, store.sensor_entity().to_string()),
        }
    }
}

impl<K, R, B> TimerStore for CardStore<K, R, B>
where
    K: KeyValueStore,
    R: EntityStateReader,
    B: MessagePublisher,
{
    async fn load(&self) -> Result<Vec<Timer>, TimerHubError> {
        match self {
            Self::Local(store) => store.load().await,
            Self::MessageBus(store) => store.load().await,
        }
    }

    async fn save(&self, timers: &[Timer]) -> Result<(), TimerHubError> {
        match self {
            Self::Local(store) => store.save(timers).await,
            Self::MessageBus(store) => store.save(timers).await,
        }
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<String, TimerHubError> {
    serde_json::to_string(value).map_err(|err| TimerHubError::Storage(Box::new(err)))
}
