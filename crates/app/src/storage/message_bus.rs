//! Message-bus timer store.
//!
//! Writes go out as two retained messages: the full collection on `topic`
//! and a small `{version, timestamp}` marker on the state topic. Reads come
//! back through the platform's mirror sensor, so a write is only visible
//! once the bus has delivered it.

use serde_json::Value;

use timerhub_domain::config::MqttTopics;
use timerhub_domain::entity::EntitySnapshot;
use timerhub_domain::error::TimerHubError;
use timerhub_domain::time::{Millis, now_ms};
use timerhub_domain::timer::record::{SCHEMA_VERSION, StoreMarker, StoredTimers};
use timerhub_domain::timer::{Timer, TimerSource};

use super::encode;
use crate::ports::{EntityStateReader, MessagePublisher, TimerStore};
use crate::sources::mirrored_timers;

pub struct MessageBusTimerStore<R, B> {
    reader: R,
    publisher: B,
    topics: MqttTopics,
}

impl<R, B> MessageBusTimerStore<R, B>
where
    R: EntityStateReader,
    B: MessagePublisher,
{
    pub fn new(reader: R, publisher: B, topics: MqttTopics) -> Self {
        Self {
            reader,
            publisher,
            topics,
        }
    }

    #[must_use]
    pub fn sensor_entity(&self) -> &str {
        &self.topics.sensor_entity
    }
}

impl<R, B> TimerStore for MessageBusTimerStore<R, B>
where
    R: EntityStateReader,
    B: MessagePublisher,
{
    async fn load(&self) -> Result<Vec<Timer>, TimerHubError> {
        let snapshot = self.reader.entity(&self.topics.sensor_entity).await?;
        Ok(snapshot
            .map(|s| mirrored_timers(&s, TimerSource::MessageBus))
            .unwrap_or_default())
    }

    async fn save(&self, timers: &[Timer]) -> Result<(), TimerHubError> {
        let now = now_ms();
        let payload = encode(&StoredTimers::new(timers, now))?;
        self.publisher.publish(&self.topics.topic, payload, true).await?;

        let marker = encode(&StoreMarker {
            version: SCHEMA_VERSION,
            timestamp: now,
        })?;
        self.publisher
            .publish(&self.topics.state_topic(), marker, true)
            .await?;
        tracing::debug!(topic = %self.topics.topic, count = timers.len(), "published timers");
        Ok(())
    }
}

/// Build the sensor snapshot a platform mirror exposes for a payload
/// received on the storage topic: state is the timer count, the raw records
/// go into the `timers` attribute.
///
/// Returns `None` when the payload is not a stored-timers document.
#[must_use]
pub fn mirror_snapshot(sensor_entity: &str, payload: &str, now: Millis) -> Option<EntitySnapshot> {
    let value: Value = serde_json::from_str(payload).ok()?;
    let timers = value.get("timers")?.as_array()?.clone();
    let mut builder = EntitySnapshot::builder()
        .entity_id(sensor_entity)
        .state(timers.len().to_string())
        .attribute("timers", timers)
        .last_updated(now);
    if let Some(version) = value.get("version") {
        builder = builder.attribute("version", version.clone());
    }
    builder.build().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use timerhub_domain::entity::EntitySnapshot;
    use timerhub_domain::timer::TimerState;

    #[derive(Default)]
    struct Mirror {
        snapshot: Mutex<Option<EntitySnapshot>>,
    }

    impl EntityStateReader for Mirror {
        async fn entity(&self, entity_id: &str) -> Result<Option<EntitySnapshot>, TimerHubError> {
            Ok(self
                .snapshot
                .lock()
                .unwrap()
                .clone()
                .filter(|s| s.entity_id == entity_id))
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        messages: Mutex<Vec<(String, String, bool)>>,
    }

    impl MessagePublisher for RecordingPublisher {
        async fn publish(&self, topic: &str, payload: String, retain: bool) -> Result<(), TimerHubError> {
            self.messages
                .lock()
                .unwrap()
                .push((topic.to_string(), payload, retain));
            Ok(())
        }
    }

    fn store() -> MessageBusTimerStore<Mirror, RecordingPublisher> {
        MessageBusTimerStore::new(
            Mirror::default(),
            RecordingPublisher::default(),
            MqttTopics::default(),
        )
    }

    #[tokio::test]
    async fn should_publish_payload_and_marker_retained() {
        let store = store();
        let timer = Timer::builder()
            .id("a")
            .state(TimerState::Running { end: 10 })
            .build()
            .unwrap();
        store.save(&[timer]).await.unwrap();

        let messages = store.publisher.messages.lock().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].0, "timer_card/timers");
        assert!(messages[0].2);
        let payload: Value = serde_json::from_str(&messages[0].1).unwrap();
        assert_eq!(payload["timers"][0]["id"], "a");

        assert_eq!(messages[1].0, "timer_card/timers/state");
        let marker: Value = serde_json::from_str(&messages[1].1).unwrap();
        assert_eq!(marker["version"], 1);
        assert!(marker["timestamp"].is_i64());
    }

    #[tokio::test]
    async fn should_load_from_mirror_sensor() {
        let store = store();
        *store.reader.snapshot.lock().unwrap() = Some(
            EntitySnapshot::builder()
                .entity_id("sensor.timer_card_timers")
                .attribute("timers", json!([{"id": "a", "end": 50, "label": "Soup"}]))
                .build()
                .unwrap(),
        );

        let timers = store.load().await.unwrap();
        assert_eq!(timers.len(), 1);
        assert_eq!(timers[0].label, "Soup");
        assert_eq!(timers[0].source, TimerSource::MessageBus);
    }

    #[tokio::test]
    async fn should_load_empty_when_mirror_missing() {
        assert!(store().load().await.unwrap().is_empty());
    }

    #[test]
    fn should_mirror_stored_payload_as_sensor() {
        let payload = r#"{"timers":[{"id":"a","end":5}],"version":1,"lastUpdated":3}"#;
        let snapshot = mirror_snapshot("sensor.timer_card_timers", payload, 9).unwrap();
        assert_eq!(snapshot.state, "1");
        assert_eq!(snapshot.last_updated, Some(9));
        assert_eq!(
            mirrored_timers(&snapshot, TimerSource::MessageBus)[0].id.as_str(),
            "a"
        );
    }

    #[test]
    fn should_not_mirror_foreign_payloads() {
        assert!(mirror_snapshot("sensor.x", r#"{"version":1,"timestamp":3}"#, 0).is_none());
        assert!(mirror_snapshot("sensor.x", "not json", 0).is_none());
    }
}
