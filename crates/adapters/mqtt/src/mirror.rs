//! Materialises the retained storage topic as a sensor entity, the way the
//! platform's MQTT sensor integration would.

use timerhub_app::ports::EntityStateWriter;
use timerhub_app::storage::mirror_snapshot;
use timerhub_domain::config::MqttTopics;
use timerhub_domain::time::now_ms;

use crate::error::MqttError;

pub struct TopicMirror<W> {
    topics: MqttTopics,
    writer: W,
}

impl<W: EntityStateWriter> TopicMirror<W> {
    pub fn new(topics: MqttTopics, writer: W) -> Self {
        Self { topics, writer }
    }

    /// Topic to subscribe to.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topics.topic
    }

    /// Handle one incoming message. Returns whether the sensor was updated.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::PayloadEncoding`] for non-UTF-8 payloads and
    /// [`MqttError::Domain`] when the entity write fails.
    pub async fn handle(&self, topic: &str, payload: &[u8]) -> Result<bool, MqttError> {
        if topic != self.topics.topic {
            return Ok(false);
        }
        let text =
            std::str::from_utf8(payload).map_err(|_| MqttError::PayloadEncoding(topic.to_string()))?;
        let Some(snapshot) = mirror_snapshot(&self.topics.sensor_entity, text, now_ms()) else {
            tracing::warn!(topic, "ignoring unreadable storage payload");
            return Ok(false);
        };
        self.writer
            .set_entity(snapshot)
            .await
            .map_err(MqttError::Domain)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use timerhub_domain::entity::EntitySnapshot;
    use timerhub_domain::error::TimerHubError;

    #[derive(Default)]
    struct Recorder {
        written: Mutex<Vec<EntitySnapshot>>,
    }

    impl EntityStateWriter for Recorder {
        async fn set_entity(&self, snapshot: EntitySnapshot) -> Result<(), TimerHubError> {
            self.written.lock().unwrap().push(snapshot);
            Ok(())
        }
    }

    fn mirror() -> TopicMirror<Recorder> {
        TopicMirror::new(MqttTopics::default(), Recorder::default())
    }

    #[tokio::test]
    async fn should_write_sensor_for_storage_payload() {
        let mirror = mirror();
        let updated = mirror
            .handle(
                "timer_card/timers",
                br#"{"timers":[{"id":"a","end":1},{"id":"b","end":2}],"version":1,"lastUpdated":0}"#,
            )
            .await
            .unwrap();
        assert!(updated);
        let written = mirror.writer.written.lock().unwrap();
        assert_eq!(written[0].entity_id, "sensor.timer_card_timers");
        assert_eq!(written[0].state, "2");
    }

    #[tokio::test]
    async fn should_ignore_other_topics_and_bad_documents() {
        let mirror = mirror();
        assert!(!mirror.handle("timer_card/timers/state", b"{}").await.unwrap());
        assert!(!mirror.handle("timer_card/timers", b"[]").await.unwrap());
        assert!(mirror.writer.written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_reject_binary_payloads() {
        let result = mirror().handle("timer_card/timers", &[0xff, 0xfe]).await;
        assert!(matches!(result, Err(MqttError::PayloadEncoding(_))));
    }
}
