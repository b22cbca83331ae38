//! # timerhub-adapter-virtual
//!
//! In-process stand-in for the home-automation platform, for demos and
//! end-to-end tests.
//!
//! ## Handled services
//!
//! | Service | Behaviour |
//! |---------|-----------|
//! | `timer.start` / `pause` / `cancel` / `finish` | Moves a `timer.*` entity between `idle`, `active` and `paused` |
//! | `input_text.set_value` / `text.set_value` | Replaces the helper's state string |
//! | `mqtt.publish` | Materialises payloads on the storage topic as the mirror sensor |
//!
//! ## Dependency rule
//!
//! Depends on `timerhub-app` (port traits) and `timerhub-domain` only.

mod timer;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use timerhub_app::ports::{EntityStateReader, EntityStateWriter, ServiceCall, ServiceCaller};
use timerhub_app::storage::mirror_snapshot;
use timerhub_domain::config::MqttTopics;
use timerhub_domain::entity::EntitySnapshot;
use timerhub_domain::error::{NotFoundError, TimerHubError};
use timerhub_domain::time::now_ms;

/// Simulated platform holding an entity table.
#[derive(Default)]
pub struct VirtualPlatform {
    entities: Mutex<HashMap<String, EntitySnapshot>>,
    mirror: Option<MqttTopics>,
}

impl VirtualPlatform {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the table with `entities`.
    #[must_use]
    pub fn with_entities(self, entities: impl IntoIterator<Item = EntitySnapshot>) -> Self {
        {
            let mut table = self.table();
            for entity in entities {
                table.insert(entity.entity_id.clone(), entity);
            }
        }
        self
    }

    /// Mirror `mqtt.publish` calls on `topics.topic` into `topics.sensor_entity`.
    #[must_use]
    pub fn with_mirror(mut self, topics: MqttTopics) -> Self {
        self.mirror = Some(topics);
        self
    }

    pub fn insert(&self, entity: EntitySnapshot) {
        self.table().insert(entity.entity_id.clone(), entity);
    }

    #[must_use]
    pub fn get(&self, entity_id: &str) -> Option<EntitySnapshot> {
        self.table().get(entity_id).cloned()
    }

    /// Ids of every known entity, sorted.
    #[must_use]
    pub fn entity_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.table().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, EntitySnapshot>> {
        self.entities.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_text(&self, entity_id: &str, data: &Value) -> Result<(), TimerHubError> {
        let value = data.get("value").and_then(Value::as_str).unwrap_or_default();
        let mut table = self.table();
        let entity = table.get_mut(entity_id).ok_or_else(|| not_found(entity_id))?;
        entity.state = value.to_string();
        entity.last_updated = Some(now_ms());
        Ok(())
    }

    fn publish(&self, data: &Value) {
        let Some(topics) = &self.mirror else {
            return;
        };
        let topic = data.get("topic").and_then(Value::as_str).unwrap_or_default();
        if topic != topics.topic {
            tracing::debug!(topic, "ignoring publish on unmirrored topic");
            return;
        }
        let payload = data.get("payload").and_then(Value::as_str).unwrap_or_default();
        match mirror_snapshot(&topics.sensor_entity, payload, now_ms()) {
            Some(snapshot) => self.insert(snapshot),
            None => tracing::warn!(topic, "dropping unreadable storage payload"),
        }
    }
}

fn not_found(entity_id: &str) -> TimerHubError {
    NotFoundError {
        entity: "Entity",
        id: entity_id.to_string(),
    }
    .into()
}

impl EntityStateReader for VirtualPlatform {
    async fn entity(&self, entity_id: &str) -> Result<Option<EntitySnapshot>, TimerHubError> {
        Ok(self.get(entity_id))
    }
}

impl EntityStateWriter for VirtualPlatform {
    async fn set_entity(&self, snapshot: EntitySnapshot) -> Result<(), TimerHubError> {
        self.insert(snapshot);
        Ok(())
    }
}

impl ServiceCaller for VirtualPlatform {
    async fn call_service(&self, call: ServiceCall) -> Result<(), TimerHubError> {
        let entity_id = call
            .data
            .get("entity_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        tracing::debug!(domain = %call.domain, service = %call.service, entity = %entity_id, "service call");

        match (call.domain.as_str(), call.service.as_str()) {
            ("timer", service) => {
                let mut table = self.table();
                let entity = table.get_mut(&entity_id).ok_or_else(|| not_found(&entity_id))?;
                timer::handle(entity, service, &call.data, now_ms())
            }
            ("input_text" | "text", "set_value") => self.set_text(&entity_id, &call.data),
            ("mqtt", "publish") => {
                self.publish(&call.data);
                Ok(())
            }
            (domain, service) => Err(NotFoundError {
                entity: "Service",
                id: format!("{domain}.{service}"),
            }
            .into()),
        }
    }
}
