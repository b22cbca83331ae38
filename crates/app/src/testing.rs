//! In-memory fakes of the ports, shared by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use timerhub_domain::entity::EntitySnapshot;
use timerhub_domain::error::TimerHubError;

use crate::ports::{
    AudioPlayer, EntityStateReader, KeyValueStore, MessagePublisher, ServiceCall, ServiceCaller,
};

#[derive(Default)]
pub(crate) struct FakePlatform {
    entities: Mutex<HashMap<String, EntitySnapshot>>,
    calls: Mutex<Vec<ServiceCall>>,
}

impl FakePlatform {
    pub(crate) fn set(&self, snapshot: EntitySnapshot) {
        self.entities
            .lock()
            .unwrap()
            .insert(snapshot.entity_id.clone(), snapshot);
    }

    pub(crate) fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl EntityStateReader for FakePlatform {
    async fn entity(&self, entity_id: &str) -> Result<Option<EntitySnapshot>, TimerHubError> {
        Ok(self.entities.lock().unwrap().get(entity_id).cloned())
    }
}

impl ServiceCaller for FakePlatform {
    async fn call_service(&self, call: ServiceCall) -> Result<(), TimerHubError> {
        if call.service == "set_value" {
            let entity_id = call.data["entity_id"].as_str().unwrap_or_default();
            let value = call.data["value"].as_str().unwrap_or_default();
            self.set(
                EntitySnapshot::builder()
                    .entity_id(entity_id)
                    .state(value)
                    .build()
                    .unwrap(),
            );
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingPlayer {
    pub(crate) plays: Mutex<Vec<String>>,
}

impl AudioPlayer for RecordingPlayer {
    async fn play(&self, url: &str) -> Result<(), TimerHubError> {
        self.plays.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemoryKv {
    values: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryKv {
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

#[derive(Default)]
pub(crate) struct RecordingPublisher {
    messages: Mutex<Vec<(String, String)>>,
}

impl RecordingPublisher {
    pub(crate) fn on(&self, topic: &str) -> Vec<Value> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, payload)| serde_json::from_str(payload).unwrap())
            .collect()
    }
}

impl MessagePublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, payload: String, _retain: bool) -> Result<(), TimerHubError> {
        self.messages
            .lock()
            .unwrap()
            .push((topic.to_string(), payload));
        Ok(())
    }
}
