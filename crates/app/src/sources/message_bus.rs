//! Sensors mirroring a message-bus timer payload into a `timers` attribute.

use serde_json::Value;

use timerhub_domain::config::EntityConfig;
use timerhub_domain::entity::EntitySnapshot;
use timerhub_domain::time::Millis;
use timerhub_domain::timer::record::TimerRecord;
use timerhub_domain::timer::{Timer, TimerSource};

use super::{SourceAdapter, decorate};

pub struct MessageBusSensorAdapter;

impl SourceAdapter for MessageBusSensorAdapter {
    fn parse(&self, snapshot: &EntitySnapshot, config: &EntityConfig, _now: Millis) -> Vec<Timer> {
        decorate(mirrored_timers(snapshot, TimerSource::MessageBus), config)
    }
}

/// Decode the `timers` attribute of a mirror sensor.
#[must_use]
pub fn mirrored_timers(snapshot: &EntitySnapshot, source: TimerSource) -> Vec<Timer> {
    let entries = match snapshot.attribute("timers") {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(text)) => serde_json::from_str::<Vec<Value>>(text).unwrap_or_default(),
        _ => return Vec::new(),
    };
    entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<TimerRecord>(entry).ok())
        .filter_map(|record| record.into_timer(source, &snapshot.entity_id))
        .collect()
}
