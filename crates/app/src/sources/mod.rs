//! Source adapters: one parser per kind of external timer source.
//!
//! Each adapter is a pure function of one entity snapshot: it never holds
//! state between calls and never fails. Anything it cannot understand
//! yields an empty list.

mod helper;
mod message_bus;
mod minutes;
mod native;
mod timestamp;
mod voice_assistant;

pub use helper::HelperAdapter;
pub use message_bus::{MessageBusSensorAdapter, mirrored_timers};
pub use minutes::{DEFAULT_MINUTES_ATTRIBUTE, MinutesAdapter};
pub use native::NativeTimerAdapter;
pub use timestamp::TimestampAdapter;
pub use voice_assistant::VoiceAssistantAdapter;

use timerhub_domain::config::{EntityConfig, SourceKind};
use timerhub_domain::entity::EntitySnapshot;
use timerhub_domain::time::{Millis, parse_timestamp};
use timerhub_domain::timer::{Timer, TimerSource};

/// Common parse contract of every source kind.
pub trait SourceAdapter: Send + Sync {
    fn parse(&self, snapshot: &EntitySnapshot, config: &EntityConfig, now: Millis) -> Vec<Timer>;
}

/// The adapter implementing `kind`.
#[must_use]
pub fn adapter_for(kind: SourceKind) -> &'static dyn SourceAdapter {
    match kind {
        SourceKind::Timer => &NativeTimerAdapter {
            source: TimerSource::NativeTimer,
        },
        SourceKind::Voice => &NativeTimerAdapter {
            source: TimerSource::VoiceTimer,
        },
        SourceKind::Alexa => &VoiceAssistantAdapter,
        SourceKind::Helper => &HelperAdapter,
        SourceKind::Mqtt => &MessageBusSensorAdapter,
        SourceKind::Timestamp => &TimestampAdapter,
        SourceKind::Minutes => &MinutesAdapter,
    }
}

const VOICE_LIST_ATTRIBUTES: [&str; 3] = ["sorted_active", "sorted_paused", "sorted_all"];

/// Pick the adapter kind for an entity.
///
/// An explicit `mode` wins. Otherwise the entity-id domain decides for
/// timers and text helpers, and the attribute shape decides for sensors.
#[must_use]
pub fn resolve_kind(config: &EntityConfig, snapshot: &EntitySnapshot) -> Option<SourceKind> {
    if let Some(mode) = config.mode {
        return Some(mode);
    }
    match snapshot.domain() {
        "timer" => return Some(SourceKind::Timer),
        "input_text" | "text" => return Some(SourceKind::Helper),
        _ => {}
    }
    if VOICE_LIST_ATTRIBUTES
        .iter()
        .any(|key| snapshot.attribute(key).is_some())
    {
        return Some(SourceKind::Alexa);
    }
    if snapshot.attribute("timers").is_some() {
        return Some(SourceKind::Mqtt);
    }
    if config.minutes_attr.is_some() || snapshot.attribute(DEFAULT_MINUTES_ATTRIBUTE).is_some() {
        return Some(SourceKind::Minutes);
    }
    if snapshot.attr_str("device_class") == Some("timestamp")
        || parse_timestamp(&snapshot.state).is_some()
    {
        return Some(SourceKind::Timestamp);
    }
    None
}

/// Resolve and run the adapter for one entity.
#[must_use]
pub fn parse_entity(snapshot: &EntitySnapshot, config: &EntityConfig, now: Millis) -> Vec<Timer> {
    let Some(kind) = resolve_kind(config, snapshot) else {
        tracing::debug!(entity = %snapshot.entity_id, "no source adapter matches entity");
        return Vec::new();
    };
    adapter_for(kind).parse(snapshot, config, now)
}

/// Display label: the configured `name`, else the entity's friendly name.
fn entity_label(snapshot: &EntitySnapshot, config: &EntityConfig) -> String {
    config
        .name
        .clone()
        .unwrap_or_else(|| snapshot.friendly_name().to_string())
}

/// Fill icon and color from the entity overrides where the source left
/// them empty.
fn decorate(mut timers: Vec<Timer>, config: &EntityConfig) -> Vec<Timer> {
    for timer in &mut timers {
        if timer.icon.is_none() {
            timer.icon.clone_from(&config.icon);
        }
        if timer.color.is_none() {
            timer.color.clone_from(&config.color);
        }
    }
    timers
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(entity_id: &str, state: &str) -> EntitySnapshot {
        EntitySnapshot::builder()
            .entity_id(entity_id)
            .state(state)
            .build()
            .unwrap()
    }

    #[test]
    fn should_infer_kind_from_entity_domain() {
        let config = EntityConfig::default();
        assert_eq!(
            resolve_kind(&config, &snapshot("timer.tea", "idle")),
            Some(SourceKind::Timer)
        );
        assert_eq!(
            resolve_kind(&config, &snapshot("input_text.timers", "")),
            Some(SourceKind::Helper)
        );
        assert_eq!(
            resolve_kind(&config, &snapshot("text.timers", "")),
            Some(SourceKind::Helper)
        );
    }

    #[test]
    fn should_infer_kind_from_attribute_shape() {
        let config = EntityConfig::default();
        let alexa = EntitySnapshot::builder()
            .entity_id("sensor.echo_next_timer")
            .attribute("sorted_active", json!([]))
            .build()
            .unwrap();
        assert_eq!(resolve_kind(&config, &alexa), Some(SourceKind::Alexa));

        let bus = EntitySnapshot::builder()
            .entity_id("sensor.timer_card_timers")
            .attribute("timers", json!([]))
            .build()
            .unwrap();
        assert_eq!(resolve_kind(&config, &bus), Some(SourceKind::Mqtt));

        let eta = EntitySnapshot::builder()
            .entity_id("sensor.bus")
            .attribute("minutes", 4)
            .build()
            .unwrap();
        assert_eq!(resolve_kind(&config, &eta), Some(SourceKind::Minutes));

        let ts = snapshot("sensor.oven_done", "2023-11-14T22:13:20+00:00");
        assert_eq!(resolve_kind(&config, &ts), Some(SourceKind::Timestamp));
    }

    #[test]
    fn should_prefer_explicit_mode() {
        let mut config = EntityConfig::new("timer.tea");
        config.mode = Some(SourceKind::Voice);
        assert_eq!(
            resolve_kind(&config, &snapshot("timer.tea", "idle")),
            Some(SourceKind::Voice)
        );
    }

    #[test]
    fn should_yield_nothing_for_unknown_entities() {
        let config = EntityConfig::default();
        assert!(parse_entity(&snapshot("light.kitchen", "on"), &config, 0).is_empty());
    }

    #[test]
    fn should_fill_icon_and_color_from_overrides() {
        let mut config = EntityConfig::new("input_text.t");
        config.icon = Some("mdi:pasta".into());
        config.color = Some("orange".into());
        let helper = snapshot("input_text.t", r#"{"timer":{"e":10,"d":5}}"#);
        let timers = parse_entity(&helper, &config, 0);
        assert_eq!(timers[0].icon.as_deref(), Some("mdi:pasta"));
        assert_eq!(timers[0].color.as_deref(), Some("orange"));
    }
}
