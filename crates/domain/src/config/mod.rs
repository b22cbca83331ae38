//! Card configuration: the options a dashboard user sets on one card.
//!
//! Deserialisable from TOML (daemon config file) and JSON (HTTP updates)
//! with the same field names. Every field has a default so an empty table
//! is a valid configuration.

mod audio;
mod entity;

pub use audio::{AudioSettings, is_allowed_audio_url};
pub use entity::{EntityConfig, SourceKind};

use serde::Deserialize;

use crate::duration::parse_human_duration;
use crate::time::{MAX_MILLIS, MINUTE, Millis, SECOND, millis_from_f64};
use crate::timer::TimerSource;

/// What happens after a timer starts ringing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpireAction {
    /// Keep the timer visible for `expire_keep_for` seconds, then remove it.
    #[default]
    Keep,
    /// Leave it to the source to stop reporting the timer.
    Dismiss,
    /// Remove it once the notification sound had time to play.
    Remove,
}

/// Where user-created timers are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Local,
    Mqtt,
}

impl StorageKind {
    /// Source tag given to timers loaded from this backend.
    #[must_use]
    pub fn timer_source(self) -> TimerSource {
        match self {
            Self::Local => TimerSource::LocalStorage,
            Self::Mqtt => TimerSource::MessageBus,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    FillVertical,
    #[default]
    FillHorizontal,
    BarVertical,
    BarHorizontal,
    Circle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMode {
    #[default]
    Drain,
    Fill,
}

/// A quick-create preset: a number of minutes or a string such as `"30s"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Preset {
    Minutes(f64),
    Text(String),
}

impl Preset {
    #[must_use]
    pub fn duration(&self) -> Option<Millis> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Minutes(m) if *m > 0.0 => millis_from_f64(m * MINUTE as f64),
            Self::Minutes(_) => None,
            Self::Text(text) => parse_human_duration(text).filter(|ms| *ms > 0),
        }
    }
}

/// Topics and mirror entity used by the message-bus storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MqttTopics {
    /// Retained full-collection topic.
    pub topic: String,
    /// Retained `{version, timestamp}` marker topic; defaults to `<topic>/state`.
    pub state_topic: Option<String>,
    /// Sensor entity that mirrors `topic` into its attributes.
    pub sensor_entity: String,
    /// Topic receiving lifecycle events.
    pub events_topic: String,
}

impl Default for MqttTopics {
    fn default() -> Self {
        Self {
            topic: "timer_card/timers".to_string(),
            state_topic: None,
            sensor_entity: "sensor.timer_card_timers".to_string(),
            events_topic: "timer_card/events".to_string(),
        }
    }
}

impl MqttTopics {
    #[must_use]
    pub fn state_topic(&self) -> String {
        self.state_topic
            .clone()
            .unwrap_or_else(|| format!("{}/state", self.topic))
    }
}

/// Options of one timer card.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    pub entities: Vec<EntityConfig>,
    pub layout: Layout,
    pub style: Style,
    pub progress_mode: ProgressMode,
    /// Snooze length in minutes.
    pub snooze_duration: f64,
    pub timer_presets: Vec<Preset>,
    pub expire_action: ExpireAction,
    /// Seconds an expired timer stays visible under [`ExpireAction::Keep`].
    pub expire_keep_for: u64,
    pub storage: StorageKind,
    /// Overrides the derived local-storage key.
    pub storage_key: Option<String>,
    /// Target for newly created timers; a text helper routes creation there.
    pub default_timer_entity: Option<String>,
    pub mqtt: MqttTopics,

    pub audio_enabled: bool,
    pub audio_file_url: Option<String>,
    pub audio_repeat_count: u32,
    pub audio_play_until_dismissed: bool,
    /// Seconds to let the sound finish before [`ExpireAction::Remove`] fires.
    pub audio_completion_delay: f64,

    pub alexa_audio_enabled: Option<bool>,
    pub alexa_audio_file_url: Option<String>,
    pub alexa_audio_repeat_count: Option<u32>,
    pub alexa_audio_play_until_dismissed: Option<bool>,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            layout: Layout::default(),
            style: Style::default(),
            progress_mode: ProgressMode::default(),
            snooze_duration: 5.0,
            timer_presets: vec![Preset::Minutes(5.0), Preset::Minutes(15.0), Preset::Minutes(30.0)],
            expire_action: ExpireAction::default(),
            expire_keep_for: 120,
            storage: StorageKind::default(),
            storage_key: None,
            default_timer_entity: None,
            mqtt: MqttTopics::default(),
            audio_enabled: false,
            audio_file_url: None,
            audio_repeat_count: 1,
            audio_play_until_dismissed: false,
            audio_completion_delay: 4.0,
            alexa_audio_enabled: None,
            alexa_audio_file_url: None,
            alexa_audio_repeat_count: None,
            alexa_audio_play_until_dismissed: None,
        }
    }
}

impl CardConfig {
    /// Per-entity options for `entity_id`, if configured.
    #[must_use]
    pub fn entity(&self, entity_id: &str) -> Option<&EntityConfig> {
        self.entities.iter().find(|e| e.entity == entity_id)
    }

    #[must_use]
    pub fn snooze_ms(&self) -> Millis {
        seconds_to_ms(self.snooze_duration * 60.0).max(SECOND)
    }

    #[must_use]
    pub fn keep_for_ms(&self) -> Millis {
        i64::try_from(self.expire_keep_for)
            .unwrap_or(i64::MAX / SECOND)
            .saturating_mul(SECOND)
    }

    #[must_use]
    pub fn completion_delay_ms(&self) -> Millis {
        seconds_to_ms(self.audio_completion_delay)
    }

    /// Durations of the configured presets, skipping unparseable entries.
    #[must_use]
    pub fn presets(&self) -> Vec<Millis> {
        self.timer_presets.iter().filter_map(Preset::duration).collect()
    }

    /// Local-storage key: `storage_key` when set, otherwise derived from the
    /// configured entities so independently configured cards never collide.
    #[must_use]
    pub fn storage_key(&self) -> String {
        if let Some(key) = self.storage_key.as_deref().filter(|k| !k.is_empty()) {
            return key.to_string();
        }
        let mut seed = String::new();
        for entity in &self.entities {
            seed.push_str(&entity.entity);
            seed.push('|');
        }
        if let Some(target) = &self.default_timer_entity {
            seed.push_str(target);
        }
        format!("timer-card-{:016x}", fnv1a(seed.as_bytes()))
    }

    /// Effective audio settings for a timer.
    ///
    /// Priority: entity override, then the voice-assistant defaults for
    /// voice sources, then the global settings.
    #[must_use]
    pub fn audio_for(&self, source: TimerSource, entity_id: &str) -> AudioSettings {
        let mut settings = AudioSettings {
            enabled: self.audio_enabled,
            file_url: self.audio_file_url.clone(),
            repeat_count: self.audio_repeat_count,
            play_until_dismissed: self.audio_play_until_dismissed,
        };

        if source == TimerSource::VoiceTimer {
            if let Some(enabled) = self.alexa_audio_enabled {
                settings.enabled = enabled;
            }
            if let Some(url) = &self.alexa_audio_file_url {
                settings.file_url = Some(url.clone());
            }
            if let Some(count) = self.alexa_audio_repeat_count {
                settings.repeat_count = count;
            }
            if let Some(until) = self.alexa_audio_play_until_dismissed {
                settings.play_until_dismissed = until;
            }
        }

        if let Some(entity) = self.entity(entity_id) {
            if let Some(enabled) = entity.audio_enabled {
                settings.enabled = enabled;
            }
            if let Some(url) = &entity.audio_file_url {
                settings.file_url = Some(url.clone());
            }
            if let Some(count) = entity.audio_repeat_count {
                settings.repeat_count = count;
            }
            if let Some(until) = entity.audio_play_until_dismissed {
                settings.play_until_dismissed = until;
            }
        }

        settings.repeat_count = settings.repeat_count.max(1);
        settings
    }
}

fn seconds_to_ms(seconds: f64) -> Millis {
    if seconds.is_nan() || seconds <= 0.0 {
        return 0;
    }
    millis_from_f64(seconds * 1000.0).unwrap_or(MAX_MILLIS)
}

/// 64-bit FNV-1a; stable across builds, unlike `DefaultHasher`.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = CardConfig::default();
        assert_eq!(config.expire_action, ExpireAction::Keep);
        assert_eq!(config.keep_for_ms(), 120_000);
        assert_eq!(config.snooze_ms(), 300_000);
        assert_eq!(config.completion_delay_ms(), 4_000);
        assert_eq!(config.storage, StorageKind::Local);
        assert_eq!(config.presets(), vec![300_000, 900_000, 1_800_000]);
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            entities = ["timer.kitchen", { entity = "sensor.bus", mode = "minutes", minutes_attr = "eta" }]
            expire_action = "remove"
            expire_keep_for = 30
            snooze_duration = 10
            timer_presets = [1, "45s"]
            storage = "mqtt"
            audio_enabled = true
            audio_file_url = "/local/ding.mp3"

            [mqtt]
            topic = "home/timers"
        "#;
        let config: CardConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.entities.len(), 2);
        assert_eq!(config.entities[0].entity, "timer.kitchen");
        assert_eq!(config.entities[1].mode, Some(SourceKind::Minutes));
        assert_eq!(config.entities[1].minutes_attr.as_deref(), Some("eta"));
        assert_eq!(config.expire_action, ExpireAction::Remove);
        assert_eq!(config.keep_for_ms(), 30_000);
        assert_eq!(config.snooze_ms(), 600_000);
        assert_eq!(config.presets(), vec![60_000, 45_000]);
        assert_eq!(config.storage, StorageKind::Mqtt);
        assert_eq!(config.mqtt.state_topic(), "home/timers/state");
        assert_eq!(config.mqtt.sensor_entity, "sensor.timer_card_timers");
    }

    #[test]
    fn should_deserialize_from_json() {
        let json = r#"{"entities":[{"entity":"timer.tea","name":"Tea"}],"style":"circle"}"#;
        let config: CardConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.style, Style::Circle);
        assert_eq!(config.entity("timer.tea").unwrap().name.as_deref(), Some("Tea"));
    }

    #[test]
    fn should_derive_stable_storage_key_from_entities() {
        let mut a = CardConfig::default();
        a.entities.push(EntityConfig::new("timer.a"));
        let mut b = CardConfig::default();
        b.entities.push(EntityConfig::new("timer.b"));

        assert_eq!(a.storage_key(), a.clone().storage_key());
        assert_ne!(a.storage_key(), b.storage_key());
        assert!(a.storage_key().starts_with("timer-card-"));
    }

    #[test]
    fn should_prefer_explicit_storage_key() {
        let config = CardConfig {
            storage_key: Some("kitchen".to_string()),
            ..CardConfig::default()
        };
        assert_eq!(config.storage_key(), "kitchen");
    }

    #[test]
    fn should_resolve_audio_with_entity_override_first() {
        let mut entity = EntityConfig::new("sensor.echo");
        entity.audio_enabled = Some(false);
        let config = CardConfig {
            audio_enabled: true,
            alexa_audio_enabled: Some(true),
            alexa_audio_repeat_count: Some(3),
            entities: vec![entity],
            ..CardConfig::default()
        };

        let audio = config.audio_for(TimerSource::VoiceTimer, "sensor.echo");
        assert!(!audio.enabled);
        assert_eq!(audio.repeat_count, 3);
    }

    #[test]
    fn should_apply_voice_defaults_only_to_voice_sources() {
        let config = CardConfig {
            audio_enabled: false,
            alexa_audio_enabled: Some(true),
            ..CardConfig::default()
        };
        assert!(config.audio_for(TimerSource::VoiceTimer, "x").enabled);
        assert!(!config.audio_for(TimerSource::LocalStorage, "x").enabled);
    }

    #[test]
    fn should_skip_invalid_presets() {
        let config = CardConfig {
            timer_presets: vec![Preset::Minutes(-1.0), Preset::Text("later".into())],
            ..CardConfig::default()
        };
        assert!(config.presets().is_empty());
    }

    #[test]
    fn should_clamp_oversized_durations() {
        let config = CardConfig {
            timer_presets: vec![Preset::Minutes(1e300), Preset::Minutes(f64::INFINITY)],
            snooze_duration: 1e300,
            ..CardConfig::default()
        };
        assert!(config.presets().is_empty());
        assert_eq!(config.snooze_ms(), MAX_MILLIS);
    }
}
