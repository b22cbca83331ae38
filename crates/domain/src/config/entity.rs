//! Per-entity card options.

use serde::Deserialize;

/// Which source adapter interprets an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Native `timer.*` entity.
    Timer,
    /// Voice-satellite timer entity with native-timer states.
    Voice,
    /// Voice-assistant aggregate sensor (`sorted_active` / `sorted_all`).
    Alexa,
    /// Text helper storing timer JSON in its state.
    Helper,
    /// Sensor exposing a `timers` list attribute from the message bus.
    Mqtt,
    /// Sensor whose state is the deadline timestamp.
    Timestamp,
    /// Sensor with a minutes-remaining attribute.
    Minutes,
}

/// Options attached to one configured entity.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "EntityEntry")]
pub struct EntityConfig {
    pub entity: String,
    /// Explicit adapter, bypassing inference.
    pub mode: Option<SourceKind>,
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub minutes_attr: Option<String>,
    pub start_time_attr: Option<String>,
    pub audio_enabled: Option<bool>,
    pub audio_file_url: Option<String>,
    pub audio_repeat_count: Option<u32>,
    pub audio_play_until_dismissed: Option<bool>,
    pub keep_timer_visible_when_idle: bool,
    /// Only dismiss is accepted for this entity's timers.
    pub hide_timer_actions: bool,
    /// Shown next to the timer while it rings.
    pub expired_subtitle: Option<String>,
}

impl EntityConfig {
    #[must_use]
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Self::default()
        }
    }
}

/// Entities may be listed as a bare id or as a table of options.
#[derive(Deserialize)]
#[serde(untagged)]
enum EntityEntry {
    Id(String),
    Full(EntityTable),
}

#[derive(Deserialize)]
struct EntityTable {
    entity: String,
    #[serde(default)]
    mode: Option<SourceKind>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    minutes_attr: Option<String>,
    #[serde(default)]
    start_time_attr: Option<String>,
    #[serde(default)]
    audio_enabled: Option<bool>,
    #[serde(default)]
    audio_file_url: Option<String>,
    #[serde(default)]
    audio_repeat_count: Option<u32>,
    #[serde(default)]
    audio_play_until_dismissed: Option<bool>,
    #[serde(default)]
    keep_timer_visible_when_idle: bool,
    #[serde(default)]
    hide_timer_actions: bool,
    #[serde(default)]
    expired_subtitle: Option<String>,
}

impl From<EntityEntry> for EntityConfig {
    fn from(entry: EntityEntry) -> Self {
        match entry {
            EntityEntry::Id(entity) => Self::new(entity),
            EntityEntry::Full(t) => Self {
                entity: t.entity,
                mode: t.mode,
                name: t.name,
                icon: t.icon,
                color: t.color,
                minutes_attr: t.minutes_attr,
                start_time_attr: t.start_time_attr,
                audio_enabled: t.audio_enabled,
                audio_file_url: t.audio_file_url,
                audio_repeat_count: t.audio_repeat_count,
                audio_play_until_dismissed: t.audio_play_until_dismissed,
                keep_timer_visible_when_idle: t.keep_timer_visible_when_idle,
                hide_timer_actions: t.hide_timer_actions,
                expired_subtitle: t.expired_subtitle,
            },
        }
    }
}
