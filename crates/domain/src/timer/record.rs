//! Wire schemas: persisted collections, helper payloads, store markers.
//!
//! This is the only place where the overloaded `end` field lives: for a
//! paused record `end` holds the *remaining* milliseconds rather than an
//! absolute deadline.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::{Timer, TimerSource, TimerState};
use crate::duration::format_human_duration;
use crate::id::TimerId;
use crate::time::{Millis, millis_from_f64};

/// Current persisted schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// One timer as stored in local storage, message-bus payloads and helper
/// entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<Millis>,
    #[serde(
        default,
        deserialize_with = "lenient_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<Millis>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub paused: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub idle: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub finished: bool,
    #[serde(
        default,
        deserialize_with = "lenient_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub expired_at: Option<Millis>,
    /// Fields written by other clients, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

/// Accept integer and floating point JSON numbers for millisecond fields.
/// Values outside the representable timestamp range read as absent.
fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<Millis>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.and_then(millis_from_f64))
}

impl TimerRecord {
    /// Encode a timer, applying the remaining-as-end convention.
    #[must_use]
    pub fn from_timer(timer: &Timer) -> Self {
        let (end, paused, idle, finished) = match timer.state {
            TimerState::Running { end } => (Some(end), false, false, false),
            TimerState::Paused { remaining } => (Some(remaining), true, false, false),
            TimerState::Idle => (None, false, true, false),
            TimerState::Finished { at } => (Some(at), false, false, true),
        };
        Self {
            id: timer.id.to_string(),
            label: Some(timer.label.clone()),
            icon: timer.icon.clone(),
            color: timer.color.clone(),
            end,
            duration: timer.duration,
            paused,
            idle,
            finished,
            expired_at: timer.expired_at,
            extra: Map::new(),
        }
    }

    /// Decode into a [`Timer`] attributed to `source` / `source_entity`.
    ///
    /// Returns `None` for records that cannot describe a countdown: an empty
    /// id, or a running/paused record without an `end`.
    #[must_use]
    pub fn into_timer(self, source: TimerSource, source_entity: &str) -> Option<Timer> {
        if self.id.is_empty() {
            return None;
        }
        let state = if self.idle {
            TimerState::Idle
        } else if self.finished {
            TimerState::Finished {
                at: self.end.unwrap_or_default(),
            }
        } else if self.paused {
            TimerState::Paused {
                remaining: self.end.or(self.duration)?.max(0),
            }
        } else {
            TimerState::Running { end: self.end? }
        };
        let label = self
            .label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| default_label(self.duration));

        Timer::builder()
            .id(TimerId::from(self.id))
            .source(source)
            .source_entity(source_entity)
            .label(label)
            .icon(self.icon)
            .color(self.color)
            .duration(self.duration)
            .state(state)
            .expired_at(self.expired_at)
            .build()
            .ok()
    }
}

/// `"<human duration> Timer"`, or just `"Timer"` when the length is unknown.
#[must_use]
pub fn default_label(duration: Option<Millis>) -> String {
    match duration {
        Some(ms) if ms > 0 => format!("{} Timer", format_human_duration(ms)),
        _ => "Timer".to_string(),
    }
}

/// The persisted collection: one per local-storage key or message-bus topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTimers {
    pub timers: Vec<TimerRecord>,
    #[serde(default = "schema_version")]
    pub version: u32,
    #[serde(default)]
    pub last_updated: Millis,
}

fn schema_version() -> u32 {
    SCHEMA_VERSION
}

impl StoredTimers {
    #[must_use]
    pub fn new(timers: &[Timer], now: Millis) -> Self {
        Self {
            timers: timers.iter().map(TimerRecord::from_timer).collect(),
            version: SCHEMA_VERSION,
            last_updated: now,
        }
    }

    /// Decode every valid record; invalid ones are skipped.
    #[must_use]
    pub fn into_timers(self, source: TimerSource, source_entity: &str) -> Vec<Timer> {
        self.timers
            .into_iter()
            .filter_map(|r| r.into_timer(source, source_entity))
            .collect()
    }
}

/// Retained change marker published next to a message-bus payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMarker {
    pub version: u32,
    pub timestamp: Millis,
}

/// Structural check applied to local-storage contents before trusting them.
///
/// The value must be an object with a `timers` array whose entries are
/// objects carrying a string `id`, an optional string `label` and optional
/// numeric `duration` / `end`.
#[must_use]
pub fn validate_stored(value: &Value) -> bool {
    let Some(timers) = value.get("timers").and_then(Value::as_array) else {
        return false;
    };
    timers.iter().all(|entry| {
        let Some(obj) = entry.as_object() else {
            return false;
        };
        let id_ok = obj.get("id").is_some_and(Value::is_string);
        let label_ok = obj.get("label").is_none_or(Value::is_string);
        let numeric = |key: &str| obj.get(key).is_none_or(|v| v.is_number() || v.is_null());
        id_ok && label_ok && numeric("duration") && numeric("end")
    })
}

/// Contents of a text helper entity.
///
/// Two shapes are accepted on read; writes always use the multi-timer shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HelperPayload {
    Multi {
        timers: Vec<Value>,
        #[serde(default = "schema_version")]
        version: u32,
    },
    Single {
        timer: SingleTimer,
    },
}

/// Short-keyed single timer shape: `{"e": end_ms, "d": duration_ms}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SingleTimer {
    #[serde(deserialize_with = "lenient_millis")]
    pub e: Option<Millis>,
    #[serde(default, deserialize_with = "lenient_millis")]
    pub d: Option<Millis>,
}

impl HelperPayload {
    /// Parse a helper entity's state string. Anything that is not one of the
    /// two shapes yields `None`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text.trim()).ok()
    }

    /// Build the multi-timer payload for writing back.
    #[must_use]
    pub fn from_timers(timers: &[Timer]) -> Self {
        Self::Multi {
            timers: timers
                .iter()
                .filter_map(|t| serde_json::to_value(TimerRecord::from_timer(t)).ok())
                .collect(),
            version: SCHEMA_VERSION,
        }
    }

    /// Decode into timers attributed to the helper `entity_id`.
    #[must_use]
    pub fn into_timers(self, entity_id: &str) -> Vec<Timer> {
        match self {
            Self::Multi { timers, .. } => timers
                .into_iter()
                .filter_map(|v| serde_json::from_value::<TimerRecord>(v).ok())
                .filter_map(|r| r.into_timer(TimerSource::Helper, entity_id))
                .collect(),
            Self::Single { timer } => {
                let Some(end) = timer.e else {
                    return Vec::new();
                };
                Timer::builder()
                    .id(single_timer_id(entity_id))
                    .source(TimerSource::Helper)
                    .source_entity(entity_id)
                    .label(default_label(timer.d))
                    .duration(timer.d)
                    .state(TimerState::Running { end })
                    .build()
                    .map(|t| vec![t])
                    .unwrap_or_default()
            }
        }
    }

    /// Serialise for the helper's `set_value` service.
    #[must_use]
    pub fn to_state_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Synthetic id used for the single-timer helper shape.
#[must_use]
pub fn single_timer_id(entity_id: &str) -> String {
    format!("single-timer-{entity_id}")
}
