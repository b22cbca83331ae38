//! Voice-assistant aggregate sensors exposing several timers at once.
//!
//! The sensor carries `sorted_active`, `sorted_paused` and `sorted_all`
//! attributes, each a list of `[id, record]` pairs. Some integrations store
//! the lists as JSON strings rather than arrays; both are accepted.

use serde_json::{Map, Value};

use timerhub_domain::config::EntityConfig;
use timerhub_domain::duration::{format_human_duration, parse_iso8601_duration};
use timerhub_domain::entity::EntitySnapshot;
use timerhub_domain::time::{Millis, SECOND, bounded, millis_from_f64};
use timerhub_domain::timer::{Timer, TimerSource, TimerState};

use super::{SourceAdapter, decorate};

const NAME_SUFFIX: &str = " next timer";

pub struct VoiceAssistantAdapter;

impl SourceAdapter for VoiceAssistantAdapter {
    fn parse(&self, snapshot: &EntitySnapshot, config: &EntityConfig, now: Millis) -> Vec<Timer> {
        let active = pairs(snapshot, "sorted_active");
        let paused = if snapshot.attribute("sorted_paused").is_some() {
            pairs(snapshot, "sorted_paused")
        } else {
            pairs(snapshot, "sorted_all")
                .into_iter()
                .filter(|(_, record)| record.get("status").and_then(Value::as_str) == Some("PAUSED"))
                .collect()
        };

        let base_label = config.name.clone().unwrap_or_else(|| clean_name(snapshot.friendly_name()));
        let mut timers = Vec::new();

        for (id, record) in &active {
            let duration = record_duration(record);
            let end = number(record, "triggerTime")
                .or_else(|| number(record, "remainingTime").and_then(|r| now.checked_add(r)));
            let Some(end) = end else {
                continue;
            };
            timers.extend(build(snapshot, id, record, &base_label, duration, TimerState::Running { end }));
        }

        for (id, record) in &paused {
            if active.iter().any(|(active_id, _)| active_id == id) {
                continue;
            }
            let duration = record_duration(record);
            let Some(remaining) = number(record, "remainingTime").or(duration) else {
                continue;
            };
            timers.extend(build(
                snapshot,
                id,
                record,
                &base_label,
                duration,
                TimerState::Paused {
                    remaining: remaining.max(0),
                },
            ));
        }

        decorate(timers, config)
    }
}

fn build(
    snapshot: &EntitySnapshot,
    id: &str,
    record: &Map<String, Value>,
    base_label: &str,
    duration: Option<Millis>,
    state: TimerState,
) -> Option<Timer> {
    let label = record
        .get("timerLabel")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map_or_else(
            || match duration {
                Some(ms) => format!("{base_label} {}", format_human_duration(ms)),
                None => base_label.to_string(),
            },
            str::to_string,
        );

    Timer::builder()
        .id(id)
        .source(TimerSource::VoiceTimer)
        .source_entity(snapshot.entity_id.as_str())
        .label(label)
        .duration(duration)
        .state(state)
        .build()
        .ok()
}

/// `[id, record]` pairs of one list attribute; malformed entries are skipped.
fn pairs(snapshot: &EntitySnapshot, key: &str) -> Vec<(String, Map<String, Value>)> {
    let list = match snapshot.attribute(key) {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(text)) => serde_json::from_str::<Vec<Value>>(text).unwrap_or_default(),
        _ => return Vec::new(),
    };
    list.into_iter()
        .filter_map(|entry| {
            let Value::Array(mut pair) = entry else {
                return None;
            };
            if pair.len() != 2 {
                return None;
            }
            let Value::Object(record) = pair.pop()? else {
                return None;
            };
            let id = pair.pop()?.as_str()?.to_string();
            (!id.is_empty()).then_some((id, record))
        })
        .collect()
}

/// Duration by field priority: milliseconds, seconds, ISO-8601 string.
fn record_duration(record: &Map<String, Value>) -> Option<Millis> {
    number(record, "originalDurationInMillis")
        .or_else(|| {
            number(record, "originalDurationInSeconds")
                .and_then(|s| s.checked_mul(SECOND))
                .and_then(bounded)
        })
        .or_else(|| {
            record
                .get("originalDuration")
                .and_then(Value::as_str)
                .and_then(parse_iso8601_duration)
        })
        .filter(|d| *d > 0)
}

fn number(record: &Map<String, Value>, key: &str) -> Option<Millis> {
    let value = record.get(key)?;
    match value.as_i64() {
        Some(int) => bounded(int),
        None => value.as_f64().and_then(millis_from_f64),
    }
}

fn clean_name(friendly_name: &str) -> String {
    let lower = friendly_name.to_lowercase();
    if lower.ends_with(NAME_SUFFIX) && friendly_name.is_char_boundary(friendly_name.len() - NAME_SUFFIX.len()) {
        friendly_name[..friendly_name.len() - NAME_SUFFIX.len()].to_string()
    } else {
        friendly_name.to_string()
    }
}
