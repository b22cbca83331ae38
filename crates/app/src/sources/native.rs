//! Native timer entities and voice-satellite timers sharing their states.

use timerhub_domain::config::EntityConfig;
use timerhub_domain::duration::parse_clock_duration;
use timerhub_domain::entity::EntitySnapshot;
use timerhub_domain::time::{Millis, parse_timestamp};
use timerhub_domain::timer::{Timer, TimerSource, TimerState};

use super::{SourceAdapter, decorate, entity_label};

const PAUSED_COLOR: &str = "var(--warning-color)";
const FINISHED_COLOR: &str = "var(--success-color)";

/// Maps `idle` / `active` / `paused` / `finished` entity states.
pub struct NativeTimerAdapter {
    pub source: TimerSource,
}

impl SourceAdapter for NativeTimerAdapter {
    fn parse(&self, snapshot: &EntitySnapshot, config: &EntityConfig, now: Millis) -> Vec<Timer> {
        let remaining = snapshot.attr_str("remaining").and_then(parse_clock_duration);
        let finishes_at = snapshot.attr_str("finishes_at").and_then(parse_timestamp);

        let state = match snapshot.state.as_str() {
            "active" => match finishes_at.or_else(|| remaining.and_then(|r| now.checked_add(r))) {
                Some(end) => TimerState::Running { end },
                None => return Vec::new(),
            },
            "paused" => match remaining {
                Some(remaining) => TimerState::Paused { remaining },
                None => return Vec::new(),
            },
            "finished" => TimerState::Finished {
                at: finishes_at.unwrap_or(now),
            },
            "idle" if config.keep_timer_visible_when_idle => TimerState::Idle,
            _ => return Vec::new(),
        };

        let duration = snapshot
            .attr_str("duration")
            .and_then(parse_clock_duration)
            .or(remaining);

        let (icon, color) = match state {
            TimerState::Paused { .. } => ("mdi:timer-pause", Some(PAUSED_COLOR.to_string())),
            TimerState::Finished { .. } => ("mdi:timer-check", Some(FINISHED_COLOR.to_string())),
            _ => ("mdi:timer-outline", None),
        };

        let timer = Timer::builder()
            .id(snapshot.entity_id.as_str())
            .source(self.source)
            .source_entity(snapshot.entity_id.as_str())
            .label(entity_label(snapshot, config))
            .icon(config.icon.clone().or_else(|| Some(icon.to_string())))
            .color(color)
            .duration(duration)
            .state(state)
            .build();

        match timer {
            Ok(timer) => decorate(vec![timer], config),
            Err(err) => {
                tracing::debug!(entity = %snapshot.entity_id, error = %err, "invalid native timer");
                Vec::new()
            }
        }
    }
}
