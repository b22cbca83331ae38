//! Native timer entity behaviour: `idle` → `active` ⇄ `paused` → `idle`.

use serde_json::Value;

use timerhub_domain::duration::{format_clock_duration, parse_clock_duration};
use timerhub_domain::entity::EntitySnapshot;
use timerhub_domain::error::{NotFoundError, TimerHubError, ValidationError};
use timerhub_domain::time::{Millis, SECOND, bounded, format_timestamp, parse_timestamp};

/// Apply `timer.<service>` to a timer entity.
pub(crate) fn handle(
    entity: &mut EntitySnapshot,
    service: &str,
    data: &Value,
    now: Millis,
) -> Result<(), TimerHubError> {
    match service {
        "start" => start(entity, requested_duration(data), now)?,
        "pause" => pause(entity, now),
        "cancel" | "finish" => reset(entity),
        other => {
            return Err(NotFoundError {
                entity: "Service",
                id: format!("timer.{other}"),
            }
            .into());
        }
    }
    entity.last_updated = Some(now);
    Ok(())
}

/// `duration` in service data, either `H:MM:SS` or a number of seconds.
fn requested_duration(data: &Value) -> Option<Millis> {
    match data.get("duration")? {
        Value::String(text) => parse_clock_duration(text),
        Value::Number(secs) => secs.as_i64().and_then(|s| s.checked_mul(SECOND)).and_then(bounded),
        _ => None,
    }
}

fn start(entity: &mut EntitySnapshot, requested: Option<Millis>, now: Millis) -> Result<(), TimerHubError> {
    let remaining = match requested {
        Some(duration) => {
            entity
                .attributes
                .insert("duration".into(), format_clock_duration(duration).into());
            duration
        }
        None if entity.state == "paused" => entity
            .attr_str("remaining")
            .and_then(parse_clock_duration)
            .ok_or(ValidationError::NonPositiveDuration)?,
        None => entity
            .attr_str("duration")
            .and_then(parse_clock_duration)
            .ok_or(ValidationError::NonPositiveDuration)?,
    };
    if remaining <= 0 {
        return Err(ValidationError::NonPositiveDuration.into());
    }

    entity.state = "active".into();
    entity
        .attributes
        .insert("remaining".into(), format_clock_duration(remaining).into());
    entity
        .attributes
        .insert("finishes_at".into(), format_timestamp(now.saturating_add(remaining)).into());
    Ok(())
}

fn pause(entity: &mut EntitySnapshot, now: Millis) {
    if entity.state != "active" {
        return;
    }
    let Some(end) = entity.attr_str("finishes_at").and_then(parse_timestamp) else {
        return;
    };
    entity.state = "paused".into();
    entity.attributes.remove("finishes_at");
    entity
        .attributes
        .insert("remaining".into(), format_clock_duration((end - now).max(0)).into());
}

fn reset(entity: &mut EntitySnapshot) {
    entity.state = "idle".into();
    entity.attributes.remove("finishes_at");
    if let Some(duration) = entity.attribute("duration").cloned() {
        entity.attributes.insert("remaining".into(), duration);
    }
}
