//! Sensors exposing a minutes-remaining attribute (arrival ETAs and the like).

use timerhub_domain::config::EntityConfig;
use timerhub_domain::entity::EntitySnapshot;
use timerhub_domain::time::{MINUTE, Millis, SECOND, bounded, millis_from_f64};
use timerhub_domain::timer::{Timer, TimerSource, TimerState};

use super::{SourceAdapter, decorate};

pub const DEFAULT_MINUTES_ATTRIBUTE: &str = "minutes";
const DEFAULT_LABEL: &str = "Minutes to arrival";

pub struct MinutesAdapter;

impl SourceAdapter for MinutesAdapter {
    fn parse(&self, snapshot: &EntitySnapshot, config: &EntityConfig, now: Millis) -> Vec<Timer> {
        let attribute = config
            .minutes_attr
            .as_deref()
            .unwrap_or(DEFAULT_MINUTES_ATTRIBUTE);
        let Some(minutes) = snapshot.attr_f64(attribute).filter(|m| m.is_finite() && *m >= 0.0) else {
            return Vec::new();
        };

        // Anchor on the sensor's own update time so an unchanged value keeps
        // the same deadline, and therefore the same id, across ticks.
        let base = snapshot.last_updated.unwrap_or(now);
        #[allow(clippy::cast_precision_loss)]
        let Some(end) = millis_from_f64(minutes * MINUTE as f64)
            .and_then(|offset| base.checked_add(offset))
            .and_then(bounded)
        else {
            return Vec::new();
        };
        let deadline_secs = (end + SECOND / 2) / SECOND;

        Timer::builder()
            .id(format!("{}-{deadline_secs}", snapshot.entity_id))
            .source(TimerSource::MinutesAttribute)
            .source_entity(snapshot.entity_id.as_str())
            .label(config.name.clone().unwrap_or_else(|| DEFAULT_LABEL.to_string()))
            .state(TimerState::Running { end })
            .build()
            .map(|timer| decorate(vec![timer], config))
            .unwrap_or_default()
    }
}
