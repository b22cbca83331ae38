//! Sensors whose state is the deadline itself.

use timerhub_domain::config::EntityConfig;
use timerhub_domain::entity::EntitySnapshot;
use timerhub_domain::time::{Millis, parse_timestamp};
use timerhub_domain::timer::{Timer, TimerSource, TimerState};

use super::{SourceAdapter, decorate, entity_label};

pub struct TimestampAdapter;

impl SourceAdapter for TimestampAdapter {
    fn parse(&self, snapshot: &EntitySnapshot, config: &EntityConfig, _now: Millis) -> Vec<Timer> {
        let Some(end) = parse_timestamp(&snapshot.state) else {
            return Vec::new();
        };
        let duration = config
            .start_time_attr
            .as_deref()
            .and_then(|attr| snapshot.attr_str(attr))
            .and_then(parse_timestamp)
            .filter(|start| *start < end)
            .map(|start| end - start);

        Timer::builder()
            .id(snapshot.entity_id.as_str())
            .source(TimerSource::Timestamp)
            .source_entity(snapshot.entity_id.as_str())
            .label(entity_label(snapshot, config))
            .duration(duration)
            .state(TimerState::Running { end })
            .build()
            .map(|timer| decorate(vec![timer], config))
            .unwrap_or_default()
    }
}
