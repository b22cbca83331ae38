//! Text helper entities whose state is timer JSON.

use timerhub_domain::config::EntityConfig;
use timerhub_domain::entity::EntitySnapshot;
use timerhub_domain::time::Millis;
use timerhub_domain::timer::Timer;
use timerhub_domain::timer::record::HelperPayload;

use super::{SourceAdapter, decorate};

pub struct HelperAdapter;

impl SourceAdapter for HelperAdapter {
    fn parse(&self, snapshot: &EntitySnapshot, config: &EntityConfig, _now: Millis) -> Vec<Timer> {
        let Some(payload) = HelperPayload::parse(&snapshot.state) else {
            return Vec::new();
        };
        decorate(payload.into_timers(&snapshot.entity_id), config)
    }
}
