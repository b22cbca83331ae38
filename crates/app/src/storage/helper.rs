//! Text helper entity used as a timer store.

use serde_json::json;

use timerhub_domain::entity::entity_domain;
use timerhub_domain::error::TimerHubError;
use timerhub_domain::timer::Timer;
use timerhub_domain::timer::record::HelperPayload;

use crate::ports::{EntityStateReader, ServiceCall, ServiceCaller, TimerStore};

/// Reads timers from a helper's JSON state and writes them back through
/// its `set_value` service. Writes always use the multi-timer shape.
pub struct HelperTimerStore<P> {
    platform: P,
    entity_id: String,
}

impl<P> HelperTimerStore<P>
where
    P: EntityStateReader + ServiceCaller,
{
    pub fn new(platform: P, entity_id: impl Into<String>) -> Self {
        Self {
            platform,
            entity_id: entity_id.into(),
        }
    }
}

impl<P> TimerStore for HelperTimerStore<P>
where
    P: EntityStateReader + ServiceCaller,
{
    async fn load(&self) -> Result<Vec<Timer>, TimerHubError> {
        let Some(snapshot) = self.platform.entity(&self.entity_id).await? else {
            return Ok(Vec::new());
        };
        Ok(HelperPayload::parse(&snapshot.state)
            .map(|payload| payload.into_timers(&self.entity_id))
            .unwrap_or_default())
    }

    async fn save(&self, timers: &[Timer]) -> Result<(), TimerHubError> {
        let value = HelperPayload::from_timers(timers).to_state_string();
        let call = ServiceCall::new(
            entity_domain(&self.entity_id),
            "set_value",
            json!({ "entity_id": self.entity_id, "value": value }),
        );
        self.platform.call_service(call).await
    }
}
