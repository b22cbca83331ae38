//! Per-tick collection of timers from every configured source.

use std::collections::HashSet;

use timerhub_domain::config::CardConfig;
use timerhub_domain::id::TimerId;
use timerhub_domain::time::Millis;
use timerhub_domain::timer::Timer;

use crate::ports::{EntityStateReader, TimerStore};
use crate::sources::parse_entity;

/// `(source_entity, id)` pairs hidden on this card.
pub type DismissedSet = HashSet<(String, TimerId)>;

/// Gather timers from the configured entities and the store.
///
/// Every read is isolated: a failing entity or store is logged and
/// contributes nothing. Dismissed timers are dropped, and when two sources
/// report the same id the first one wins.
pub async fn collect<R, S>(
    reader: &R,
    store: &S,
    config: &CardConfig,
    dismissed: &DismissedSet,
    now: Millis,
) -> Vec<Timer>
where
    R: EntityStateReader,
    S: TimerStore,
{
    let mut timers = Vec::new();

    for entity in &config.entities {
        match reader.entity(&entity.entity).await {
            Ok(Some(snapshot)) => timers.extend(parse_entity(&snapshot, entity, now)),
            Ok(None) => tracing::debug!(entity = %entity.entity, "entity not found"),
            Err(err) => tracing::warn!(entity = %entity.entity, error = %err, "failed to read entity"),
        }
    }

    match store.load().await {
        Ok(stored) => timers.extend(stored),
        Err(err) => tracing::warn!(error = %err, "failed to load stored timers"),
    }

    let mut seen = HashSet::new();
    timers.retain(|timer| {
        if dismissed.contains(&timer.dismiss_key()) {
            return false;
        }
        if !seen.insert(timer.id.clone()) {
            tracing::debug!(timer_id = %timer.id, source = %timer.source, "duplicate timer id dropped");
            return false;
        }
        true
    });
    timers
}
