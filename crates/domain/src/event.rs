//! Lifecycle events emitted when a timer starts ringing.

use serde::{Deserialize, Serialize};

use crate::id::TimerId;
use crate::time::Millis;
use crate::timer::{Timer, TimerSource};

/// Kind of lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerEventKind {
    Expired,
}

/// Payload published to the events topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerEvent {
    pub id: TimerId,
    pub label: String,
    pub source: TimerSource,
    pub source_entity: String,
    pub timestamp: Millis,
    pub event: TimerEventKind,
}

impl TimerEvent {
    #[must_use]
    pub fn expired(timer: &Timer, timestamp: Millis) -> Self {
        Self {
            id: timer.id.clone(),
            label: timer.label.clone(),
            source: timer.source,
            source_entity: timer.source_entity.clone(),
            timestamp,
            event: TimerEventKind::Expired,
        }
    }
}
