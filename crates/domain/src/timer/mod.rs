//! Timer: one countdown, whatever it came from.
//!
//! Every source (native timer entities, voice assistants, helper JSON,
//! message-bus sensors, ETA sensors, local storage) is normalised into a
//! [`Timer`]. The running/paused overload of the persisted `end` field is
//! represented here as the [`TimerState`] tagged union; the overload only
//! exists in [`record::TimerRecord`].

pub mod record;
mod source;
pub mod view;

pub use source::TimerSource;

use serde::{Deserialize, Serialize};

use crate::error::{TimerHubError, ValidationError};
use crate::id::TimerId;
use crate::time::Millis;

/// Effective state of a timer at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TimerState {
    /// Counting down towards the absolute deadline `end`.
    Running { end: Millis },
    /// Frozen with `remaining` milliseconds left.
    Paused { remaining: Millis },
    /// Configured but not started (native timers only).
    Idle,
    /// Completed at `at`; reported by sources with a distinct finished state.
    Finished { at: Millis },
}

impl TimerState {
    #[must_use]
    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused { .. })
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    /// Milliseconds left at `now`, clamped at zero.
    ///
    /// Idle timers report their full `duration` (or zero when unknown).
    #[must_use]
    pub fn remaining_at(&self, now: Millis, duration: Option<Millis>) -> Millis {
        let remaining = match *self {
            Self::Running { end } => end.saturating_sub(now),
            Self::Paused { remaining } => remaining,
            Self::Idle => duration.unwrap_or(0),
            Self::Finished { .. } => 0,
        };
        remaining.max(0)
    }

    /// The state after pausing at `now`. Only running timers change.
    #[must_use]
    pub fn paused_at(self, now: Millis) -> Self {
        match self {
            Self::Running { end } => Self::Paused {
                remaining: end.saturating_sub(now).max(0),
            },
            other => other,
        }
    }

    /// The state after resuming at `now`. Only paused timers change.
    #[must_use]
    pub fn resumed_at(self, now: Millis) -> Self {
        match self {
            Self::Paused { remaining } => Self::Running {
                end: now.saturating_add(remaining),
            },
            other => other,
        }
    }
}

/// A normalised countdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    pub id: TimerId,
    pub source: TimerSource,
    /// Entity this timer was derived from or is persisted against.
    pub source_entity: String,
    /// Raw label; run it through [`sanitize_label`](crate::label::sanitize_label)
    /// before display.
    pub label: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    /// Original total length, unknown for some sources.
    pub duration: Option<Millis>,
    pub state: TimerState,
    /// First time the timer was observed ringing, when persisted.
    pub expired_at: Option<Millis>,
}

impl Timer {
    /// Create a builder for constructing a [`Timer`].
    #[must_use]
    pub fn builder() -> TimerBuilder {
        TimerBuilder::default()
    }

    #[must_use]
    pub fn remaining_at(&self, now: Millis) -> Millis {
        self.state.remaining_at(now, self.duration)
    }

    /// Key used by the client-local dismissed set.
    #[must_use]
    pub fn dismiss_key(&self) -> (String, TimerId) {
        (self.source_entity.clone(), self.id.clone())
    }
}

/// Partial update applied by [`TimerStore::update`]-style operations.
///
/// `None` leaves a field untouched. `expired_at: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimerPatch {
    pub label: Option<String>,
    pub duration: Option<Option<Millis>>,
    pub state: Option<TimerState>,
    pub expired_at: Option<Option<Millis>>,
}

impl TimerPatch {
    /// Patch that moves a timer to `state` and clears any expiry bookkeeping.
    #[must_use]
    pub fn rearm(state: TimerState) -> Self {
        Self {
            state: Some(state),
            expired_at: Some(None),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn expired_at(at: Millis) -> Self {
        Self {
            expired_at: Some(Some(at)),
            ..Self::default()
        }
    }

    pub fn apply(&self, timer: &mut Timer) {
        if let Some(label) = &self.label {
            timer.label.clone_from(label);
        }
        if let Some(duration) = self.duration {
            timer.duration = duration;
        }
        if let Some(state) = self.state {
            timer.state = state;
        }
        if let Some(expired_at) = self.expired_at {
            timer.expired_at = expired_at;
        }
    }
}

/// Step-by-step builder for [`Timer`].
#[derive(Debug, Default)]
pub struct TimerBuilder {
    id: Option<TimerId>,
    source: Option<TimerSource>,
    source_entity: Option<String>,
    label: Option<String>,
    icon: Option<String>,
    color: Option<String>,
    duration: Option<Millis>,
    state: Option<TimerState>,
    expired_at: Option<Millis>,
}

impl TimerBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<TimerId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn source(mut self, source: TimerSource) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn source_entity(mut self, entity: impl Into<String>) -> Self {
        self.source_entity = Some(entity.into());
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: Option<String>) -> Self {
        self.icon = icon;
        self
    }

    #[must_use]
    pub fn color(mut self, color: Option<String>) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn duration(mut self, duration: Option<Millis>) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn state(mut self, state: TimerState) -> Self {
        self.state = Some(state);
        self
    }

    #[must_use]
    pub fn expired_at(mut self, expired_at: Option<Millis>) -> Self {
        self.expired_at = expired_at;
        self
    }

    /// Consume the builder and return a [`Timer`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTimerId`] when no id was given.
    pub fn build(self) -> Result<Timer, TimerHubError> {
        let id = self.id.unwrap_or_else(|| TimerId::new(""));
        if id.is_empty() {
            return Err(ValidationError::EmptyTimerId.into());
        }
        Ok(Timer {
            id,
            source: self.source.unwrap_or(TimerSource::LocalStorage),
            source_entity: self.source_entity.unwrap_or_default(),
            label: self.label.unwrap_or_else(|| "Timer".to_string()),
            icon: self.icon,
            color: self.color,
            duration: self.duration.filter(|d| *d > 0),
            state: self.state.unwrap_or(TimerState::Idle),
            expired_at: self.expired_at,
        })
    }
}
