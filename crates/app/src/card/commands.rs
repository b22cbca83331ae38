//! User commands on individual timers.
//!
//! Every command routes on the timer's source: native timers go through
//! platform services, helper and stored timers are rewritten in their
//! store, and read-only sources only support a card-local dismiss.
//! Combinations that make no sense produce a notice instead of an error.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::json;

use timerhub_domain::duration::{format_clock_duration, parse_human_duration};
use timerhub_domain::entity::is_text_entity;
use timerhub_domain::error::{NotFoundError, TimerHubError, ValidationError};
use timerhub_domain::id::TimerId;
use timerhub_domain::label::validate_label;
use timerhub_domain::time::{HOUR, Millis};
use timerhub_domain::timer::record::default_label;
use timerhub_domain::timer::{Timer, TimerPatch, TimerSource, TimerState};

use super::TimerCard;
use crate::ports::{
    AudioPlayer, EntityStateReader, KeyValueStore, MessagePublisher, ServiceCall, ServiceCaller,
    TimerStore,
};

/// Longest timer a user may create.
pub const MAX_DURATION: Millis = 24 * HOUR;

/// Per-timer actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerAction {
    Start,
    Pause,
    Resume,
    Cancel,
    Dismiss,
    Snooze,
}

impl TimerAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Cancel => "cancel",
            Self::Dismiss => "dismiss",
            Self::Snooze => "snooze",
        }
    }
}

impl fmt::Display for TimerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimerAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "pause" => Ok(Self::Pause),
            "resume" => Ok(Self::Resume),
            "cancel" => Ok(Self::Cancel),
            "dismiss" => Ok(Self::Dismiss),
            "snooze" => Ok(Self::Snooze),
            other => Err(format!("unknown timer action: {other}")),
        }
    }
}

/// Result of a command that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Done,
    /// Dropped by the per-timer rate limit.
    Throttled,
    /// Not applicable to this timer; the message is meant for the user.
    Unsupported(String),
}

impl CommandOutcome {
    fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }
}

/// A validated request for a new user timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimer {
    pub duration: Millis,
    pub label: Option<String>,
}

impl NewTimer {
    /// Validate a duration in milliseconds and an optional label.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the duration is not in
    /// `(0, 24h]` or the label is too long.
    pub fn new(duration: Millis, label: Option<String>) -> Result<Self, ValidationError> {
        if duration <= 0 {
            return Err(ValidationError::NonPositiveDuration);
        }
        if duration > MAX_DURATION {
            return Err(ValidationError::DurationTooLong);
        }
        let label = label
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());
        if let Some(label) = &label {
            validate_label(label)?;
        }
        Ok(Self { duration, label })
    }

    /// Parse human duration entry (`90s`, `1h30m`, `5`) and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnparseableDuration`] for input that is not
    /// a duration, plus everything [`NewTimer::new`] rejects.
    pub fn parse(duration: &str, label: Option<String>) -> Result<Self, ValidationError> {
        let ms = parse_human_duration(duration)
            .ok_or_else(|| ValidationError::UnparseableDuration(duration.to_string()))?;
        Self::new(ms, label)
    }

    #[must_use]
    pub fn label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| default_label(Some(self.duration)))
    }
}

const READ_ONLY_NOTICE: &str = "This timer is read-only; it can only be dismissed";
const HIDDEN_ACTIONS_NOTICE: &str = "Actions are hidden for this timer; it can only be dismissed";

impl<P, A, K, B> TimerCard<P, A, K, B>
where
    P: EntityStateReader + ServiceCaller + 'static,
    A: AudioPlayer + 'static,
    K: KeyValueStore + 'static,
    B: MessagePublisher + 'static,
{
    /// Run `action` on the timer `id`.
    ///
    /// Dismiss and cancel are idempotent: an id that is already gone
    /// succeeds without doing anything.
    ///
    /// # Errors
    ///
    /// Returns [`TimerHubError::NotFound`] for an unknown id, or the error
    /// of the underlying service call or store write.
    pub async fn execute(
        &mut self,
        id: &TimerId,
        action: TimerAction,
        now: Millis,
    ) -> Result<CommandOutcome, TimerHubError> {
        let Some(timer) = self.find(id, now).await else {
            if matches!(action, TimerAction::Cancel | TimerAction::Dismiss) {
                self.forget(id);
                return Ok(CommandOutcome::Done);
            }
            return Err(NotFoundError {
                entity: "Timer",
                id: id.to_string(),
            }
            .into());
        };

        let hidden = self
            .config
            .entity(&timer.source_entity)
            .is_some_and(|entity| entity.hide_timer_actions);
        if hidden && action != TimerAction::Dismiss {
            return Ok(CommandOutcome::unsupported(HIDDEN_ACTIONS_NOTICE));
        }

        let outcome = match action {
            TimerAction::Start => self.start(&timer).await?,
            TimerAction::Pause => self.pause(&timer, now).await?,
            TimerAction::Resume => self.resume(&timer, now).await?,
            TimerAction::Cancel => self.cancel(&timer).await?,
            TimerAction::Dismiss => {
                self.forget(&timer.id);
                self.dismiss_timer(&timer).await?
            }
            TimerAction::Snooze => self.snooze(&timer, now).await?,
        };
        if outcome == CommandOutcome::Done
            && matches!(action, TimerAction::Cancel | TimerAction::Dismiss | TimerAction::Snooze)
        {
            // Stores backed by a broker or the platform echo the write a few
            // ticks later; until then the old record must not ring again.
            self.lifecycle.hold(&timer.id, timer.state, now);
        }
        tracing::info!(timer_id = %id, %action, outcome = ?outcome, "timer command");
        Ok(outcome)
    }

    /// Create a user timer, running from `now`.
    ///
    /// Routed to the default text helper when one is configured, otherwise
    /// to the card's storage backend.
    ///
    /// # Errors
    ///
    /// Returns the error of the store write.
    pub async fn create(&mut self, request: NewTimer, now: Millis) -> Result<Timer, TimerHubError> {
        let helper = self
            .config
            .default_timer_entity
            .clone()
            .filter(|entity| is_text_entity(entity));
        let (source, source_entity) = match &helper {
            Some(entity) => (TimerSource::Helper, entity.clone()),
            None => self.store.target(),
        };

        let timer = Timer::builder()
            .id(TimerId::generate())
            .source(source)
            .source_entity(source_entity)
            .label(request.label())
            .duration(Some(request.duration))
            .state(TimerState::Running {
                end: now.saturating_add(request.duration),
            })
            .build()?;

        match &helper {
            Some(entity) => self.helper_store(entity).insert(timer.clone()).await?,
            None => self.store.insert(timer.clone()).await?,
        }
        tracing::info!(timer_id = %timer.id, source = %timer.source, duration = request.duration, "timer created");
        Ok(timer)
    }

    async fn find(&self, id: &TimerId, now: Millis) -> Option<Timer> {
        if let Some(view) = self.views.iter().find(|v| &v.timer.id == id) {
            return Some(view.timer.clone());
        }
        self.collect(now).await.into_iter().find(|t| &t.id == id)
    }

    /// Silence a timer and drop its ringing state.
    fn forget(&mut self, id: &TimerId) {
        self.audio.stop(id);
        self.lifecycle.forget(id);
    }

    async fn call(&self, service: &str, data: serde_json::Value) -> Result<(), TimerHubError> {
        self.platform
            .call_service(ServiceCall::new("timer", service, data))
            .await
    }

    async fn start(&self, timer: &Timer) -> Result<CommandOutcome, TimerHubError> {
        if timer.source != TimerSource::NativeTimer {
            return Ok(CommandOutcome::unsupported("This timer cannot be started here"));
        }
        if !timer.state.is_idle() {
            return Ok(CommandOutcome::unsupported("Only idle timers can be started"));
        }
        let mut data = json!({ "entity_id": timer.source_entity });
        if let Some(duration) = timer.duration {
            data["duration"] = json!(format_clock_duration(duration));
        }
        self.call("start", data).await?;
        Ok(CommandOutcome::Done)
    }

    async fn pause(&self, timer: &Timer, now: Millis) -> Result<CommandOutcome, TimerHubError> {
        if !timer.source.is_mutable() {
            return Ok(CommandOutcome::unsupported(READ_ONLY_NOTICE));
        }
        if !matches!(timer.state, TimerState::Running { .. }) {
            return Ok(CommandOutcome::unsupported("Only running timers can be paused"));
        }
        if timer.source == TimerSource::NativeTimer {
            self.call("pause", json!({ "entity_id": timer.source_entity }))
                .await?;
        } else {
            let patch = TimerPatch {
                state: Some(timer.state.paused_at(now)),
                ..TimerPatch::default()
            };
            self.update_stored(timer, patch).await?;
        }
        Ok(CommandOutcome::Done)
    }

    async fn resume(&self, timer: &Timer, now: Millis) -> Result<CommandOutcome, TimerHubError> {
        if !timer.source.is_mutable() {
            return Ok(CommandOutcome::unsupported(READ_ONLY_NOTICE));
        }
        if !timer.state.is_paused() {
            return Ok(CommandOutcome::unsupported("Only paused timers can be resumed"));
        }
        if timer.source == TimerSource::NativeTimer {
            self.call("start", json!({ "entity_id": timer.source_entity }))
                .await?;
        } else {
            self.update_stored(timer, TimerPatch::rearm(timer.state.resumed_at(now)))
                .await?;
        }
        Ok(CommandOutcome::Done)
    }

    async fn cancel(&mut self, timer: &Timer) -> Result<CommandOutcome, TimerHubError> {
        if !timer.source.is_mutable() {
            return Ok(CommandOutcome::unsupported(READ_ONLY_NOTICE));
        }
        self.forget(&timer.id);
        if timer.source == TimerSource::NativeTimer {
            self.call("cancel", json!({ "entity_id": timer.source_entity }))
                .await?;
        } else {
            self.remove_stored(timer).await?;
        }
        Ok(CommandOutcome::Done)
    }

    /// Removal shared by the dismiss command and the expire policies.
    pub(super) async fn dismiss_timer(&mut self, timer: &Timer) -> Result<CommandOutcome, TimerHubError> {
        match timer.source {
            TimerSource::NativeTimer => {
                let service = if matches!(timer.state, TimerState::Running { .. }) {
                    "finish"
                } else {
                    "cancel"
                };
                self.call(service, json!({ "entity_id": timer.source_entity }))
                    .await?;
            }
            TimerSource::Helper | TimerSource::LocalStorage | TimerSource::MessageBus => {
                self.remove_stored(timer).await?;
            }
            TimerSource::VoiceTimer | TimerSource::Timestamp | TimerSource::MinutesAttribute => {
                self.dismissed.insert(timer.dismiss_key());
            }
        }
        Ok(CommandOutcome::Done)
    }

    async fn snooze(&mut self, timer: &Timer, now: Millis) -> Result<CommandOutcome, TimerHubError> {
        if !timer.source.is_mutable() {
            return Ok(CommandOutcome::unsupported(READ_ONLY_NOTICE));
        }
        if !self.snooze_limiter.try_acquire(&timer.id, now) {
            tracing::debug!(timer_id = %timer.id, "snooze throttled");
            return Ok(CommandOutcome::Throttled);
        }

        let snooze = self.config.snooze_ms();
        if timer.source == TimerSource::NativeTimer {
            self.call(
                "start",
                json!({
                    "entity_id": timer.source_entity,
                    "duration": format_clock_duration(snooze),
                }),
            )
            .await?;
        } else {
            let patch = TimerPatch {
                duration: Some(Some(snooze)),
                ..TimerPatch::rearm(TimerState::Running { end: now.saturating_add(snooze) })
            };
            self.update_stored(timer, patch).await?;
        }

        self.audio.stop(&timer.id);
        self.lifecycle.rearm(&timer.id);
        Ok(CommandOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_duration_and_default_label() {
        let request = NewTimer::parse("90s", None).unwrap();
        assert_eq!(request.duration, 90_000);
        assert_eq!(request.label(), "1m30s Timer");
    }

    #[test]
    fn should_reject_out_of_range_durations() {
        assert_eq!(NewTimer::new(0, None), Err(ValidationError::NonPositiveDuration));
        assert_eq!(NewTimer::new(MAX_DURATION + 1, None), Err(ValidationError::DurationTooLong));
        assert!(NewTimer::new(MAX_DURATION, None).is_ok());
        assert_eq!(
            NewTimer::parse("later", None),
            Err(ValidationError::UnparseableDuration("later".into()))
        );
    }

    #[test]
    fn should_reject_overflowing_duration_text() {
        let text = "9999999999999999999h 9999999999999999999h";
        assert_eq!(
            NewTimer::parse(text, None),
            Err(ValidationError::UnparseableDuration(text.into()))
        );
        assert_eq!(NewTimer::parse("100000h", None), Err(ValidationError::DurationTooLong));
    }

    #[test]
    fn should_reject_long_labels_and_blank_to_default() {
        assert!(matches!(
            NewTimer::new(1_000, Some("x".repeat(101))),
            Err(ValidationError::LabelTooLong { .. })
        ));
        let request = NewTimer::new(60_000, Some("   ".into())).unwrap();
        assert_eq!(request.label(), "1m Timer");
    }

    #[test]
    fn should_parse_actions_from_path_segments() {
        assert_eq!("snooze".parse::<TimerAction>(), Ok(TimerAction::Snooze));
        assert!("explode".parse::<TimerAction>().is_err());
        assert_eq!(TimerAction::Dismiss.to_string(), "dismiss");
    }
}
