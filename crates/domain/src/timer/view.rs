//! Per-tick derived view of a timer: remaining time, progress, ringing.

use std::cmp::Ordering;

use serde::Serialize;

use super::Timer;
use crate::label::sanitize_label;
use crate::time::Millis;

/// A [`Timer`] plus the values derived from it at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerView {
    #[serde(flatten)]
    pub timer: Timer,
    /// Milliseconds left, never negative.
    pub remaining: Millis,
    /// Elapsed share of `duration`, in `[0, 100]`; `0` when unknown.
    pub percent: f64,
    /// Expired but not yet handled.
    pub ringing: bool,
}

impl TimerView {
    /// Derive the view of `timer` at `now`.
    #[must_use]
    pub fn at(timer: Timer, now: Millis) -> Self {
        let remaining = timer.remaining_at(now);
        let percent = match timer.duration {
            Some(duration) if duration > 0 => {
                #[allow(clippy::cast_precision_loss)]
                let elapsed = duration.saturating_sub(remaining) as f64 / duration as f64 * 100.0;
                elapsed.clamp(0.0, 100.0)
            }
            _ => 0.0,
        };
        let ringing = remaining <= 0 && !timer.state.is_paused() && !timer.state.is_idle();
        Self {
            timer,
            remaining,
            percent,
            ringing,
        }
    }

    /// Label with markup escaped.
    #[must_use]
    pub fn display_label(&self) -> String {
        sanitize_label(&self.timer.label)
    }

    fn bucket(&self) -> (bool, bool) {
        (self.timer.state.is_finished(), self.timer.state.is_idle())
    }
}

/// Order by `(finished, idle, remaining)`: active timers first with the
/// soonest deadline on top, then idle timers, then finished ones.
pub fn sort_views(views: &mut [TimerView]) {
    views.sort_by(compare);
}

fn compare(a: &TimerView, b: &TimerView) -> Ordering {
    a.bucket()
        .cmp(&b.bucket())
        .then(a.remaining.cmp(&b.remaining))
}

/// Derive and sort views for a merged timer set.
#[must_use]
pub fn normalize(timers: Vec<Timer>, now: Millis) -> Vec<TimerView> {
    let mut views: Vec<TimerView> = timers.into_iter().map(|t| TimerView::at(t, now)).collect();
    sort_views(&mut views);
    views
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TimerState;

    fn timer(id: &str, state: TimerState, duration: Option<Millis>) -> Timer {
        Timer::builder()
            .id(id)
            .label(id)
            .duration(duration)
            .state(state)
            .build()
            .unwrap()
    }

    #[test]
    fn should_compute_percent_from_elapsed_share() {
        let view = TimerView::at(
            timer("a", TimerState::Running { end: 75_000 }, Some(100_000)),
            0,
        );
        assert_eq!(view.remaining, 75_000);
        assert!((view.percent - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_report_zero_percent_without_duration() {
        let view = TimerView::at(timer("a", TimerState::Running { end: 10 }, None), 100);
        assert_eq!(view.remaining, 0);
        assert!(view.percent.abs() < f64::EPSILON);
    }

    #[test]
    fn should_clamp_percent_when_remaining_exceeds_duration() {
        let view = TimerView::at(
            timer("a", TimerState::Running { end: 500_000 }, Some(60_000)),
            0,
        );
        assert!(view.percent.abs() < f64::EPSILON);
    }

    #[test]
    fn should_ring_only_when_expired_and_active() {
        let ringing = TimerView::at(timer("a", TimerState::Running { end: 5 }, None), 10);
        assert!(ringing.ringing);

        let paused = TimerView::at(timer("b", TimerState::Paused { remaining: 0 }, None), 10);
        assert!(!paused.ringing);

        let idle = TimerView::at(timer("c", TimerState::Idle, None), 10);
        assert!(!idle.ringing);

        let finished = TimerView::at(timer("d", TimerState::Finished { at: 3 }, Some(5)), 10);
        assert!(finished.ringing);
    }

    #[test]
    fn should_sort_idle_and_finished_after_active_timers() {
        let views = normalize(
            vec![
                timer("idle", TimerState::Idle, Some(1_000)),
                timer("done", TimerState::Finished { at: 0 }, Some(1_000)),
                timer("late", TimerState::Running { end: 900_000 }, None),
                timer("soon", TimerState::Running { end: 5_000 }, None),
                timer("paused", TimerState::Paused { remaining: 60_000 }, None),
            ],
            0,
        );
        let order: Vec<&str> = views.iter().map(|v| v.timer.id.as_str()).collect();
        assert_eq!(order, ["soon", "paused", "late", "idle", "done"]);
    }

    #[test]
    fn should_escape_display_label() {
        let view = TimerView::at(timer("<x>", TimerState::Idle, None), 0);
        assert_eq!(view.display_label(), "&lt;x&gt;");
    }
}
