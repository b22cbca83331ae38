//! Ringing and expiry state machine.
//!
//! Pure bookkeeping: [`Lifecycle::observe`] compares one tick's views with
//! the previous tick and reports what the card has to do. It never touches
//! audio, storage or the platform itself.

use std::collections::{HashMap, HashSet};

use timerhub_domain::config::{CardConfig, ExpireAction};
use timerhub_domain::id::TimerId;
use timerhub_domain::time::{Millis, SECOND};
use timerhub_domain::timer::{Timer, TimerState};
use timerhub_domain::timer::view::TimerView;

/// Longest a command's write may take to show up in the store before the
/// old record is allowed to ring again.
pub const HOLD_FOR: Millis = 5 * SECOND;

/// Work produced by one [`Lifecycle::observe`] call.
#[derive(Debug, Default)]
pub struct Transitions {
    /// Timers that started ringing this tick.
    pub rang: Vec<Timer>,
    /// Ids that were ringing and no longer are.
    pub silenced: Vec<TimerId>,
    /// First expiry observations to write back to storage.
    pub persist_expiry: Vec<(Timer, Millis)>,
    /// Timers whose expire policy says they should now be removed.
    pub remove: Vec<Timer>,
}

#[derive(Debug, Default)]
pub struct Lifecycle {
    ringing: HashSet<TimerId>,
    /// First time each timer was seen ringing. The only record of expiry
    /// for sources that cannot persist it.
    expired_at: HashMap<TimerId, Millis>,
    /// One-shot guards: a timer is handed out for removal at most once.
    removed: HashSet<TimerId>,
    /// Timers whose stored record a command has just rewritten, with the
    /// state they had before and when the write was issued. While the store
    /// still reports that state they cannot ring.
    held: HashMap<TimerId, (TimerState, Millis)>,
}

impl Lifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, views: &[TimerView], config: &CardConfig, now: Millis) -> Transitions {
        let mut transitions = Transitions::default();
        self.held.retain(|id, (stale, since)| {
            now.saturating_sub(*since) < HOLD_FOR
                && views
                    .iter()
                    .any(|v| &v.timer.id == id && v.timer.state == *stale)
        });
        let ringing: Vec<&TimerView> = views
            .iter()
            .filter(|v| v.ringing && !self.held.contains_key(&v.timer.id))
            .collect();
        let current: HashSet<TimerId> = ringing.iter().map(|v| v.timer.id.clone()).collect();

        for view in &ringing {
            if !self.ringing.contains(&view.timer.id) {
                transitions.rang.push(view.timer.clone());
            }
        }
        transitions.silenced = self.ringing.difference(&current).cloned().collect();
        self.ringing = current;

        for view in ringing {
            let timer = &view.timer;
            match config.expire_action {
                ExpireAction::Dismiss => {}
                ExpireAction::Keep => {
                    let recorded = timer
                        .expired_at
                        .or_else(|| self.expired_at.get(&timer.id).copied());
                    let at = recorded.unwrap_or_else(|| {
                        if timer.source.persists_expiry() {
                            transitions.persist_expiry.push((timer.clone(), now));
                        }
                        now
                    });
                    self.expired_at.entry(timer.id.clone()).or_insert(at);
                    if now.saturating_sub(at) >= config.keep_for_ms() && self.removed.insert(timer.id.clone()) {
                        transitions.remove.push(timer.clone());
                    }
                }
                ExpireAction::Remove => {
                    let at = *self.expired_at.entry(timer.id.clone()).or_insert(now);
                    let delay = if config.audio_for(timer.source, &timer.source_entity).enabled {
                        config.completion_delay_ms()
                    } else {
                        0
                    };
                    if now.saturating_sub(at) >= delay && self.removed.insert(timer.id.clone()) {
                        transitions.remove.push(timer.clone());
                    }
                }
            }
        }

        transitions
    }

    #[must_use]
    pub fn is_ringing(&self, id: &TimerId) -> bool {
        self.ringing.contains(id)
    }

    /// Drop ringing and expiry state for `id`; the removal guard stays.
    pub fn forget(&mut self, id: &TimerId) {
        self.ringing.remove(id);
        self.expired_at.remove(id);
    }

    /// Forget `id` entirely so it can ring and expire again.
    pub fn rearm(&mut self, id: &TimerId) {
        self.forget(id);
        self.removed.remove(id);
    }

    /// Suppress ringing for `id` until the store reports a state other than
    /// `stale`, or [`HOLD_FOR`] has passed.
    pub fn hold(&mut self, id: &TimerId, stale: TimerState, now: Millis) {
        self.held.insert(id.clone(), (stale, now));
    }

    /// Drop bookkeeping for timers that are no longer present.
    pub fn sweep(&mut self, present: &HashSet<TimerId>) {
        self.expired_at.retain(|id, _| present.contains(id));
        self.removed.retain(|id| present.contains(id));
    }

    pub fn clear(&mut self) {
        self.ringing.clear();
        self.expired_at.clear();
        self.removed.clear();
        self.held.clear();
    }

    #[must_use]
    pub fn tracked(&self) -> usize {
        self.expired_at.len() + self.removed.len() + self.held.len()
    }
}
