//! Per-timer action rate limiting.

use std::collections::HashMap;

use timerhub_domain::id::TimerId;
use timerhub_domain::time::{Millis, SECOND};

/// Allows one action per timer id within `interval`.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Millis,
    last: HashMap<TimerId, Millis>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(SECOND)
    }
}

impl RateLimiter {
    #[must_use]
    pub fn new(interval: Millis) -> Self {
        Self {
            interval,
            last: HashMap::new(),
        }
    }

    /// Record an attempt at `now`; `false` if the previous accepted attempt
    /// for `id` is too recent.
    pub fn try_acquire(&mut self, id: &TimerId, now: Millis) -> bool {
        match self.last.get(id) {
            Some(last) if now - *last < self.interval => false,
            _ => {
                self.last.insert(id.clone(), now);
                true
            }
        }
    }

    /// Drop entries that can no longer throttle anything.
    pub fn sweep(&mut self, now: Millis) {
        let interval = self.interval;
        self.last.retain(|_, last| now - *last < interval);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.last.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }

    pub fn clear(&mut self) {
        self.last.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reject_second_action_within_interval() {
        let mut limiter = RateLimiter::default();
        let id = TimerId::from("a");
        assert!(limiter.try_acquire(&id, 0));
        assert!(!limiter.try_acquire(&id, 500));
        assert!(limiter.try_acquire(&id, 1_000));
    }

    #[test]
    fn should_track_ids_independently() {
        let mut limiter = RateLimiter::default();
        assert!(limiter.try_acquire(&TimerId::from("a"), 0));
        assert!(limiter.try_acquire(&TimerId::from("b"), 10));
    }

    #[test]
    fn should_sweep_stale_entries() {
        let mut limiter = RateLimiter::default();
        limiter.try_acquire(&TimerId::from("a"), 0);
        limiter.try_acquire(&TimerId::from("b"), 9_500);
        limiter.sweep(10_000);
        assert_eq!(limiter.len(), 1);
    }
}
