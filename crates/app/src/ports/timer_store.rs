//! Timer store port: persistence for user-created timers.
//!
//! Every backend is last-write-wins: `update` and `remove` read the whole
//! collection, change it in memory and write it all back. Two writers racing
//! can lose an update; that is accepted.

use std::future::Future;

use timerhub_domain::error::TimerHubError;
use timerhub_domain::id::TimerId;
use timerhub_domain::timer::{Timer, TimerPatch};

/// A persisted collection of timers.
pub trait TimerStore: Send + Sync {
    /// Read the whole collection. Corrupt data yields an empty list.
    fn load(&self) -> impl Future<Output = Result<Vec<Timer>, TimerHubError>> + Send;

    /// Replace the whole collection.
    fn save(&self, timers: &[Timer]) -> impl Future<Output = Result<(), TimerHubError>> + Send;

    /// Apply `patch` to the timer `id`. Missing ids are ignored.
    fn update(
        &self,
        id: &TimerId,
        patch: TimerPatch,
    ) -> impl Future<Output = Result<(), TimerHubError>> + Send {
        async move {
            let mut timers = self.load().await?;
            let Some(timer) = timers.iter_mut().find(|t| &t.id == id) else {
                tracing::debug!(timer_id = %id, "update skipped, timer not stored");
                return Ok(());
            };
            patch.apply(timer);
            self.save(&timers).await
        }
    }

    /// Drop the timer `id`. Missing ids are ignored.
    fn remove(&self, id: &TimerId) -> impl Future<Output = Result<(), TimerHubError>> + Send {
        async move {
            let mut timers = self.load().await?;
            let before = timers.len();
            timers.retain(|t| &t.id != id);
            if timers.len() == before {
                return Ok(());
            }
            self.save(&timers).await
        }
    }

    /// Append a timer to the collection.
    fn insert(&self, timer: Timer) -> impl Future<Output = Result<(), TimerHubError>> + Send {
        async move {
            let mut timers = self.load().await?;
            timers.retain(|t| t.id != timer.id);
            timers.push(timer);
            self.save(&timers).await
        }
    }
}
