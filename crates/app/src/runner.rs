//! Background tick loop driving a [`TimerCard`].

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use timerhub_domain::time::now_ms;

use crate::card::SharedCard;
use crate::ports::{AudioPlayer, EntityStateReader, KeyValueStore, MessagePublisher, ServiceCaller};

/// Refresh cadence while timers are displayed.
pub const TICK_PERIOD: Duration = Duration::from_millis(250);

/// Owns the task that ticks a card. Restarting replaces the previous loop,
/// so at most one runs per card.
#[derive(Default)]
pub struct TickLoop {
    handle: Option<JoinHandle<()>>,
}

impl TickLoop {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking `card` every `period`, cancelling any running loop.
    pub fn start<P, A, K, B>(&mut self, card: SharedCard<P, A, K, B>, period: Duration)
    where
        P: EntityStateReader + ServiceCaller + 'static,
        A: AudioPlayer + 'static,
        K: KeyValueStore + 'static,
        B: MessagePublisher + 'static,
    {
        self.stop();
        tracing::debug!(period_ms = period.as_millis(), "starting tick loop");
        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                card.lock().await.tick(now_ms()).await;
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("tick loop stopped");
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for TickLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Stop the loop, then silence and reset the card.
pub async fn shutdown<P, A, K, B>(ticks: &mut TickLoop, card: &SharedCard<P, A, K, B>)
where
    P: EntityStateReader + ServiceCaller + 'static,
    A: AudioPlayer + 'static,
    K: KeyValueStore + 'static,
    B: MessagePublisher + 'static,
{
    ticks.stop();
    card.lock().await.teardown();
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use timerhub_domain::config::CardConfig;

    use super::*;
    use crate::card::{NewTimer, TimerCard};
    use crate::testing::{FakePlatform, MemoryKv, RecordingPlayer, RecordingPublisher};

    fn card() -> SharedCard<FakePlatform, RecordingPlayer, MemoryKv, RecordingPublisher> {
        TimerCard::new(
            CardConfig::default(),
            Arc::new(FakePlatform::default()),
            Arc::new(RecordingPlayer::default()),
            Arc::new(MemoryKv::default()),
            Arc::new(RecordingPublisher::default()),
        )
        .shared()
    }

    #[tokio::test]
    async fn should_refresh_views_in_background() {
        let card = card();
        card.lock()
            .await
            .create(NewTimer::new(60_000, None).unwrap(), now_ms())
            .await
            .unwrap();

        let mut ticks = TickLoop::new();
        ticks.start(Arc::clone(&card), Duration::from_millis(10));
        assert!(ticks.is_running());
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(card.lock().await.views().len(), 1);
    }

    #[tokio::test]
    async fn should_stop_and_clear_on_shutdown() {
        let card = card();
        let mut ticks = TickLoop::new();
        ticks.start(Arc::clone(&card), Duration::from_millis(10));
        card.lock()
            .await
            .create(NewTimer::new(60_000, None).unwrap(), now_ms())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        shutdown(&mut ticks, &card).await;
        assert!(!ticks.is_running());
        assert!(card.lock().await.views().is_empty());
    }

    #[tokio::test]
    async fn should_replace_running_loop_on_restart() {
        let card = card();
        let mut ticks = TickLoop::new();
        ticks.start(Arc::clone(&card), Duration::from_millis(10));
        ticks.start(Arc::clone(&card), Duration::from_millis(10));
        assert!(ticks.is_running());
        ticks.stop();
        assert!(!ticks.is_running());
    }
}
