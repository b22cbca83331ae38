//! Timer card: all state of one card instance and its tick.
//!
//! A card owns its ringing set, expiry bookkeeping, dismissed set, audio
//! handles and rate limits. Nothing is process-wide, so several cards can
//! run side by side without interfering.

mod aggregate;
mod commands;

pub use aggregate::{DismissedSet, collect};
pub use commands::{CommandOutcome, NewTimer, TimerAction};

use std::collections::HashSet;
use std::sync::Arc;

use timerhub_domain::config::{CardConfig, StorageKind};
use timerhub_domain::error::TimerHubError;
use timerhub_domain::event::TimerEvent;
use timerhub_domain::id::TimerId;
use timerhub_domain::time::{Millis, SECOND};
use timerhub_domain::timer::view::{TimerView, normalize};
use timerhub_domain::timer::{Timer, TimerPatch, TimerSource};

use crate::audio::AudioNotifier;
use crate::lifecycle::{Lifecycle, Transitions};
use crate::ports::{
    AudioPlayer, EntityStateReader, KeyValueStore, MessagePublisher, ServiceCaller, TimerStore,
};
use crate::rate_limit::RateLimiter;
use crate::storage::{CardStore, HelperTimerStore};

/// How often stale bookkeeping is swept.
pub const SWEEP_INTERVAL: Millis = 10 * SECOND;

/// A card shared between the tick loop and command handlers.
pub type SharedCard<P, A, K, B> = Arc<tokio::sync::Mutex<TimerCard<P, A, K, B>>>;

/// One timer card.
///
/// Generic over the platform `P`, the audio player `A`, the key/value
/// store `K` behind local storage and the message-bus publisher `B`.
pub struct TimerCard<P, A, K, B> {
    config: CardConfig,
    platform: Arc<P>,
    kv: Arc<K>,
    publisher: Arc<B>,
    store: CardStore<Arc<K>, Arc<P>, Arc<B>>,
    lifecycle: Lifecycle,
    audio: AudioNotifier<A>,
    dismissed: DismissedSet,
    snooze_limiter: RateLimiter,
    views: Vec<TimerView>,
    last_sweep: Millis,
}

impl<P, A, K, B> TimerCard<P, A, K, B>
where
    P: EntityStateReader + ServiceCaller + 'static,
    A: AudioPlayer + 'static,
    K: KeyValueStore + 'static,
    B: MessagePublisher + 'static,
{
    pub fn new(
        config: CardConfig,
        platform: Arc<P>,
        audio: Arc<A>,
        kv: Arc<K>,
        publisher: Arc<B>,
    ) -> Self {
        let store = CardStore::from_config(
            &config,
            Arc::clone(&kv),
            Arc::clone(&platform),
            Arc::clone(&publisher),
        );
        Self {
            config,
            platform,
            kv,
            publisher,
            store,
            lifecycle: Lifecycle::new(),
            audio: AudioNotifier::new(audio),
            dismissed: DismissedSet::new(),
            snooze_limiter: RateLimiter::default(),
            views: Vec::new(),
            last_sweep: 0,
        }
    }

    /// Wrap the card for sharing with the tick loop and HTTP handlers.
    #[must_use]
    pub fn shared(self) -> SharedCard<P, A, K, B> {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    #[must_use]
    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    /// Views computed by the last tick.
    #[must_use]
    pub fn views(&self) -> &[TimerView] {
        &self.views
    }

    /// Quick-create durations from `timer_presets`.
    #[must_use]
    pub fn presets(&self) -> Vec<Millis> {
        self.config.presets()
    }

    /// Swap in a new configuration and rebuild the storage backend.
    pub fn reconfigure(&mut self, config: CardConfig) {
        self.store = CardStore::from_config(
            &config,
            Arc::clone(&self.kv),
            Arc::clone(&self.platform),
            Arc::clone(&self.publisher),
        );
        tracing::info!(
            entities = config.entities.len(),
            storage = ?config.storage,
            "card reconfigured"
        );
        self.config = config;
    }

    /// Read every source, normalise, and drive the lifecycle.
    pub async fn tick(&mut self, now: Millis) -> &[TimerView] {
        let timers = self.collect(now).await;
        let views = normalize(timers, now);
        let transitions = self.lifecycle.observe(&views, &self.config, now);
        self.views = views;
        self.apply(transitions, now).await;

        if now - self.last_sweep >= SWEEP_INTERVAL {
            self.sweep(now);
        }
        &self.views
    }

    /// Drop bookkeeping for timers that disappeared.
    pub fn sweep(&mut self, now: Millis) {
        let present: HashSet<TimerId> = self.views.iter().map(|v| v.timer.id.clone()).collect();
        self.lifecycle.sweep(&present);
        self.snooze_limiter.sweep(now);
        self.audio.sweep();
        self.last_sweep = now;
    }

    /// Stop all sound and forget all per-card state.
    pub fn teardown(&mut self) {
        self.audio.stop_all();
        self.lifecycle.clear();
        self.dismissed.clear();
        self.snooze_limiter.clear();
        self.views.clear();
        tracing::info!("card torn down");
    }

    async fn collect(&self, now: Millis) -> Vec<Timer> {
        collect(
            self.platform.as_ref(),
            &self.store,
            &self.config,
            &self.dismissed,
            now,
        )
        .await
    }

    async fn apply(&mut self, transitions: Transitions, now: Millis) {
        for id in &transitions.silenced {
            self.audio.stop(id);
        }

        for timer in &transitions.rang {
            tracing::info!(timer_id = %timer.id, source = %timer.source, "timer ringing");
            let settings = self.config.audio_for(timer.source, &timer.source_entity);
            self.audio.start(&timer.id, &settings);
            self.emit_expired(timer, now).await;
        }

        for (timer, at) in &transitions.persist_expiry {
            if let Err(err) = self.update_stored(timer, TimerPatch::expired_at(*at)).await {
                tracing::warn!(timer_id = %timer.id, error = %err, "failed to persist expiry");
            }
        }

        for timer in &transitions.remove {
            tracing::info!(timer_id = %timer.id, policy = ?self.config.expire_action, "removing expired timer");
            self.audio.stop(&timer.id);
            if let Err(err) = self.dismiss_timer(timer).await {
                tracing::warn!(timer_id = %timer.id, error = %err, "failed to remove expired timer");
            }
        }
    }

    async fn emit_expired(&self, timer: &Timer, now: Millis) {
        if self.config.storage != StorageKind::Mqtt {
            return;
        }
        let event = TimerEvent::expired(timer, now);
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(timer_id = %timer.id, error = %err, "failed to encode event");
                return;
            }
        };
        if let Err(err) = self
            .publisher
            .publish(&self.config.mqtt.events_topic, payload, false)
            .await
        {
            tracing::warn!(timer_id = %timer.id, error = %err, "failed to publish expired event");
        }
    }

    fn helper_store(&self, entity_id: &str) -> HelperTimerStore<Arc<P>> {
        HelperTimerStore::new(Arc::clone(&self.platform), entity_id)
    }

    /// Apply `patch` to a timer in whichever store backs it.
    async fn update_stored(&self, timer: &Timer, patch: TimerPatch) -> Result<(), TimerHubError> {
        match timer.source {
            TimerSource::Helper => {
                self.helper_store(&timer.source_entity)
                    .update(&timer.id, patch)
                    .await
            }
            TimerSource::LocalStorage | TimerSource::MessageBus => {
                self.store.update(&timer.id, patch).await
            }
            _ => Ok(()),
        }
    }

    async fn remove_stored(&self, timer: &Timer) -> Result<(), TimerHubError> {
        match timer.source {
            TimerSource::Helper => self.helper_store(&timer.source_entity).remove(&timer.id).await,
            TimerSource::LocalStorage | TimerSource::MessageBus => self.store.remove(&timer.id).await,
            _ => Ok(()),
        }
    }
}
