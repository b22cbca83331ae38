//! Audio notifier: one playback loop per ringing timer.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinHandle;

use timerhub_domain::config::AudioSettings;
use timerhub_domain::id::TimerId;

use crate::ports::AudioPlayer;

/// Owns the playback task of every ringing timer.
///
/// Stopping aborts the task, which drops the in-flight `play` future and
/// with it the playback. Stopping an id that is not playing is a no-op.
pub struct AudioNotifier<A> {
    player: Arc<A>,
    playing: HashMap<TimerId, JoinHandle<()>>,
}

impl<A: AudioPlayer + 'static> AudioNotifier<A> {
    pub fn new(player: Arc<A>) -> Self {
        Self {
            player,
            playing: HashMap::new(),
        }
    }

    /// Start the sound for `id`, replacing any sound already playing for it.
    ///
    /// Returns `false` when the settings disable audio or the URL is not
    /// allowed.
    pub fn start(&mut self, id: &TimerId, settings: &AudioSettings) -> bool {
        self.stop(id);
        let Some(url) = settings.playable_url() else {
            if settings.enabled {
                tracing::warn!(timer_id = %id, url = ?settings.file_url, "audio url rejected");
            }
            return false;
        };

        let url = url.to_string();
        let player = Arc::clone(&self.player);
        let repeat = if settings.play_until_dismissed {
            None
        } else {
            Some(settings.repeat_count.max(1))
        };
        let timer_id = id.clone();

        let handle = tokio::spawn(async move {
            let mut played = 0_u32;
            loop {
                if let Err(err) = player.play(&url).await {
                    tracing::warn!(timer_id = %timer_id, error = %err, "audio playback failed");
                    break;
                }
                played += 1;
                if repeat.is_some_and(|n| played >= n) {
                    break;
                }
                // A player that completes instantly must not starve the runtime.
                tokio::task::yield_now().await;
            }
            tracing::debug!(timer_id = %timer_id, played, "audio finished");
        });
        self.playing.insert(id.clone(), handle);
        true
    }

    pub fn stop(&mut self, id: &TimerId) {
        if let Some(handle) = self.playing.remove(id) {
            handle.abort();
        }
    }

    pub fn stop_all(&mut self) {
        for (_, handle) in self.playing.drain() {
            handle.abort();
        }
    }

    #[must_use]
    pub fn is_playing(&self, id: &TimerId) -> bool {
        self.playing.get(id).is_some_and(|h| !h.is_finished())
    }

    /// Forget playback tasks that completed on their own.
    pub fn sweep(&mut self) {
        self.playing.retain(|_, handle| !handle.is_finished());
    }
}

impl<A> Drop for AudioNotifier<A> {
    fn drop(&mut self) {
        for (_, handle) in self.playing.drain() {
            handle.abort();
        }
    }
}
