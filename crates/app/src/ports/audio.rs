//! Audio playback port.

use std::future::Future;
use std::sync::Arc;

use timerhub_domain::error::TimerHubError;

/// Plays a notification sound.
///
/// The returned future resolves when playback finishes on its own. Dropping
/// it must stop playback, which is how the notifier cancels a sound.
pub trait AudioPlayer: Send + Sync {
    fn play(&self, url: &str) -> impl Future<Output = Result<(), TimerHubError>> + Send;
}

impl<T: AudioPlayer> AudioPlayer for Arc<T> {
    fn play(&self, url: &str) -> impl Future<Output = Result<(), TimerHubError>> + Send {
        (**self).play(url)
    }
}
