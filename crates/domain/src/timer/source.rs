//! Timer source tags.

use serde::{Deserialize, Serialize};

/// Where a [`Timer`](super::Timer) came from.
///
/// The source decides which command handler path and which backing store
/// apply to the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerSource {
    NativeTimer,
    VoiceTimer,
    Helper,
    MessageBus,
    Timestamp,
    MinutesAttribute,
    LocalStorage,
}

impl TimerSource {
    /// Sources that support pause/resume/cancel/snooze. Everything else is
    /// read-only apart from a client-side dismiss.
    #[must_use]
    pub fn is_mutable(self) -> bool {
        matches!(
            self,
            Self::Helper | Self::LocalStorage | Self::MessageBus | Self::NativeTimer
        )
    }

    /// Sources whose expiry timestamp can be written back to storage.
    #[must_use]
    pub fn persists_expiry(self) -> bool {
        matches!(self, Self::Helper | Self::LocalStorage | Self::MessageBus)
    }

    /// Sources backed by one of the card's storage backends.
    #[must_use]
    pub fn is_stored(self) -> bool {
        matches!(self, Self::LocalStorage | Self::MessageBus)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NativeTimer => "native_timer",
            Self::VoiceTimer => "voice_timer",
            Self::Helper => "helper",
            Self::MessageBus => "message_bus",
            Self::Timestamp => "timestamp",
            Self::MinutesAttribute => "minutes_attribute",
            Self::LocalStorage => "local_storage",
        }
    }
}

impl std::fmt::Display for TimerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
