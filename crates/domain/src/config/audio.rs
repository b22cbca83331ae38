//! Effective audio notification settings.

/// Audio settings after resolving entity, voice and global levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSettings {
    pub enabled: bool,
    pub file_url: Option<String>,
    /// How many times the sound plays; at least one.
    pub repeat_count: u32,
    /// Keep replaying until the timer stops ringing.
    pub play_until_dismissed: bool,
}

impl AudioSettings {
    /// The URL to play, when audio is enabled and the URL passes
    /// [`is_allowed_audio_url`].
    #[must_use]
    pub fn playable_url(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.file_url
            .as_deref()
            .filter(|url| is_allowed_audio_url(url))
    }
}

const ALLOWED_SCHEMES: [&str; 3] = ["http:", "https:", "file:"];
const ALLOWED_PREFIXES: [&str; 2] = ["/local/", "/hacsfiles/"];

/// Scheme / path allow-list for notification sounds.
#[must_use]
pub fn is_allowed_audio_url(url: &str) -> bool {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    if ALLOWED_SCHEMES.iter().any(|s| lower.starts_with(s)) {
        return true;
    }
    ALLOWED_PREFIXES.iter().any(|p| url.starts_with(p)) && !url.contains("..")
}
