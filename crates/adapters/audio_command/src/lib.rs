//! # timerhub-adapter-audio-command
//!
//! Plays alert sounds by running an external command with the sound
//! location as its last argument, e.g. `paplay /srv/sounds/ding.oga`.
//!
//! Platform-relative URLs (`/local/…`, `/hacsfiles/…`) are resolved against
//! configured directories; `file:` URLs become plain paths; `http(s):` URLs
//! are passed through for players that can stream.
//!
//! The child is killed when the `play` future is dropped, which is how the
//! audio notifier stops a sound.

mod error;

pub use error::AudioError;

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;

use timerhub_app::ports::AudioPlayer;
use timerhub_domain::error::TimerHubError;

/// Settings for [`CommandAudioPlayer`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioCommandConfig {
    /// Program to run.
    pub command: String,
    /// Arguments placed before the sound location.
    pub args: Vec<String>,
    /// Directory served as `/local/`.
    pub local_dir: Option<PathBuf>,
    /// Directory served as `/hacsfiles/`.
    pub hacs_dir: Option<PathBuf>,
    /// Upper bound for one playback, in seconds.
    pub timeout_secs: u64,
}

impl Default for AudioCommandConfig {
    fn default() -> Self {
        Self {
            command: "paplay".to_string(),
            args: Vec::new(),
            local_dir: None,
            hacs_dir: None,
            timeout_secs: 60,
        }
    }
}

/// [`AudioPlayer`] backed by an external command.
#[derive(Debug, Clone)]
pub struct CommandAudioPlayer {
    config: AudioCommandConfig,
    timeout: Duration,
}

impl CommandAudioPlayer {
    #[must_use]
    pub fn new(config: AudioCommandConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        Self { config, timeout }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Map a sound URL to the argument handed to the command.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::Unresolvable`] for a platform-relative path
    /// whose directory is not configured.
    pub fn resolve(&self, url: &str) -> Result<String, AudioError> {
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(path.to_string());
        }
        if let Some(path) = url.strip_prefix("file:") {
            return Ok(path.to_string());
        }
        let mounts = [
            ("/local/", &self.config.local_dir),
            ("/hacsfiles/", &self.config.hacs_dir),
        ];
        for (prefix, dir) in mounts {
            if let Some(rest) = url.strip_prefix(prefix) {
                let dir = dir
                    .as_ref()
                    .ok_or_else(|| AudioError::Unresolvable(url.to_string()))?;
                return Ok(dir.join(rest).to_string_lossy().into_owned());
            }
        }
        Ok(url.to_string())
    }

    async fn run(&self, url: &str) -> Result<(), AudioError> {
        let target = self.resolve(url)?;
        let mut child = Command::new(&self.config.command)
            .args(&self.config.args)
            .arg(&target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(AudioError::Spawn)?;

        let status = tokio::time::timeout(self.timeout, child.wait())
            .await
            .map_err(|_| AudioError::Timeout(self.timeout))?
            .map_err(AudioError::Spawn)?;
        if !status.success() {
            return Err(AudioError::Exit(status.code()));
        }
        tracing::debug!(command = %self.config.command, %target, "played sound");
        Ok(())
    }
}

impl AudioPlayer for CommandAudioPlayer {
    async fn play(&self, url: &str) -> Result<(), TimerHubError> {
        Ok(self.run(url).await?)
    }
}
