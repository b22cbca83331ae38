//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `timerhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::path::PathBuf;

use serde::Deserialize;

use timerhub_adapter_audio_command::AudioCommandConfig;
use timerhub_adapter_mqtt::MqttConfig;
use timerhub_domain::config::CardConfig;
use timerhub_domain::entity::EntitySnapshot;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    /// Where local timer collections are written.
    pub storage: StorageConfig,
    /// Broker connection; without it message-bus storage goes through the
    /// platform's `mqtt.publish` service.
    pub mqtt: Option<MqttConfig>,
    pub audio: AudioCommandConfig,
    /// The card itself.
    pub card: CardConfig,
    /// Entities seeded into the virtual platform.
    pub entities: Vec<EntitySnapshot>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from `timerhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or the
    /// result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("timerhub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TIMERHUB_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("TIMERHUB_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("TIMERHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("TIMERHUB_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("TIMERHUB_MQTT_HOST") {
            self.mqtt.get_or_insert_with(MqttConfig::default).broker_host = val;
        }
        if let Ok(val) = std::env::var("TIMERHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.audio.command.trim().is_empty() {
            return Err(ConfigError::Validation(
                "audio command must not be empty".to_string(),
            ));
        }
        let seeded = self.entities.iter().map(|e| e.entity_id.as_str());
        let configured = self.card.entities.iter().map(|e| e.entity.as_str());
        if let Some(bad) = seeded.chain(configured).find(|id| !id.contains('.')) {
            return Err(ConfigError::Validation(format!(
                "entity id {bad:?} must look like <domain>.<name>"
            )));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "timerhubd=info,timerhub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
