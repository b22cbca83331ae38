//! MQTT adapter error types.

use timerhub_domain::error::TimerHubError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc client rejected a request (its queue is closed or full).
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// A payload received on a mirrored topic is not UTF-8.
    #[error("MQTT payload on {0} is not valid UTF-8")]
    PayloadEncoding(String),

    /// A domain-level error (validation, not-found, etc.).
    #[error("domain error")]
    Domain(#[source] TimerHubError),
}

impl MqttError {
    /// Convert into a [`TimerHubError::Storage`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> TimerHubError {
        match self {
            Self::Domain(err) => err,
            other => TimerHubError::Storage(Box::new(other)),
        }
    }
}

impl From<MqttError> for TimerHubError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}
