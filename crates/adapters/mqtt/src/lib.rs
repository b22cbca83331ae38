//! # timerhub-adapter-mqtt
//!
//! MQTT adapter built on [rumqttc](https://docs.rs/rumqttc).
//!
//! ## Responsibilities
//! - Implement [`MessagePublisher`] so the message-bus timer store and the
//!   expired events reach the broker
//! - Drive the rumqttc event loop in a background task, reconnecting after
//!   failures
//! - Optionally mirror the storage topic into a sensor entity through
//!   [`EntityStateWriter`] ([`TopicMirror`])
//!
//! ## Dependency rule
//! Same as other adapters: depends on `timerhub-app` and `timerhub-domain`.

mod config;
mod error;
mod mirror;

pub use config::MqttConfig;
pub use error::MqttError;
pub use mirror::TopicMirror;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::task::JoinHandle;

use timerhub_app::ports::{EntityStateWriter, MessagePublisher};
use timerhub_domain::error::TimerHubError;

/// Capacity of the rumqttc request queue.
const REQUEST_CAPACITY: usize = 32;

/// Publishing half of a broker connection. Cheap to clone.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
}

/// Event-loop half of a broker connection. Nothing is sent or received
/// until [`spawn`](Self::spawn) is called.
pub struct MqttConnection {
    client: AsyncClient,
    eventloop: EventLoop,
    config: MqttConfig,
}

/// Create a client for `config`. The connection is established lazily by
/// the event loop.
#[must_use]
pub fn connect(config: &MqttConfig) -> (MqttPublisher, MqttConnection) {
    let mut options = MqttOptions::new(
        config.client_id.clone(),
        config.broker_host.clone(),
        config.broker_port,
    );
    options.set_keep_alive(config.keep_alive());
    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        options.set_credentials(username.clone(), password.clone());
    }

    let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
    (
        MqttPublisher {
            client: client.clone(),
        },
        MqttConnection {
            client,
            eventloop,
            config: config.clone(),
        },
    )
}

impl MessagePublisher for MqttPublisher {
    async fn publish(&self, topic: &str, payload: String, retain: bool) -> Result<(), TimerHubError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, retain, payload)
            .await
            .map_err(MqttError::Client)?;
        tracing::trace!(topic, retain, "queued MQTT publish");
        Ok(())
    }
}

impl MqttConnection {
    /// Run the event loop in the background, feeding incoming messages to
    /// `mirror` if given. The subscription is renewed on every reconnect.
    pub fn spawn<W>(self, mirror: Option<TopicMirror<W>>) -> JoinHandle<()>
    where
        W: EntityStateWriter + 'static,
    {
        tokio::spawn(self.run(mirror))
    }

    async fn run<W: EntityStateWriter>(mut self, mirror: Option<TopicMirror<W>>) {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    tracing::info!(host = %self.config.broker_host, port = self.config.broker_port, "connected to MQTT broker");
                    if let Some(mirror) = &mirror {
                        if let Err(err) = self.client.subscribe(mirror.topic(), QoS::AtLeastOnce).await {
                            tracing::warn!(%err, topic = mirror.topic(), "MQTT subscribe failed");
                        }
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let Some(mirror) = &mirror else { continue };
                    match mirror.handle(&publish.topic, &publish.payload).await {
                        Ok(true) => tracing::debug!(topic = %publish.topic, "mirrored storage topic"),
                        Ok(false) => {}
                        Err(err) => tracing::warn!(%err, topic = %publish.topic, "failed to mirror MQTT message"),
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(%err, "MQTT connection error, retrying");
                    tokio::time::sleep(self.config.reconnect_delay()).await;
                }
            }
        }
    }
}
