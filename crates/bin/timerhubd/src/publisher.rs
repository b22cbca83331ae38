//! Message-bus publisher selected at startup.

use std::sync::Arc;

use timerhub_adapter_mqtt::MqttPublisher;
use timerhub_adapter_virtual::VirtualPlatform;
use timerhub_app::ports::MessagePublisher;
use timerhub_app::ports::publisher::ServicePublisher;
use timerhub_domain::error::TimerHubError;

pub enum Publisher {
    /// Direct broker connection.
    Broker(MqttPublisher),
    /// The platform's `mqtt.publish` service.
    Platform(ServicePublisher<Arc<VirtualPlatform>>),
}

impl MessagePublisher for Publisher {
    async fn publish(&self, topic: &str, payload: String, retain: bool) -> Result<(), TimerHubError> {
        match self {
            Self::Broker(publisher) => publisher.publish(topic, payload, retain).await,
            Self::Platform(publisher) => publisher.publish(topic, payload, retain).await,
        }
    }
}
