//! Message-bus publisher port.

use std::future::Future;
use std::sync::Arc;

use serde_json::json;

use timerhub_domain::error::TimerHubError;

use super::platform::{ServiceCall, ServiceCaller};

/// Publishes a payload to a message-bus topic.
pub trait MessagePublisher: Send + Sync {
    fn publish(
        &self,
        topic: &str,
        payload: String,
        retain: bool,
    ) -> impl Future<Output = Result<(), TimerHubError>> + Send;
}

impl<T: MessagePublisher> MessagePublisher for Arc<T> {
    fn publish(
        &self,
        topic: &str,
        payload: String,
        retain: bool,
    ) -> impl Future<Output = Result<(), TimerHubError>> + Send {
        (**self).publish(topic, payload, retain)
    }
}

/// Publishes through the platform's own `mqtt.publish` service instead of a
/// direct broker connection.
pub struct ServicePublisher<C> {
    caller: C,
}

impl<C: ServiceCaller> ServicePublisher<C> {
    pub fn new(caller: C) -> Self {
        Self { caller }
    }
}

impl<C: ServiceCaller> MessagePublisher for ServicePublisher<C> {
    async fn publish(&self, topic: &str, payload: String, retain: bool) -> Result<(), TimerHubError> {
        let call = ServiceCall::new(
            "mqtt",
            "publish",
            json!({ "topic": topic, "payload": payload, "retain": retain }),
        );
        self.caller.call_service(call).await
    }
}
