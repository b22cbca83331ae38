//! Platform ports: reading entity state and invoking services.
//!
//! The home-automation platform owns every entity the card reads from. The
//! card never caches snapshots; it asks again on every tick.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use timerhub_domain::entity::EntitySnapshot;
use timerhub_domain::error::TimerHubError;

/// Reads the current state of platform entities.
pub trait EntityStateReader: Send + Sync {
    /// Current snapshot of `entity_id`, or `None` when the platform does
    /// not know the entity.
    fn entity(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<EntitySnapshot>, TimerHubError>> + Send;
}

/// Writes entity state on behalf of an integration (e.g. the message-bus
/// mirror materialising a topic as a sensor).
pub trait EntityStateWriter: Send + Sync {
    fn set_entity(
        &self,
        snapshot: EntitySnapshot,
    ) -> impl Future<Output = Result<(), TimerHubError>> + Send;
}

/// A generic "invoke action `service` on domain `domain` with `data`".
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub data: Value,
}

impl ServiceCall {
    #[must_use]
    pub fn new(domain: impl Into<String>, service: impl Into<String>, data: Value) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            data,
        }
    }
}

/// Invokes platform services (`timer.start`, `input_text.set_value`, …).
pub trait ServiceCaller: Send + Sync {
    fn call_service(
        &self,
        call: ServiceCall,
    ) -> impl Future<Output = Result<(), TimerHubError>> + Send;
}

impl<T: EntityStateReader> EntityStateReader for Arc<T> {
    fn entity(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<EntitySnapshot>, TimerHubError>> + Send {
        (**self).entity(entity_id)
    }
}

impl<T: EntityStateWriter> EntityStateWriter for Arc<T> {
    fn set_entity(
        &self,
        snapshot: EntitySnapshot,
    ) -> impl Future<Output = Result<(), TimerHubError>> + Send {
        (**self).set_entity(snapshot)
    }
}

impl<T: ServiceCaller> ServiceCaller for Arc<T> {
    fn call_service(
        &self,
        call: ServiceCall,
    ) -> impl Future<Output = Result<(), TimerHubError>> + Send {
        (**self).call_service(call)
    }
}
