//! Entity snapshot: the platform's view of one external entity.
//!
//! The platform exposes every entity as a `state` string plus a free-form
//! attribute map. Source adapters read these snapshots and never hold on to
//! them between ticks.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{TimerHubError, ValidationError};
use crate::time::Millis;

/// Current state and attributes of one external entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Platform entity id, e.g. `timer.kitchen`.
    pub entity_id: String,
    /// Raw state string.
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// When the platform last wrote this entity, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Millis>,
}

impl EntitySnapshot {
    /// Create a builder for constructing an [`EntitySnapshot`].
    #[must_use]
    pub fn builder() -> EntitySnapshotBuilder {
        EntitySnapshotBuilder::default()
    }

    /// The platform domain, i.e. everything before the first `.`.
    #[must_use]
    pub fn domain(&self) -> &str {
        entity_domain(&self.entity_id)
    }

    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Attribute as a string slice; non-string values yield `None`.
    #[must_use]
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Attribute as a number. Numeric strings are accepted as well since
    /// templated sensors frequently stringify their values.
    #[must_use]
    pub fn attr_f64(&self, key: &str) -> Option<f64> {
        match self.attributes.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn attr_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.attributes.get(key).and_then(Value::as_array)
    }

    /// `friendly_name` attribute, falling back to the entity id.
    #[must_use]
    pub fn friendly_name(&self) -> &str {
        self.attr_str("friendly_name").unwrap_or(&self.entity_id)
    }

    /// Whether the platform reports the entity as unreachable.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self.state.as_str(), "unavailable" | "unknown")
    }
}

/// The domain part of an entity id (`timer` in `timer.kitchen`).
#[must_use]
pub fn entity_domain(entity_id: &str) -> &str {
    entity_id.split_once('.').map_or("", |(domain, _)| domain)
}

/// Whether the entity id names a text-like helper that can store JSON.
#[must_use]
pub fn is_text_entity(entity_id: &str) -> bool {
    matches!(entity_domain(entity_id), "input_text" | "text")
}

/// Step-by-step builder for [`EntitySnapshot`].
#[derive(Debug, Default)]
pub struct EntitySnapshotBuilder {
    entity_id: Option<String>,
    state: Option<String>,
    attributes: Map<String, Value>,
    last_updated: Option<Millis>,
}

impl EntitySnapshotBuilder {
    #[must_use]
    pub fn entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn last_updated(mut self, ts: Millis) -> Self {
        self.last_updated = Some(ts);
        self
    }

    /// Consume the builder and return an [`EntitySnapshot`].
    ///
    /// # Errors
    ///
    /// Returns [`TimerHubError::Validation`] when no entity id was given.
    pub fn build(self) -> Result<EntitySnapshot, TimerHubError> {
        let entity_id = self.entity_id.unwrap_or_default();
        if entity_id.is_empty() {
            return Err(ValidationError::EmptyEntityId.into());
        }
        Ok(EntitySnapshot {
            entity_id,
            state: self.state.unwrap_or_else(|| "unknown".to_string()),
            attributes: self.attributes,
            last_updated: self.last_updated,
        })
    }
}
