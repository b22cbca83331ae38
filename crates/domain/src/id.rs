//! Timer identifiers.
//!
//! Unlike most identifiers in a hub, timer ids are strings chosen by the
//! source they come from (voice-assistant ids, helper JSON ids, synthetic
//! `single-timer-<entity>` ids). Only timers created here get a UUID.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a [`Timer`](crate::timer::Timer), unique within one
/// merged timer set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(String);

impl TimerId {
    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh identifier for a user-created timer.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("timer-{}", uuid::Uuid::new_v4().simple()))
    }

    /// Borrow the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TimerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TimerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
