//! # timerhub-app
//!
//! Application layer: the timer card and the **port definitions** (traits)
//! its adapters implement.
//!
//! ## Responsibilities
//! - Define **port traits** for everything outside the process:
//!   - `EntityStateReader` / `EntityStateWriter` / `ServiceCaller` for the
//!     home-automation platform
//!   - `KeyValueStore` for the local timer blob
//!   - `MessagePublisher` for the message-bus store and events
//!   - `AudioPlayer` for alert sounds
//! - Turn entity snapshots into timers (`sources`) and persist user timers
//!   (`storage`)
//! - Drive per-timer lifecycle: ringing, expiry policies, audio, commands
//!   (`card`, `lifecycle`, `audio`)
//! - Provide in-process infrastructure that needs no IO (`debounce`,
//!   `rate_limit`, `runner`)
//!
//! ## Dependency rule
//! Depends on `timerhub-domain` only (plus `tokio` for tasks and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod audio;
pub mod card;
pub mod debounce;
pub mod lifecycle;
pub mod ports;
pub mod rate_limit;
pub mod runner;
pub mod sources;
pub mod storage;

#[cfg(test)]
mod testing;
