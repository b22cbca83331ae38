//! # timerhub-domain
//!
//! Pure domain model for timerhub, a timer aggregator that merges
//! countdowns from many home-automation sources into one list.
//!
//! ## Responsibilities
//! - Foundational types: timer identifiers, error conventions, timestamps
//! - Define **Timers** and their running / paused / idle / finished states
//! - Define the **wire schemas** shared with other clients (stored
//!   collections, helper payloads, store markers)
//! - Define **entity snapshots** as read from the platform
//! - Duration parsing / formatting and label sanitising
//! - Per-tick derived views and their ordering
//! - Card configuration and lifecycle events
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod config;
pub mod duration;
pub mod entity;
pub mod event;
pub mod label;
pub mod timer;
