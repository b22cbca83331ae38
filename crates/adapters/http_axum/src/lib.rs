//! # timerhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a JSON API over one timer card (`/api/timers`, `/api/presets`,
//!   `/api/config`)
//! - Map HTTP requests into card commands (driving adapter)
//! - Map command outcomes and [`TimerHubError`](timerhub_domain::error::TimerHubError)
//!   into HTTP responses
//!
//! ## Dependency rule
//! Depends on `timerhub-app` (for the card and port traits) and
//! `timerhub-domain` (for request/response types). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
