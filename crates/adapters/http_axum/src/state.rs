//! Shared application state for axum handlers.

use std::sync::Arc;

use timerhub_app::card::SharedCard;
use timerhub_app::debounce::Debouncer;
use timerhub_domain::config::CardConfig;

/// Application state shared across all axum handlers.
///
/// `Clone` is implemented manually so the card's port types do not need to
/// be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<P, A, K, B> {
    /// The card every request operates on.
    pub card: SharedCard<P, A, K, B>,
    /// Configuration edits, applied once a burst settles.
    pub config_updates: Arc<Debouncer<CardConfig>>,
}

impl<P, A, K, B> Clone for AppState<P, A, K, B> {
    fn clone(&self) -> Self {
        Self {
            card: Arc::clone(&self.card),
            config_updates: Arc::clone(&self.config_updates),
        }
    }
}

impl<P, A, K, B> AppState<P, A, K, B> {
    pub fn new(card: SharedCard<P, A, K, B>, config_updates: Arc<Debouncer<CardConfig>>) -> Self {
        Self {
            card,
            config_updates,
        }
    }
}
