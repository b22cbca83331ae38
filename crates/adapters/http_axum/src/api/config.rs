//! Card configuration updates.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use timerhub_app::ports::{AudioPlayer, EntityStateReader, KeyValueStore, MessagePublisher, ServiceCaller};
use timerhub_domain::config::CardConfig;

use crate::state::AppState;

/// `PUT /api/config`
///
/// Accepted immediately; the card is reconfigured once edits stop arriving.
pub async fn update<P, A, K, B>(
    State(state): State<AppState<P, A, K, B>>,
    Json(config): Json<CardConfig>,
) -> StatusCode
where
    P: EntityStateReader + ServiceCaller + 'static,
    A: AudioPlayer + 'static,
    K: KeyValueStore + 'static,
    B: MessagePublisher + 'static,
{
    tracing::debug!(entities = config.entities.len(), "queued card configuration");
    state.config_updates.push(config);
    StatusCode::ACCEPTED
}
