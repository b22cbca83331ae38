//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod config;
#[allow(clippy::missing_errors_doc)]
pub mod timers;

use axum::Router;
use axum::routing::{get, post, put};

use timerhub_app::ports::{AudioPlayer, EntityStateReader, KeyValueStore, MessagePublisher, ServiceCaller};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<P, A, K, B>() -> Router<AppState<P, A, K, B>>
where
    P: EntityStateReader + ServiceCaller + 'static,
    A: AudioPlayer + 'static,
    K: KeyValueStore + 'static,
    B: MessagePublisher + 'static,
{
    Router::new()
        .route(
            "/timers",
            get(timers::list::<P, A, K, B>).post(timers::create::<P, A, K, B>),
        )
        .route("/timers/{id}/{action}", post(timers::command::<P, A, K, B>))
        .route("/presets", get(timers::presets::<P, A, K, B>))
        .route("/config", put(config::update::<P, A, K, B>))
}
