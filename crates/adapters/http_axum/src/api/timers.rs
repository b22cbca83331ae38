//! JSON REST handlers for timers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use timerhub_app::card::{CommandOutcome, NewTimer, TimerAction};
use timerhub_app::ports::{AudioPlayer, EntityStateReader, KeyValueStore, MessagePublisher, ServiceCaller};
use timerhub_domain::config::CardConfig;
use timerhub_domain::duration::{format_clock_duration, format_human_duration};
use timerhub_domain::id::TimerId;
use timerhub_domain::time::{Millis, now_ms};
use timerhub_domain::timer::Timer;
use timerhub_domain::timer::view::TimerView;

use crate::error::ApiError;
use crate::state::AppState;

/// A timer as served to clients.
#[derive(Serialize)]
pub struct TimerResponse {
    #[serde(flatten)]
    pub view: TimerView,
    /// Label with markup escaped.
    pub display_label: String,
    /// Remaining time as `H:MM:SS`.
    pub remaining_text: String,
    /// The source entity's `expired_subtitle`, while ringing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Whether the source entity hides every action but dismiss.
    pub actions_hidden: bool,
}

impl TimerResponse {
    fn new(view: TimerView, config: &CardConfig) -> Self {
        let entity = config.entity(&view.timer.source_entity);
        Self {
            display_label: view.display_label(),
            remaining_text: format_clock_duration(view.remaining),
            subtitle: entity
                .and_then(|e| e.expired_subtitle.clone())
                .filter(|_| view.ringing),
            actions_hidden: entity.is_some_and(|e| e.hide_timer_actions),
            view,
        }
    }
}

/// Duration in a create request: milliseconds, or human text like `"1h30m"`.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum DurationInput {
    Millis(Millis),
    Text(String),
}

/// Request body for creating a timer.
#[derive(Deserialize)]
pub struct CreateTimerRequest {
    pub duration: DurationInput,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Serialize)]
pub struct PresetResponse {
    pub duration: Millis,
    pub label: String,
}

/// Body of a command response.
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CommandBody {
    Done,
    Throttled,
    Notice { message: String },
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<TimerResponse>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Timer>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the command endpoint.
pub enum CommandResponse {
    Ok(Json<CommandBody>),
    TooManyRequests(Json<CommandBody>),
}

impl From<CommandOutcome> for CommandResponse {
    fn from(outcome: CommandOutcome) -> Self {
        match outcome {
            CommandOutcome::Done => Self::Ok(Json(CommandBody::Done)),
            CommandOutcome::Throttled => Self::TooManyRequests(Json(CommandBody::Throttled)),
            CommandOutcome::Unsupported(message) => Self::Ok(Json(CommandBody::Notice { message })),
        }
    }
}

impl IntoResponse for CommandResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
            Self::TooManyRequests(json) => (StatusCode::TOO_MANY_REQUESTS, json).into_response(),
        }
    }
}

/// `GET /api/timers`
pub async fn list<P, A, K, B>(State(state): State<AppState<P, A, K, B>>) -> ListResponse
where
    P: EntityStateReader + ServiceCaller + 'static,
    A: AudioPlayer + 'static,
    K: KeyValueStore + 'static,
    B: MessagePublisher + 'static,
{
    let card = state.card.lock().await;
    let timers = card
        .views()
        .iter()
        .cloned()
        .map(|view| TimerResponse::new(view, card.config()))
        .collect();
    ListResponse::Ok(Json(timers))
}

/// `POST /api/timers`
pub async fn create<P, A, K, B>(
    State(state): State<AppState<P, A, K, B>>,
    Json(req): Json<CreateTimerRequest>,
) -> Result<CreateResponse, ApiError>
where
    P: EntityStateReader + ServiceCaller + 'static,
    A: AudioPlayer + 'static,
    K: KeyValueStore + 'static,
    B: MessagePublisher + 'static,
{
    let request = match req.duration {
        DurationInput::Millis(ms) => NewTimer::new(ms, req.label)?,
        DurationInput::Text(text) => NewTimer::parse(&text, req.label)?,
    };
    let timer = state.card.lock().await.create(request, now_ms()).await?;
    Ok(CreateResponse::Created(Json(timer)))
}

/// `POST /api/timers/{id}/{action}`
pub async fn command<P, A, K, B>(
    State(state): State<AppState<P, A, K, B>>,
    Path((id, action)): Path<(String, TimerAction)>,
) -> Result<CommandResponse, ApiError>
where
    P: EntityStateReader + ServiceCaller + 'static,
    A: AudioPlayer + 'static,
    K: KeyValueStore + 'static,
    B: MessagePublisher + 'static,
{
    let outcome = state
        .card
        .lock()
        .await
        .execute(&TimerId::from(id), action, now_ms())
        .await?;
    Ok(outcome.into())
}

/// `GET /api/presets`
pub async fn presets<P, A, K, B>(State(state): State<AppState<P, A, K, B>>) -> Json<Vec<PresetResponse>>
where
    P: EntityStateReader + ServiceCaller + 'static,
    A: AudioPlayer + 'static,
    K: KeyValueStore + 'static,
    B: MessagePublisher + 'static,
{
    let presets = state.card.lock().await.presets();
    Json(
        presets
            .into_iter()
            .map(|duration| PresetResponse {
                duration,
                label: format_human_duration(duration),
            })
            .collect(),
    )
}
