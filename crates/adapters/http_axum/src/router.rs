//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use timerhub_app::ports::{AudioPlayer, EntityStateReader, KeyValueStore, MessagePublisher, ServiceCaller};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests API routes under `/api`. Includes a [`TraceLayer`] that logs each
/// HTTP request/response at the `DEBUG` level.
pub fn build<P, A, K, B>(state: AppState<P, A, K, B>) -> Router
where
    P: EntityStateReader + ServiceCaller + 'static,
    A: AudioPlayer + 'static,
    K: KeyValueStore + 'static,
    B: MessagePublisher + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use timerhub_adapter_virtual::VirtualPlatform;
    use timerhub_app::card::{SharedCard, TimerCard};
    use timerhub_app::debounce::Debouncer;
    use timerhub_domain::config::CardConfig;
    use timerhub_domain::entity::EntitySnapshot;
    use timerhub_domain::error::TimerHubError;
    use timerhub_domain::time::now_ms;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct SilentPlayer;
    struct NullPublisher;

    #[derive(Default)]
    struct MemoryKv(Mutex<HashMap<String, String>>);

    impl AudioPlayer for SilentPlayer {
        async fn play(&self, _url: &str) -> Result<(), TimerHubError> {
            Ok(())
        }
    }

    impl MessagePublisher for NullPublisher {
        async fn publish(&self, _topic: &str, _payload: String, _retain: bool) -> Result<(), TimerHubError> {
            Ok(())
        }
    }

    impl KeyValueStore for MemoryKv {
        async fn get(&self, key: &str) -> Result<Option<String>, TimerHubError> {
            Ok(self.0.lock().unwrap().get(key).cloned())
        }
        async fn set(&self, key: &str, value: String) -> Result<(), TimerHubError> {
            self.0.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }
        async fn delete(&self, key: &str) -> Result<(), TimerHubError> {
            self.0.lock().unwrap().remove(key);
            Ok(())
        }
    }

    type Card = SharedCard<VirtualPlatform, SilentPlayer, MemoryKv, NullPublisher>;

    fn setup(config: CardConfig, platform: VirtualPlatform) -> (Router, Card, UnboundedReceiver<CardConfig>) {
        let card = TimerCard::new(
            config,
            Arc::new(platform),
            Arc::new(SilentPlayer),
            Arc::new(MemoryKv::default()),
            Arc::new(NullPublisher),
        )
        .shared();
        let (debouncer, updates) = Debouncer::new(Duration::from_millis(20));
        let router = build(AppState::new(Arc::clone(&card), Arc::new(debouncer)));
        (router, card, updates)
    }

    fn app() -> (Router, Card) {
        let (router, card, _) = setup(CardConfig::default(), VirtualPlatform::new());
        (router, card)
    }

    fn post(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn should_return_ok_on_health_check() {
        let (app, _) = app();
        let response = app.oneshot(get_req("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_create_timer_and_list_it_after_tick() {
        let (app, card) = app();
        let response = app
            .clone()
            .oneshot(post("/api/timers", &json!({"duration": "90s", "label": "Eggs"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        assert_eq!(created["label"], "Eggs");
        assert_eq!(created["duration"], 90_000);

        card.lock().await.tick(now_ms()).await;
        let listed = json_body(app.oneshot(get_req("/api/timers")).await.unwrap()).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["id"], created["id"]);
        assert_eq!(listed[0]["display_label"], "Eggs");
        assert_eq!(listed[0]["ringing"], false);
    }

    #[tokio::test]
    async fn should_accept_duration_in_milliseconds() {
        let (app, _) = app();
        let response = app
            .oneshot(post("/api/timers", &json!({"duration": 60_000})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["label"], "1m Timer");
    }

    #[tokio::test]
    async fn should_reject_invalid_durations() {
        let (app, _) = app();
        for body in [json!({"duration": "soon"}), json!({"duration": 0}), json!({"duration": "25h"})] {
            let response = app.clone().oneshot(post("/api/timers", &body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert!(json_body(response).await["error"].is_string());
        }
    }

    #[tokio::test]
    async fn should_return_404_for_unknown_timer() {
        let (app, _) = app();
        let response = app
            .oneshot(post("/api/timers/ghost/pause", &json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_dismiss_unknown_timer_idempotently() {
        let (app, _) = app();
        let response = app
            .oneshot(post("/api/timers/ghost/dismiss", &json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"status": "done"}));
    }

    #[tokio::test]
    async fn should_reject_unknown_action() {
        let (app, _) = app();
        let response = app
            .oneshot(post("/api/timers/a/explode", &json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_report_notice_for_read_only_timer() {
        let platform = VirtualPlatform::new().with_entities([EntitySnapshot::builder()
            .entity_id("sensor.oven_done")
            .state("2999-01-01T00:00:00+00:00")
            .build()
            .unwrap()]);
        let config = CardConfig {
            entities: vec![timerhub_domain::config::EntityConfig::new("sensor.oven_done")],
            ..CardConfig::default()
        };
        let (app, card, _) = setup(config, platform);
        card.lock().await.tick(now_ms()).await;

        let response = app
            .oneshot(post("/api/timers/sensor.oven_done/pause", &json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "notice");
        assert!(body["message"].as_str().unwrap().contains("read-only"));
    }

    #[tokio::test]
    async fn should_apply_entity_action_and_subtitle_overrides() {
        let ended = now_ms() - 1_000;
        let platform = VirtualPlatform::new().with_entities([EntitySnapshot::builder()
            .entity_id("input_text.kitchen_timers")
            .state(json!({"timers": [{"id": "rice", "label": "Rice", "end": ended}]}).to_string())
            .build()
            .unwrap()]);
        let mut entity = timerhub_domain::config::EntityConfig::new("input_text.kitchen_timers");
        entity.hide_timer_actions = true;
        entity.expired_subtitle = Some("Rice is ready".into());
        let config = CardConfig {
            entities: vec![entity],
            ..CardConfig::default()
        };
        let (app, card, _) = setup(config, platform);
        card.lock().await.tick(now_ms()).await;

        let listed = json_body(app.clone().oneshot(get_req("/api/timers")).await.unwrap()).await;
        assert_eq!(listed[0]["subtitle"], "Rice is ready");
        assert_eq!(listed[0]["actions_hidden"], true);

        let snooze = json_body(
            app.clone()
                .oneshot(post("/api/timers/rice/snooze", &json!({})))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(snooze["status"], "notice");

        let dismiss = json_body(
            app.oneshot(post("/api/timers/rice/dismiss", &json!({})))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(dismiss["status"], "done");
        assert!(card.lock().await.tick(now_ms()).await.is_empty());
    }

    #[tokio::test]
    async fn should_throttle_second_snooze() {
        let (app, card) = app();
        let timer = card
            .lock()
            .await
            .create(
                timerhub_app::card::NewTimer::new(60_000, None).unwrap(),
                now_ms() - 60_000,
            )
            .await
            .unwrap();
        card.lock().await.tick(now_ms()).await;

        let uri = format!("/api/timers/{}/snooze", timer.id);
        let first = app.clone().oneshot(post(&uri, &json!({}))).await.unwrap();
        let second = app.oneshot(post(&uri, &json!({}))).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json_body(second).await["status"], "throttled");
    }

    #[tokio::test]
    async fn should_list_presets() {
        let (app, _) = app();
        let presets = json_body(app.oneshot(get_req("/api/presets")).await.unwrap()).await;
        assert_eq!(presets[0], json!({"duration": 300_000, "label": "5m"}));
        assert_eq!(presets.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn should_debounce_config_updates() {
        let (app, _, mut updates) = setup(CardConfig::default(), VirtualPlatform::new());
        for minutes in [1, 2] {
            let request = Request::builder()
                .method("PUT")
                .uri("/api/config")
                .header("content-type", "application/json")
                .body(Body::from(json!({"snooze_duration": minutes}).to_string()))
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::ACCEPTED);
        }

        let applied = tokio::time::timeout(Duration::from_secs(1), updates.recv())
            .await
            .unwrap()
            .unwrap();
        assert!((applied.snooze_duration - 2.0).abs() < f64::EPSILON);
        assert!(updates.try_recv().is_err());
    }
}
