//! Route configuration for the HTTP API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers::{axiom_webhook, health, local_alert};
use crate::state::AppState;

/// Creates the server router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook/axiom", post(axiom_webhook))
        .route("/alert/local", post(local_alert))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use clap::Parser;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn make_test_state(extra: &[&str]) -> Arc<AppState> {
        let mut args = vec![
            "alertbot",
            "--telegram-bot-token",
            "test-token",
            "--routes-file",
            "/nonexistent/routes.yml",
        ];
        args.extend_from_slice(extra);
        let settings = Settings::try_parse_from(args).expect("valid test args");
        Arc::new(AppState::from_settings(settings).expect("state builds"))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body collects")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn post_webhook(payload: &str, secret: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhook/axiom")
            .header("content-type", "application/json");
        if let Some(secret) = secret {
            builder = builder.header("x-webhook-secret", secret);
        }
        builder.body(Body::from(payload.to_string())).expect("request builds")
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = create_router(make_test_state(&[]));
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .expect("request builds");

        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn webhook_rejects_wrong_secret() {
        let app = create_router(make_test_state(&["--webhook-secret", "s3cret"]));

        let response = app
            .oneshot(post_webhook("{}", Some("wrong")))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["error"], "invalid_secret");
    }

    #[tokio::test]
    async fn webhook_rejects_missing_secret_header() {
        let app = create_router(make_test_state(&["--webhook-secret", "s3cret"]));

        let response = app.oneshot(post_webhook("{}", None)).await.expect("response");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn webhook_rejects_bad_json() {
        let app = create_router(make_test_state(&[]));

        let response = app
            .oneshot(post_webhook("not json", None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "invalid_payload");
    }

    #[tokio::test]
    async fn webhook_skips_resolved_alert() {
        let app = create_router(make_test_state(&[]));
        let payload = json!({"monitorName": "Resolved: api — errors"}).to_string();

        let response = app
            .oneshot(post_webhook(&payload, None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["ok"], true);
    }

    #[tokio::test]
    async fn webhook_acknowledges_when_no_destination() {
        // No chat id anywhere: the message is dropped with a warning but the
        // webhook is still acknowledged.
        let app = create_router(make_test_state(&[]));
        let payload = json!({
            "monitorName": "Triggered: api — errors",
            "matchedCount": 3
        })
        .to_string();

        let response = app
            .oneshot(post_webhook(&payload, None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["ok"], true);
    }

    #[tokio::test]
    async fn local_alert_answers_502_when_delivery_fails() {
        let app = create_router(make_test_state(&[]));
        let request = Request::builder()
            .method("POST")
            .uri("/alert/local")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({"title": "Container unhealthy: api"}).to_string(),
            ))
            .expect("request builds");

        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["error"], "delivery_failed");
    }
}
