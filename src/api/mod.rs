//! Idolboard REST API
//!
//! HTTP API layer for the dashboard statistics, built with Axum.
//!
//! # Endpoints
//!
//! ## Activity
//! - `POST /api/v1/activity` - Record one event
//! - `POST /api/v1/activity/batch` - Record a batch of events
//!
//! ## Stats
//! - `GET /api/v1/stats/weekly` - 7-day daily-active-user series
//! - `GET /api/v1/stats/dashboard` - Dashboard summary
//!
//! Both stats endpoints accept `?now=<rfc3339>` to evaluate the window at a
//! fixed instant.
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ApiConfig;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let api_routes = Router::new()
        .route("/activity", post(routes::activity::record_activity))
        .route("/activity/batch", post(routes::activity::record_activity_batch))
        .route("/stats/weekly", get(routes::stats::weekly_activity))
        .route("/stats/dashboard", get(routes::stats::dashboard));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .fallback(routes::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Permissive CORS unless explicit origins are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Idolboard API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Idolboard API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ActivityLog, LogSyncMode};
    use crate::analytics::{ReportingZone, WeeklyActiveUsers};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tempfile::tempdir;
    use tower::util::ServiceExt;

    fn create_test_app() -> (Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let log = ActivityLog::open_in_dir(dir.path(), LogSyncMode::EveryWrite).unwrap();
        let aggregator = WeeklyActiveUsers::new(ReportingZone::default());
        let state = AppState::new(log, aggregator, ApiConfig::default());

        (build_router(state), dir)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let (app, _dir) = create_test_app();

        for uri in ["/health/live", "/health/ready", "/health"] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_record_activity() {
        let (app, _dir) = create_test_app();

        let response = app
            .oneshot(post_json(
                "/api/v1/activity",
                r#"{"user_id": "u1", "action": "view_idol"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_record_activity_invalid_json() {
        let (app, _dir) = create_test_app();

        let response = app
            .oneshot(post_json("/api/v1/activity", "not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_record_activity_empty_user() {
        let (app, _dir) = create_test_app();

        let response = app
            .oneshot(post_json("/api/v1/activity", r#"{"user_id": ""}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_batch_partial() {
        let (app, _dir) = create_test_app();

        let response = app
            .oneshot(post_json(
                "/api/v1/activity/batch",
                r#"{"events": [{"user_id": "a"}, {"user_id": ""}, {"userId": "b"}]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::MULTI_STATUS);
        let body = body_json(response).await;
        assert_eq!(body["accepted"], 2);
        assert_eq!(body["rejected"], 1);
        assert_eq!(body["errors"][0]["index"], 1);
    }

    #[tokio::test]
    async fn test_batch_empty() {
        let (app, _dir) = create_test_app();

        let response = app
            .oneshot(post_json("/api/v1/activity/batch", r#"{"events": []}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_weekly_stats_after_ingest() {
        let (app, _dir) = create_test_app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/activity/batch",
                r#"{"events": [
                    {"user_id": "a"},
                    {"user_id": "b"},
                    {"user_id": "a", "action": "comment"}
                ]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app.oneshot(get("/api/v1/stats/weekly")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["series"].as_array().unwrap().len(), 7);
        assert_eq!(body["today_count"], 2);
        assert_eq!(body["timezone"], "UTC");
    }

    #[tokio::test]
    async fn test_dashboard_with_fixed_now() {
        let (app, dir) = create_test_app();
        std::fs::write(
            dir.path().join(ActivityLog::FILE_NAME),
            concat!(
                "{\"user_id\":\"a\",\"timestamp\":\"2024-03-10T09:00:00Z\",\"action\":\"view_idol\"}\n",
                "{\"user_id\":\"b\",\"timestamp\":{\"seconds\":1710061200,\"nanoseconds\":0}}\n",
                "{\"user_id\":\"c\"}\n",
                "garbage line\n",
            ),
        )
        .unwrap();

        let response = app
            .oneshot(get("/api/v1/stats/dashboard?now=2024-03-10T12:00:00Z"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["daily_active_users"], 2);
        assert_eq!(body["events_in_window"], 2);
        assert_eq!(body["skipped_malformed"], 1);
        assert_eq!(body["actions"]["view_idol"], 1);
        assert_eq!(body["actions"]["unknown"], 1);
        assert_eq!(body["series"][6]["date"], "2024-03-10");
        assert_eq!(body["series"][6]["label"], "Sun");
    }

    #[tokio::test]
    async fn test_dashboard_survives_torn_line() {
        let (app, dir) = create_test_app();
        let mut bytes = b"{\"user_id\":\"a\",\"timestamp\":\"2024-03-10T09:00:00Z\"}\n".to_vec();
        bytes.extend_from_slice(b"{\"user_id\":\"\xEC\xA7\n");
        bytes.extend_from_slice(b"{\"user_id\":\"b\",\"timestamp\":\"2024-03-10T10:00:00Z\"}\n");
        std::fs::write(dir.path().join(ActivityLog::FILE_NAME), &bytes).unwrap();

        let response = app
            .clone()
            .oneshot(get("/api/v1/stats/dashboard?now=2024-03-10T12:00:00Z"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["daily_active_users"], 2);
        assert_eq!(body["events_in_window"], 2);

        let response = app
            .oneshot(get("/api/v1/stats/weekly?now=2024-03-10T12:00:00Z"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["today_count"], 2);
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_not_found() {
        let (app, _dir) = create_test_app();

        let response = app.oneshot(get("/api/v1/stats/monthly")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("/api/v1/stats/monthly"));
    }

    #[tokio::test]
    async fn test_stats_invalid_now() {
        let (app, _dir) = create_test_app();

        let response = app
            .oneshot(get("/api/v1/stats/weekly?now=not-a-date"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
