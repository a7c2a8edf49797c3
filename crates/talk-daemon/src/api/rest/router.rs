//! API Router configuration

use super::handlers;
use super::state::AppState;
use crate::config::ServerConfig;
use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health_check))
        // Action dispatch, also under the legacy script path
        .route(
            "/talk/api",
            get(handlers::dispatch).post(handlers::dispatch),
        )
        .route(
            "/talk/api.php",
            get(handlers::dispatch).post(handlers::dispatch),
        )
        .layer(DefaultBodyLimit::max(config.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http());

    let router = if config.enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_returns_200() {
        let app = create_router(AppState::in_memory(), &ServerConfig::default());
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn oversized_bodies_are_rejected() {
        let config = ServerConfig {
            max_body_size: 64,
            ..ServerConfig::default()
        };
        let app = create_router(AppState::in_memory(), &config);
        let content = "x".repeat(256);
        let body = format!(r#"{{"action":"save","group_id":1,"content":"{content}"}}"#);
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/talk/api")
                    .header("x-talk-user-id", "1")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
