//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health               - Store reachability (not throttled)
//!
//! # Users (throttled per client)
//! POST   /api/users            - Create
//! GET    /api/users            - Paginated list (?page=&limit=)
//! GET    /api/users/search     - Substring search (?q=)
//! GET    /api/users/{id}       - Fetch one
//! PUT    /api/users/{id}       - Partial update
//! DELETE /api/users/{id}       - Remove
//! ```
//!
//! Anything else, including a known path with the wrong method, is a JSON 404.

pub mod health;
pub mod users;

use std::time::Duration;

use axum::{
    Router,
    http::{Method, Request, Response, header},
    routing::get,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::{rate_limit_middleware, request_id_middleware};
use crate::state::AppState;

/// Build the `/api/users` routes with the throttle applied.
///
/// `route_layer` keeps unmatched `/api` paths out of the throttle.
pub fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/search", get(users::search))
        .route(
            "/api/users/{id}",
            get(users::show).put(users::update).delete(users::delete),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            rate_limit_middleware,
        ))
}

/// Build the complete application router with all layers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .merge(user_routes(state.clone()))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .layer(cors_layer())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::SocketAddr;

    use axum::{body::Body, extract::ConnectInfo, http::StatusCode};
    use secrecy::ExposeSecret;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::ApiConfig;
    use crate::db;

    /// State backed by a pool that never connects; only store-free paths
    /// (and the health failure path) are exercised here.
    fn test_state(rate_limit: &str) -> AppState {
        let config = ApiConfig::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://rollcall@127.0.0.1:1/rollcall".to_owned()),
            "DATABASE_MIN_CONNECTIONS" => Some("0".to_owned()),
            "DATABASE_ACQUIRE_TIMEOUT_SECS" => Some("1".to_owned()),
            "RATE_LIMIT_PER_MINUTE" => Some(rate_limit.to_owned()),
            _ => None,
        })
        .unwrap();

        let pool = db::pool_options(&config.database)
            .connect_lazy(config.database.url.expose_secret())
            .unwrap();

        AppState::new(config, pool)
    }

    fn request(method: Method, uri: &str, body: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let mut request = builder
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_owned())))
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo("192.0.2.10:40000".parse::<SocketAddr>().unwrap()));
        request
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let app = router(test_state("100"));

        let (status, body) = send(&app, request(Method::GET, "/nope", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Route not found");
    }

    #[tokio::test]
    async fn test_wrong_method_is_404() {
        let app = router(test_state("100"));

        let (status, body) = send(&app, request(Method::PATCH, "/api/users", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Route not found");
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let app = router(test_state("100"));

        let (status, body) = send(&app, request(Method::GET, "/api/users/search", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Search parameter 'q' is required");

        let (status, _) = send(&app, request(Method::GET, "/api/users/search?q=", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_id_is_400() {
        let app = router(test_state("100"));

        for method in [Method::GET, Method::DELETE] {
            let (status, body) = send(&app, request(method, "/api/users/abc", None)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "Invalid ID");
        }

        let (status, body) = send(
            &app,
            request(Method::PUT, "/api/users/1.5", Some(r#"{"name":"Ada"}"#)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid ID");
    }

    #[tokio::test]
    async fn test_malformed_json_is_validation_error() {
        let app = router(test_state("100"));

        let (status, body) = send(&app, request(Method::POST, "/api/users", Some("{not json"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Validation error: ")
        );

        let (status, _) = send(
            &app,
            request(Method::POST, "/api/users", Some(r#"{"name":"Ada"}"#)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_fields_rejected_before_store() {
        let app = router(test_state("100"));

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                "/api/users",
                Some(r#"{"name":"Ada","email":"not-an-email"}"#),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Validation error: email must contain exactly one @ symbol"
        );

        let long_phone = "1".repeat(51);
        let payload = format!(r#"{{"phone":"{long_phone}"}}"#);
        let (status, _) = send(&app, request(Method::PUT, "/api/users/1", Some(&payload))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_throttle_denies_after_limit() {
        let app = router(test_state("2"));

        for _ in 0..2 {
            let (status, _) = send(&app, request(Method::GET, "/api/users/search", None)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }

        let (status, body) = send(&app, request(Method::GET, "/api/users/search", None)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Too many requests. Please try again later.");

        // Unmatched paths are outside the throttle.
        let (status, _) = send(&app, request(Method::GET, "/api/other", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_throttle_without_client_address_is_500() {
        let app = router(test_state("100"));
        let request = Request::builder()
            .uri("/api/users/search?q=ada")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_health_reports_unreachable_store() {
        let app = router(test_state("1"));

        let (status, body) = send(&app, request(Method::GET, "/health", None)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "unhealthy");
        assert_eq!(body["service"], "rollcall-api");
        assert!(body.get("database").is_none());
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let app = router(test_state("100"));
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/users")
            .header(header::ORIGIN, "https://app.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let app = router(test_state("100"));

        let response = app
            .oneshot(request(Method::GET, "/nope", None))
            .await
            .unwrap();
        assert!(
            response
                .headers()
                .contains_key(crate::middleware::REQUEST_ID_HEADER)
        );
    }
}
