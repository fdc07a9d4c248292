//! Health check endpoint.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::db;
use crate::state::AppState;

/// Service name reported by the health check.
pub const SERVICE_NAME: &str = "rollcall-api";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    pub service: &'static str,
}

/// `GET /health`
///
/// Pings the store. Not throttled.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match db::ping(state.pool()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                database: Some("connected"),
                error: None,
                service: SERVICE_NAME,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse {
                    status: "unhealthy",
                    database: None,
                    error: Some("Database connection error"),
                    service: SERVICE_NAME,
                }),
            )
        }
    }
}
