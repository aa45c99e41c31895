use crate::error::{api_success, ApiError, ApiResponse};
use crate::server::DeskServer;
use axum::{extract::State, Json};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall system health status
    pub status: String,
    /// Current timestamp in RFC3339 format
    pub timestamp: String,
    pub version: String,
    /// Uptime in seconds
    pub uptime: i64,
}

/// Liveness check, no authentication
pub async fn health_check(
    State(server): State<DeskServer>,
) -> Result<Json<ApiResponse<HealthResponse>>, ApiError> {
    let response = HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: server.uptime_seconds(),
    };

    Ok(Json(api_success(response)))
}
