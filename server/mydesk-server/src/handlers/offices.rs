use crate::error::{api_success, ApiError, ApiResponse};
use crate::middleware::AuthContext;
use crate::server::DeskServer;
use axum::{extract::State, Json};
use mydesk_sync::models::office_name;
use mydesk_sync::normalize_offices;
use serde_json::Value;
use tracing::info;

pub async fn get_offices(
    State(server): State<DeskServer>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    Ok(Json(api_success(server.offices.load().await?)))
}

/// Replace the office list; names are trimmed, de-duplicated ignoring case
/// and sorted
pub async fn save_offices(
    State(server): State<DeskServer>,
    _auth: AuthContext,
    Json(body): Json<Value>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let Value::Array(items) = body else {
        return Err(ApiError::bad_request("Expected array"));
    };
    let offices = normalize_offices(items.iter().map(office_name));
    server.offices.replace(&offices).await?;
    info!(count = offices.len(), "Office list saved");
    Ok(Json(api_success(offices)))
}
