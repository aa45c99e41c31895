use crate::error::{api_success, ApiError, ApiResponse};
use crate::middleware::AuthContext;
use crate::server::DeskServer;
use axum::{extract::State, Json};
use mydesk_sync::Profile;
use serde_json::Value;
use tracing::info;

pub async fn get_profile(
    State(server): State<DeskServer>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Profile>>, ApiError> {
    Ok(Json(api_success(server.profile.load().await?)))
}

/// Replace the profile with the posted object; `null` clears it
pub async fn save_profile(
    State(server): State<DeskServer>,
    _auth: AuthContext,
    Json(body): Json<Value>,
) -> Result<Json<ApiResponse<Profile>>, ApiError> {
    let profile = match body {
        Value::Object(fields) => Profile::from_fields(fields),
        Value::Null => Profile::default(),
        _ => return Err(ApiError::bad_request("Expected object")),
    };
    server.profile.replace(&profile).await?;
    info!(fields = profile.fields.len(), "Profile saved");
    Ok(Json(api_success(profile)))
}
