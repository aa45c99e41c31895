use crate::error::{api_success, ApiError, ApiResponse};
use crate::handlers::{parse_body, Ack};
use crate::middleware::AuthContext;
use crate::server::DeskServer;
use crate::services::TaskInput;
use axum::{
    extract::{Path, State},
    Json,
};
use mydesk_sync::Task;
use serde_json::Value;

pub async fn list_tasks(
    State(server): State<DeskServer>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<Task>>>, ApiError> {
    Ok(Json(api_success(server.tasks.list().await?)))
}

pub async fn create_task(
    State(server): State<DeskServer>,
    _auth: AuthContext,
    Json(body): Json<Value>,
) -> Result<Json<ApiResponse<Task>>, ApiError> {
    let input: TaskInput = parse_body(body)?;
    Ok(Json(api_success(server.tasks.create(input).await?)))
}

pub async fn update_task(
    State(server): State<DeskServer>,
    _auth: AuthContext,
    Path(id): Path<String>,
    Json(patch): Json<Value>,
) -> Result<Json<ApiResponse<Task>>, ApiError> {
    Ok(Json(api_success(server.tasks.update(&id, patch).await?)))
}

pub async fn delete_task(
    State(server): State<DeskServer>,
    _auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Ack>>, ApiError> {
    server.tasks.delete(&id).await?;
    Ok(Json(api_success(Ack::ok())))
}
