//! Inward and outward register endpoints
//!
//! Both registers share one implementation parameterised by
//! [`RegisterKind`]; the route table binds the per-kind wrappers below.

use crate::auth::Role;
use crate::error::{api_success, ApiError, ApiResponse};
use crate::handlers::{parse_body, Ack};
use crate::middleware::AuthContext;
use crate::server::DeskServer;
use crate::services::RegisterInput;
use axum::{
    extract::{Path, State},
    Json,
};
use mydesk_sync::{RegisterEntry, RegisterKind};
use serde_json::Value;

type EntryResponse = Result<Json<ApiResponse<RegisterEntry>>, ApiError>;

async fn list(server: &DeskServer, kind: RegisterKind) -> Result<Json<ApiResponse<Vec<RegisterEntry>>>, ApiError> {
    Ok(Json(api_success(server.register(kind).list().await?)))
}

async fn create(server: &DeskServer, kind: RegisterKind, auth: &AuthContext, body: Value) -> EntryResponse {
    auth.require_role(Role::Staff)?;
    let input: RegisterInput = parse_body(body)?;
    let entry = server.register(kind).create(input).await?;
    Ok(Json(api_success(entry)))
}

async fn update(server: &DeskServer, kind: RegisterKind, auth: &AuthContext, id: &str, body: Value) -> EntryResponse {
    auth.require_role(Role::Staff)?;
    let patch: RegisterInput = parse_body(body)?;
    let entry = server.register(kind).update(id, patch).await?;
    Ok(Json(api_success(entry)))
}

async fn delete(
    server: &DeskServer,
    kind: RegisterKind,
    auth: &AuthContext,
    id: &str,
) -> Result<Json<ApiResponse<Ack>>, ApiError> {
    auth.require_role(Role::Staff)?;
    server.register(kind).delete(id).await?;
    Ok(Json(api_success(Ack::ok())))
}

pub async fn list_inward(
    State(server): State<DeskServer>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<RegisterEntry>>>, ApiError> {
    list(&server, RegisterKind::Inward).await
}

pub async fn create_inward(
    State(server): State<DeskServer>,
    auth: AuthContext,
    Json(body): Json<Value>,
) -> EntryResponse {
    create(&server, RegisterKind::Inward, &auth, body).await
}

pub async fn update_inward(
    State(server): State<DeskServer>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> EntryResponse {
    update(&server, RegisterKind::Inward, &auth, &id, body).await
}

pub async fn delete_inward(
    State(server): State<DeskServer>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Ack>>, ApiError> {
    delete(&server, RegisterKind::Inward, &auth, &id).await
}

pub async fn list_outward(
    State(server): State<DeskServer>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<RegisterEntry>>>, ApiError> {
    list(&server, RegisterKind::Outward).await
}

pub async fn create_outward(
    State(server): State<DeskServer>,
    auth: AuthContext,
    Json(body): Json<Value>,
) -> EntryResponse {
    create(&server, RegisterKind::Outward, &auth, body).await
}

pub async fn update_outward(
    State(server): State<DeskServer>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> EntryResponse {
    update(&server, RegisterKind::Outward, &auth, &id, body).await
}

pub async fn delete_outward(
    State(server): State<DeskServer>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Ack>>, ApiError> {
    delete(&server, RegisterKind::Outward, &auth, &id).await
}
