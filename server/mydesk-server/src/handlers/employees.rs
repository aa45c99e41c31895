//! Employee account management
//!
//! Any authenticated caller may read the directory. Creating, updating and
//! deleting accounts needs at least Incharge, and only an Admin may grant
//! the Admin role.

use crate::auth::users::{NewUser, PublicUser, MIN_PASSWORD_LEN};
use crate::auth::Role;
use crate::error::{api_success, ApiError, ApiResponse};
use crate::handlers::{parse_body, Ack};
use crate::middleware::AuthContext;
use crate::server::DeskServer;
use crate::validation::RequestValidation;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

/// Body of employee creation and signup
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRequest {
    #[serde(default, alias = "email")]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub work_incharge_id: Option<String>,
}

impl RequestValidation for EmployeeRequest {
    fn validate(&self) -> Result<(), ApiError> {
        const REQUIRED: &str = "username, password and fullName are required";
        validate_present!(self.username, REQUIRED);
        validate_field!(
            self.password,
            self.password.as_deref().is_some_and(|p| !p.is_empty()),
            REQUIRED
        );
        validate_present!(self.full_name, REQUIRED);
        validate_field!(
            self.password,
            self.password.as_deref().is_some_and(|p| p.chars().count() >= MIN_PASSWORD_LEN),
            "Password must be at least 8 characters long"
        );
        Ok(())
    }
}

impl EmployeeRequest {
    /// Requested role; missing or unknown names ask for Staff
    pub fn requested_role(&self) -> Role {
        parse_role(self.role.as_deref()).unwrap_or_default()
    }

    pub fn into_new_user(self) -> NewUser {
        let role = self.requested_role();
        NewUser {
            username: self.username.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
            full_name: self.full_name.unwrap_or_default(),
            role,
            work_incharge_id: non_blank(self.work_incharge_id),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdate {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub work_incharge_id: Option<String>,
}

fn parse_role(name: Option<&str>) -> Option<Role> {
    name.and_then(|n| n.parse().ok())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Role an authenticated caller may grant, refusing Admin to non-Admins
pub(crate) fn grantable_role(caller: Role, requested: Role) -> Result<Role, ApiError> {
    if requested == Role::Admin && caller != Role::Admin {
        return Err(ApiError::authorization("Only Admin can create another Admin"));
    }
    Ok(requested)
}

pub async fn list_employees(
    State(server): State<DeskServer>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<PublicUser>>>, ApiError> {
    let users = server.users.list().await?;
    Ok(Json(api_success(users.iter().map(PublicUser::from).collect())))
}

pub async fn get_employee(
    State(server): State<DeskServer>,
    _auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PublicUser>>, ApiError> {
    let user = server
        .users
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee"))?;
    Ok(Json(api_success(PublicUser::from(&user))))
}

pub async fn create_employee(
    State(server): State<DeskServer>,
    auth: AuthContext,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<ApiResponse<PublicUser>>), ApiError> {
    auth.require_role(Role::Incharge)?;
    let request: EmployeeRequest = parse_body(body)?;
    request.validate()?;

    let user = server
        .users
        .create(request.into_new_user(), |_, requested| grantable_role(auth.role, requested))
        .await?;
    Ok((StatusCode::CREATED, Json(api_success(PublicUser::from(&user)))))
}

/// Replace name, role and incharge; a missing `workInchargeId` clears it
pub async fn update_employee(
    State(server): State<DeskServer>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<ApiResponse<PublicUser>>, ApiError> {
    auth.require_role(Role::Incharge)?;
    let update: EmployeeUpdate = parse_body(body)?;

    let existing = server
        .users
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee"))?;
    let role = parse_role(update.role.as_deref()).unwrap_or(existing.role);
    if role == Role::Admin && auth.role != Role::Admin {
        return Err(ApiError::authorization("Only Admin can assign Admin role"));
    }

    let user = server
        .users
        .update(&id, |user| {
            if let Some(name) = update.full_name {
                user.full_name = name.trim().to_string();
            }
            user.role = role;
            user.work_incharge_id = non_blank(update.work_incharge_id);
        })
        .await?
        .ok_or_else(|| ApiError::not_found("Employee"))?;
    Ok(Json(api_success(PublicUser::from(&user))))
}

pub async fn delete_employee(
    State(server): State<DeskServer>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Ack>>, ApiError> {
    auth.require_role(Role::Incharge)?;
    if auth.user_id == id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }
    if !server.users.delete(&id).await? {
        return Err(ApiError::not_found("Employee"));
    }
    Ok(Json(api_success(Ack::ok())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(password: &str, role: Option<&str>) -> EmployeeRequest {
        EmployeeRequest {
            username: Some("clerk".into()),
            password: Some(password.into()),
            full_name: Some("Asha Rao".into()),
            role: role.map(str::to_string),
            work_incharge_id: Some("  ".into()),
        }
    }

    #[test]
    fn test_employee_request_validation() {
        assert!(request("long-enough", None).validate().is_ok());

        let err = request("short", None).validate().unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 8 characters long");

        let missing = EmployeeRequest {
            full_name: None,
            ..request("long-enough", None)
        };
        assert_eq!(
            missing.validate().unwrap_err().to_string(),
            "username, password and fullName are required"
        );
    }

    #[test]
    fn test_requested_role_defaults_to_staff() {
        assert_eq!(request("x", Some("INCHARGE")).requested_role(), Role::Incharge);
        assert_eq!(request("x", Some("owner")).requested_role(), Role::Staff);
        let new_user = request("x", None).into_new_user();
        assert_eq!(new_user.role, Role::Staff);
        assert_eq!(new_user.work_incharge_id, None);
    }

    #[test]
    fn test_only_admin_grants_admin() {
        assert_eq!(grantable_role(Role::Admin, Role::Admin).unwrap(), Role::Admin);
        assert_eq!(grantable_role(Role::Incharge, Role::Staff).unwrap(), Role::Staff);
        assert!(matches!(
            grantable_role(Role::Incharge, Role::Admin),
            Err(ApiError::Authorization { .. })
        ));
    }
}
