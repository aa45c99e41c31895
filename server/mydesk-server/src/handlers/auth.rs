use crate::auth::users::PublicUser;
use crate::auth::Role;
use crate::error::{api_success, ApiError, ApiResponse};
use crate::handlers::employees::{grantable_role, EmployeeRequest};
use crate::handlers::{parse_body, Ack};
use crate::middleware::{AuthContext, MaybeAuth};
use crate::server::DeskServer;
use crate::validation::RequestValidation;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default, alias = "email")]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl RequestValidation for LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_present!(self.username, "Missing username/password");
        validate_field!(
            self.password,
            self.password.as_deref().is_some_and(|p| !p.is_empty()),
            "Missing username/password"
        );
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Exchange credentials for a bearer token
pub async fn login(
    State(server): State<DeskServer>,
    Json(body): Json<Value>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let request: LoginRequest = parse_body(body)?;
    request.validate()?;
    let username = request.username.unwrap_or_default();
    let password = request.password.unwrap_or_default();

    let user = server
        .users
        .authenticate(&username, &password)
        .await?
        .ok_or_else(|| {
            logger_redacted::redacted_warn!("Failed login for username={username}");
            ApiError::authentication("Invalid credentials")
        })?;

    let token = server.tokens.issue(&user)?;
    info!(user_id = %user.id, role = %user.role, "User logged in");
    Ok(Json(api_success(LoginResponse {
        token,
        user: PublicUser::from(&user),
    })))
}

/// Current user of the presented token
pub async fn me(
    State(server): State<DeskServer>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<PublicUser>>, ApiError> {
    let user = match server.users.find_by_id(&auth.user_id).await? {
        Some(user) => PublicUser::from(&user),
        None => PublicUser {
            id: auth.user_id,
            username: auth.username,
            role: auth.role,
            ..PublicUser::default()
        },
    };
    Ok(Json(api_success(user)))
}

/// Create an account. The first account of an empty store becomes Admin;
/// after that the caller must be at least Incharge.
pub async fn signup(
    State(server): State<DeskServer>,
    MaybeAuth(caller): MaybeAuth,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<ApiResponse<LoginResponse>>), ApiError> {
    let request: EmployeeRequest = parse_body(body)?;
    request.validate()?;

    let caller_role = caller.as_ref().map(|c| c.role);
    let user = server
        .users
        .create(request.into_new_user(), |existing, requested| {
            if existing == 0 {
                return Ok(Role::Admin);
            }
            match caller_role {
                Some(role) if role.is_at_least(Role::Incharge) => grantable_role(role, requested),
                _ => Err(ApiError::authorization("Only Incharge or Admin can create employees")),
            }
        })
        .await?;

    let token = server.tokens.issue(&user)?;
    info!(user_id = %user.id, role = %user.role, "Account signed up");
    Ok((
        StatusCode::CREATED,
        Json(api_success(LoginResponse {
            token,
            user: PublicUser::from(&user),
        })),
    ))
}

/// Tokens are stateless; logout only confirms the caller was authenticated
pub async fn logout(auth: AuthContext) -> Json<ApiResponse<Ack>> {
    info!(user_id = %auth.user_id, "User logged out");
    Json(api_success(Ack::ok()))
}
