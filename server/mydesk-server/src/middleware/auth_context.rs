//! Authentication context extraction
//!
//! Handlers that take an [`AuthContext`] only run for requests carrying a
//! valid bearer token; role checks are then explicit calls to
//! [`AuthContext::require_role`].

use crate::auth::roles::{is_authorized, Role};
use crate::auth::tokens::TokenClaims;
use crate::error::ApiError;
use crate::server::DeskServer;
use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts};
use std::convert::Infallible;

/// Authenticated caller
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    pub user_id: String,
    pub username: String,
    pub role: Role,
}

impl AuthContext {
    pub fn new(user_id: impl Into<String>, username: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            role,
        }
    }

    /// Require at least `required` in the role hierarchy
    pub fn require_role(&self, required: Role) -> Result<(), ApiError> {
        self.require_any(&[required])
    }

    /// Require a rank at least as high as the highest of `acceptable`
    pub fn require_any(&self, acceptable: &[Role]) -> Result<(), ApiError> {
        if is_authorized(self.role, acceptable) {
            Ok(())
        } else {
            tracing::warn!(user = %self.username, role = %self.role, ?acceptable, "Insufficient role");
            Err(ApiError::authorization("Forbidden"))
        }
    }
}

impl From<TokenClaims> for AuthContext {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

/// Extract the bearer token from the Authorization header
fn extract_token(parts: &Parts) -> Result<&str, ApiError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::authentication("Unauthorized"))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ApiError::authentication("Invalid Authorization header format. Expected: Bearer <token>")
        })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    DeskServer: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let server = DeskServer::from_ref(state);
        let token = extract_token(parts)?;
        let claims = server
            .tokens
            .validate(token)
            .map_err(|_| ApiError::authentication("Unauthorized"))?;
        Ok(claims.into())
    }
}

/// Caller when a valid bearer token is presented, `None` otherwise
#[derive(Debug, Clone, PartialEq)]
pub struct MaybeAuth(pub Option<AuthContext>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuth
where
    DeskServer: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(AuthContext::from_request_parts(parts, state).await.ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_role() {
        let staff = AuthContext::new("2", "clerk", Role::Staff);
        let incharge = AuthContext::new("3", "head", Role::Incharge);

        assert!(staff.require_role(Role::Staff).is_ok());
        assert!(matches!(
            staff.require_role(Role::Incharge),
            Err(ApiError::Authorization { .. })
        ));
        assert!(incharge.require_role(Role::Incharge).is_ok());
        assert!(incharge.require_any(&[Role::Staff, Role::Admin]).is_err());
        assert!(staff.require_any(&[]).is_ok());
    }

    #[test]
    fn test_extract_token() {
        let (mut parts, ()) = axum::http::Request::builder()
            .header(AUTHORIZATION, "Bearer abc.def")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(extract_token(&parts).unwrap(), "abc.def");

        parts.headers.insert(AUTHORIZATION, "Basic Zm9v".parse().unwrap());
        assert!(extract_token(&parts).is_err());
        parts.headers.remove(AUTHORIZATION);
        assert!(matches!(
            extract_token(&parts),
            Err(ApiError::Authentication { .. })
        ));
    }
}
