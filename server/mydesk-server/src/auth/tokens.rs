//! Session token issuing and validation (HS256 JWT)

use crate::auth::roles::Role;
use crate::auth::users::User;
use chrono::{Duration, Utc};
use error_common::{DeskError, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT token claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    pub username: String,
    pub role: Role,
    /// Issued at timestamp (seconds since epoch)
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch)
    pub exp: i64,
}

impl TokenClaims {
    pub fn for_user(user: &User, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        let claims = TokenClaims::for_user(user, self.ttl);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| DeskError::InternalError(format!("Token signing failed: {e}")))
    }

    pub fn validate(&self, token: &str) -> Result<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| DeskError::AuthError(format!("Invalid or expired token: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "7".to_string(),
            username: "clerk".to_string(),
            role: Role::Incharge,
            ..User::default()
        }
    }

    #[test]
    fn test_issue_and_validate() {
        let service = TokenService::new("secret", 1);
        let token = service.issue(&user()).unwrap();
        let claims = service.validate(&token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.username, "clerk");
        assert_eq!(claims.role, Role::Incharge);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_rejects_foreign_and_expired_tokens() {
        let issuer = TokenService::new("secret", 1);
        let other = TokenService::new("other-secret", 1);
        let token = issuer.issue(&user()).unwrap();
        assert!(matches!(other.validate(&token), Err(DeskError::AuthError(_))));

        let expired = TokenService::new("secret", -2);
        let token = expired.issue(&user()).unwrap();
        assert!(issuer.validate(&token).is_err());
        assert!(issuer.validate("not.a.token").is_err());
    }
}
