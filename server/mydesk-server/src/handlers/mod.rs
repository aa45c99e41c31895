pub mod attendance;
pub mod auth;
pub mod employees;
pub mod health;
pub mod offices;
pub mod profile;
pub mod registers;
pub mod tasks;

use crate::error::ApiError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// `{ "ok": true }` body of delete and logout
#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub const fn ok() -> Self {
        Self { ok: true }
    }
}

/// Decode a request body into `T`, answering 400 with the error envelope on
/// a shape mismatch
pub(crate) fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::bad_request(format!("Invalid request body: {e}")))
}
