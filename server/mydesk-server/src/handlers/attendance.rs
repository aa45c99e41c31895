use crate::error::{api_success, ApiError, ApiResponse};
use crate::handlers::parse_body;
use crate::middleware::AuthContext;
use crate::server::DeskServer;
use crate::validation::RequestValidation;
use axum::{extract::State, Json};
use mydesk_sync::{attendance_record_present, AttendanceMap};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

/// Upsert of a single day; the record is stored exactly as posted
#[derive(Debug, Deserialize)]
pub struct UpsertAttendance {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub record: Option<Value>,
}

impl RequestValidation for UpsertAttendance {
    fn validate(&self) -> Result<(), ApiError> {
        validate_present!(self.date, "Missing date/record");
        validate_field!(
            self.record,
            self.record.as_ref().is_some_and(attendance_record_present),
            "Missing date/record"
        );
        Ok(())
    }
}

pub async fn get_attendance(
    State(server): State<DeskServer>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<AttendanceMap>>, ApiError> {
    Ok(Json(api_success(server.attendance.load().await?)))
}

/// Store the record under its date and answer with the whole map
pub async fn upsert_attendance(
    State(server): State<DeskServer>,
    _auth: AuthContext,
    Json(body): Json<Value>,
) -> Result<Json<ApiResponse<AttendanceMap>>, ApiError> {
    let request: UpsertAttendance = parse_body(body)?;
    request.validate()?;
    let (Some(date), Some(record)) = (request.date, request.record) else {
        return Err(ApiError::validation("Missing date/record"));
    };

    let mut locked = server.attendance.lock().await?;
    locked.value.insert(date.clone(), record);
    let map = locked.value.clone();
    locked.commit().await?;

    info!(%date, "Attendance saved");
    Ok(Json(api_success(map)))
}
