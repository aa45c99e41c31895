//! Domain records shared by the Local Store, the Remote Store and the server
//!
//! Field names follow the JSON documents the web client writes
//! (`fileNo`, `fromOffice`, `dueDate`, `updatedAt`, ...).

use chrono::{DateTime, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::local_store::keys;

/// The six collections a client keeps locally and the server persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Inward,
    Outward,
    Attendance,
    Tasks,
    Profile,
    Offices,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Inward,
        Collection::Outward,
        Collection::Attendance,
        Collection::Tasks,
        Collection::Profile,
        Collection::Offices,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Inward => "inward",
            Collection::Outward => "outward",
            Collection::Attendance => "attendance",
            Collection::Tasks => "tasks",
            Collection::Profile => "profile",
            Collection::Offices => "offices",
        }
    }

    /// Local Store key holding this collection
    pub fn local_key(&self) -> &'static str {
        match self {
            Collection::Inward => keys::INWARD,
            Collection::Outward => keys::OUTWARD,
            Collection::Attendance => keys::ATTENDANCE,
            Collection::Tasks => keys::TASKS,
            Collection::Profile => keys::PROFILE,
            Collection::Offices => keys::OFFICES,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Registers
// ---------------------------------------------------------------------------

/// Inward or Outward correspondence register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterKind {
    Inward,
    Outward,
}

impl RegisterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegisterKind::Inward => "inward",
            RegisterKind::Outward => "outward",
        }
    }

    /// JSON field carrying the counterpart office
    pub fn office_field(&self) -> &'static str {
        match self {
            RegisterKind::Inward => "fromOffice",
            RegisterKind::Outward => "toOffice",
        }
    }

    pub fn collection(&self) -> Collection {
        match self {
            RegisterKind::Inward => Collection::Inward,
            RegisterKind::Outward => Collection::Outward,
        }
    }
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attached document descriptor
///
/// `data` is the inline base64 data URL a client holds before upload; once
/// the server has stored the file only the descriptor and `fileUrl` remain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub mime_type: String,
    #[serde(default, deserialize_with = "lenient_size")]
    pub size: u64,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl DocumentDescriptor {
    pub fn has_inline_data(&self) -> bool {
        self.data.as_deref().is_some_and(|d| !d.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterEntry {
    #[serde(default, deserialize_with = "lenient_opt_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub file_no: String,
    #[serde(default, alias = "from", deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub from_office: Option<String>,
    #[serde(default, alias = "to", deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub to_office: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub subject: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub note: String,
    #[serde(default, deserialize_with = "lenient_document", skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentDescriptor>,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl RegisterEntry {
    /// Counterpart office for `kind`, `None` when missing or blank
    pub fn office(&self, kind: RegisterKind) -> Option<&str> {
        let office = match kind {
            RegisterKind::Inward => self.from_office.as_deref(),
            RegisterKind::Outward => self.to_office.as_deref(),
        };
        office.map(str::trim).filter(|o| !o.is_empty())
    }

    /// Case-insensitive uniqueness key of the file number
    pub fn file_no_key(&self) -> String {
        file_no_key(&self.file_no)
    }
}

/// Normalised form used for case-insensitive file number comparison
pub fn file_no_key(file_no: &str) -> String {
    file_no.trim().to_lowercase()
}

/// Payload of a register create call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegisterEntry {
    pub file_no: String,
    pub office: String,
    pub subject: String,
    pub note: String,
    pub document: DocumentDescriptor,
}

impl NewRegisterEntry {
    /// JSON body with the counterpart office under the register's field name
    pub fn to_payload(&self, kind: RegisterKind) -> Value {
        let mut body = Map::new();
        body.insert("fileNo".into(), Value::String(self.file_no.clone()));
        body.insert(kind.office_field().into(), Value::String(self.office.clone()));
        body.insert("subject".into(), Value::String(self.subject.clone()));
        body.insert("note".into(), Value::String(self.note.clone()));
        body.insert(
            "document".into(),
            serde_json::to_value(&self.document).unwrap_or(Value::Null),
        );
        Value::Object(body)
    }
}

/// Partial update of a register entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterPatch {
    pub file_no: Option<String>,
    pub office: Option<String>,
    pub subject: Option<String>,
    pub note: Option<String>,
    pub document: Option<DocumentDescriptor>,
}

impl RegisterPatch {
    pub fn to_payload(&self, kind: RegisterKind) -> Value {
        let mut body = Map::new();
        if let Some(file_no) = &self.file_no {
            body.insert("fileNo".into(), Value::String(file_no.clone()));
        }
        if let Some(office) = &self.office {
            body.insert(kind.office_field().into(), Value::String(office.clone()));
        }
        if let Some(subject) = &self.subject {
            body.insert("subject".into(), Value::String(subject.clone()));
        }
        if let Some(note) = &self.note {
            body.insert("note".into(), Value::String(note.clone()));
        }
        if let Some(document) = &self.document {
            body.insert(
                "document".into(),
                serde_json::to_value(document).unwrap_or(Value::Null),
            );
        }
        Value::Object(body)
    }
}

// ---------------------------------------------------------------------------
// Attendance
// ---------------------------------------------------------------------------

/// Attendance status of a day; unknown values are kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttendanceKind {
    Present,
    OfficialTravel,
    OfficialLeave,
    OnDutyLeave,
    CasualLeave,
    MedicalLeave,
    PrivilegeLeave,
    UnpaidLeave,
    Other(String),
}

impl From<String> for AttendanceKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "present" => Self::Present,
            "official_travel" => Self::OfficialTravel,
            "official_leave" => Self::OfficialLeave,
            "on_duty_leave" => Self::OnDutyLeave,
            "casual_leave" => Self::CasualLeave,
            "medical_leave" => Self::MedicalLeave,
            "privilege_leave" => Self::PrivilegeLeave,
            "unpaid_leave" => Self::UnpaidLeave,
            _ => Self::Other(value),
        }
    }
}

impl From<AttendanceKind> for String {
    fn from(kind: AttendanceKind) -> Self {
        match kind {
            AttendanceKind::Present => "present".to_string(),
            AttendanceKind::OfficialTravel => "official_travel".to_string(),
            AttendanceKind::OfficialLeave => "official_leave".to_string(),
            AttendanceKind::OnDutyLeave => "on_duty_leave".to_string(),
            AttendanceKind::CasualLeave => "casual_leave".to_string(),
            AttendanceKind::MedicalLeave => "medical_leave".to_string(),
            AttendanceKind::PrivilegeLeave => "privilege_leave".to_string(),
            AttendanceKind::UnpaidLeave => "unpaid_leave".to_string(),
            AttendanceKind::Other(value) => value,
        }
    }
}

/// Typed view of one day of attendance. Fields the client adds beyond the
/// known ones are carried in `extra` so the serialized form survives a round
/// trip.
///
/// Records are stored and compared as raw JSON ([`AttendanceMap`]); this view
/// is for building and inspecting them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AttendanceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// RFC 3339 string from current clients, epoch millis from some older ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AttendanceRecord {
    pub fn new(kind: AttendanceKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Typed view of a stored record, `None` when it is not a record object
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Date (`YYYY-MM-DD`) to the record exactly as the client wrote it; at most
/// one record per date
pub type AttendanceMap = BTreeMap<String, Value>;

/// A record the server accepts for upsert: anything but `null`, `false`,
/// `0` or `""`
pub fn attendance_record_present(record: &Value) -> bool {
    match record {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => true,
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Empty or unknown priorities decode as `Medium` on [`Task`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskPriority {
    High,
    #[default]
    Medium,
    Low,
}

/// Empty or unknown statuses decode as `Pending` on [`Task`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress", alias = "In-Progress")]
    InProgress,
    Done,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, deserialize_with = "lenient_opt_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub priority: TaskPriority,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "lenient_string")]
    pub due_date: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub related_doc_id: String,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Task {
    pub fn signature(&self) -> TaskSignature {
        task_signature(&self.title, &self.due_date)
    }

    /// Create payload for this task; the identifier is dropped
    pub fn to_new_task(&self) -> NewTask {
        NewTask {
            title: self.title.clone(),
            description: self.description.clone(),
            priority: self.priority,
            status: self.status,
            due_date: self.due_date.clone(),
            related_doc_id: self.related_doc_id.clone(),
        }
    }
}

/// (lowercased title, due date): duplicate key for tasks whose ids differ
pub type TaskSignature = (String, String);

pub fn task_signature(title: &str, due_date: &str) -> TaskSignature {
    (title.to_lowercase(), due_date.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub status: TaskStatus,
    pub due_date: String,
    #[serde(default)]
    pub related_doc_id: String,
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Free-form profile object; `updatedAt` drives conflict resolution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile {
    pub fields: Map<String, Value>,
}

impl Profile {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn updated_at(&self) -> Option<&Value> {
        self.fields.get("updatedAt")
    }
}

/// Milliseconds since the epoch of an `updatedAt` value.
///
/// Missing, null, empty or falsy values count as the epoch. Strings are
/// parsed as RFC 3339 or as a bare `YYYY-MM-DD` date (UTC midnight).
/// Anything else is unparseable and yields `None`.
pub fn timestamp_millis(value: Option<&Value>) -> Option<i64> {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Some(0),
        Some(Value::String(s)) if s.trim().is_empty() => Some(0),
        Some(Value::String(s)) => parse_timestamp(s.trim()),
        #[allow(clippy::cast_possible_truncation)]
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(_) => None,
    }
}

fn parse_timestamp(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// True iff the local profile is strictly newer than the remote one.
/// An unparseable timestamp on either side never wins.
pub fn profile_is_newer(local: &Profile, remote: &Profile) -> bool {
    match (
        timestamp_millis(local.updated_at()),
        timestamp_millis(remote.updated_at()),
    ) {
        (Some(local_ms), Some(remote_ms)) => local_ms > remote_ms,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Offices
// ---------------------------------------------------------------------------

/// Trim, drop empties, de-duplicate case-insensitively (first occurrence
/// wins) and sort ascending, ignoring case first.
pub fn normalize_offices<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut offices: Vec<String> = names
        .into_iter()
        .map(|name| name.as_ref().trim().to_string())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_lowercase()))
        .collect();
    offices.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    offices
}

/// Remote entries first, then local ones, normalised
pub fn merge_offices(remote: &[String], local: &[String]) -> Vec<String> {
    normalize_offices(remote.iter().chain(local.iter()))
}

/// Office name from a loosely typed local value (`null`/`false` become empty)
pub fn office_name(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "true".to_string(),
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Lenient field decoding for records written by older clients
// ---------------------------------------------------------------------------

/// String field that also accepts numbers and booleans; null or missing is empty
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// Like [`lenient_string`] but keeps absence distinct from an empty value
pub fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Byte size; numeric strings are parsed, anything else is zero
pub fn lenient_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

/// Document descriptor when the value is an object, `None` otherwise
pub fn lenient_document<'de, D>(deserializer: D) -> Result<Option<DocumentDescriptor>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(object @ Value::Object(_)) => serde_json::from_value(object).ok(),
        _ => None,
    })
}

/// `T` when the value decodes as one; null, empty and unknown values fall
/// back to `T::default()`
pub fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default())
}

/// Record id as a string; numeric ids of older clients are stringified
pub fn lenient_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
