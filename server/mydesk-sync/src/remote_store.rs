//! Remote Store contract
//!
//! The authoritative record server as seen by the reconciler. Every
//! operation may fail with a [`SyncError`]; register creates rejected for a
//! duplicate file number surface as HTTP 409.

use crate::error::SyncResult;
use crate::models::{
    AttendanceMap, NewRegisterEntry, NewTask, Profile, RegisterEntry,
    RegisterKind, RegisterPatch, Task,
};
use async_trait::async_trait;
use serde_json::Value;

#[cfg(doc)]
use crate::error::SyncError;

#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list_registers(&self, kind: RegisterKind) -> SyncResult<Vec<RegisterEntry>>;

    /// Create an entry; the server stores the inline document and returns
    /// the entry with its assigned id and `fileUrl`
    async fn create_register(
        &self,
        kind: RegisterKind,
        entry: &NewRegisterEntry,
    ) -> SyncResult<RegisterEntry>;

    async fn update_register(
        &self,
        kind: RegisterKind,
        id: &str,
        patch: &RegisterPatch,
    ) -> SyncResult<RegisterEntry>;

    async fn delete_register(&self, kind: RegisterKind, id: &str) -> SyncResult<()>;

    async fn get_attendance(&self) -> SyncResult<AttendanceMap>;

    /// Create or replace the record for one date; the record is stored as
    /// given
    async fn upsert_attendance(&self, date: &str, record: &Value) -> SyncResult<()>;

    async fn list_tasks(&self) -> SyncResult<Vec<Task>>;

    async fn create_task(&self, task: &NewTask) -> SyncResult<Task>;

    /// Merge `patch` (camelCase task fields) into an existing task
    async fn update_task(&self, id: &str, patch: &Value) -> SyncResult<Task>;

    async fn delete_task(&self, id: &str) -> SyncResult<()>;

    async fn get_profile(&self) -> SyncResult<Profile>;

    async fn save_profile(&self, profile: &Profile) -> SyncResult<Profile>;

    async fn get_offices(&self) -> SyncResult<Vec<String>>;

    /// Replace the office list; the server returns it normalised
    async fn save_offices(&self, offices: &[String]) -> SyncResult<Vec<String>>;
}
