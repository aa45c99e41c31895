//! In-memory [`RemoteStore`]
//!
//! Mirrors the record server's observable behaviour (duplicate file number
//! rejection, server-assigned ids, office normalisation) and records every
//! call so reconciliation runs can be asserted on. Individual fetches and
//! creates can be made to fail.

use crate::error::{SyncError, SyncResult};
use crate::models::{
    attendance_record_present, file_no_key, normalize_offices, AttendanceMap, Collection,
    DocumentDescriptor, NewRegisterEntry, NewTask, Profile, RegisterEntry, RegisterKind,
    RegisterPatch, Task,
};
use crate::remote_store::RemoteStore;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;

/// A call received by [`MemoryRemoteStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    ListRegisters(RegisterKind),
    CreateRegister { kind: RegisterKind, file_no: String },
    UpdateRegister { kind: RegisterKind, id: String },
    DeleteRegister { kind: RegisterKind, id: String },
    GetAttendance,
    UpsertAttendance(String),
    ListTasks,
    CreateTask { title: String },
    UpdateTask(String),
    DeleteTask(String),
    GetProfile,
    SaveProfile,
    GetOffices,
    SaveOffices(Vec<String>),
}

impl RemoteCall {
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            RemoteCall::ListRegisters(_)
                | RemoteCall::GetAttendance
                | RemoteCall::ListTasks
                | RemoteCall::GetProfile
                | RemoteCall::GetOffices
        )
    }
}

#[derive(Debug, Default)]
struct State {
    inward: Vec<RegisterEntry>,
    outward: Vec<RegisterEntry>,
    attendance: AttendanceMap,
    tasks: Vec<Task>,
    profile: Profile,
    offices: Vec<String>,
    calls: Vec<RemoteCall>,
    failing_fetches: HashSet<Collection>,
    failing_creates: HashSet<String>,
    next_id: u64,
}

impl State {
    fn registers_mut(&mut self, kind: RegisterKind) -> &mut Vec<RegisterEntry> {
        match kind {
            RegisterKind::Inward => &mut self.inward,
            RegisterKind::Outward => &mut self.outward,
        }
    }

    fn next_id(&mut self) -> String {
        self.next_id += 1;
        format!("mem-{}", self.next_id)
    }

    fn check_fetch(&self, collection: Collection) -> SyncResult<()> {
        if self.failing_fetches.contains(&collection) {
            return Err(SyncError::Network(format!("{collection} unavailable")));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    state: Mutex<State>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_registers(mut self, kind: RegisterKind, entries: Vec<RegisterEntry>) -> Self {
        *self.state.get_mut().registers_mut(kind) = entries;
        self
    }

    #[must_use]
    pub fn with_attendance(mut self, attendance: AttendanceMap) -> Self {
        self.state.get_mut().attendance = attendance;
        self
    }

    #[must_use]
    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.state.get_mut().tasks = tasks;
        self
    }

    #[must_use]
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.state.get_mut().profile = profile;
        self
    }

    #[must_use]
    pub fn with_offices(mut self, offices: Vec<String>) -> Self {
        self.state.get_mut().offices = offices;
        self
    }

    /// Make every fetch of `collection` fail with a network error
    pub fn fail_fetch(&self, collection: Collection) {
        self.state.lock().failing_fetches.insert(collection);
    }

    /// Make creates of the given file number fail with HTTP 500
    pub fn fail_create(&self, file_no: &str) {
        self.state.lock().failing_creates.insert(file_no_key(file_no));
    }

    pub fn registers(&self, kind: RegisterKind) -> Vec<RegisterEntry> {
        self.state.lock().registers_mut(kind).clone()
    }

    pub fn attendance(&self) -> AttendanceMap {
        self.state.lock().attendance.clone()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().tasks.clone()
    }

    pub fn profile(&self) -> Profile {
        self.state.lock().profile.clone()
    }

    pub fn offices(&self) -> Vec<String> {
        self.state.lock().offices.clone()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().calls.clone()
    }

    pub fn write_calls(&self) -> Vec<RemoteCall> {
        self.calls().into_iter().filter(RemoteCall::is_write).collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn list_registers(&self, kind: RegisterKind) -> SyncResult<Vec<RegisterEntry>> {
        let mut state = self.state.lock();
        state.calls.push(RemoteCall::ListRegisters(kind));
        state.check_fetch(kind.collection())?;
        Ok(state.registers_mut(kind).clone())
    }

    async fn create_register(
        &self,
        kind: RegisterKind,
        entry: &NewRegisterEntry,
    ) -> SyncResult<RegisterEntry> {
        let mut state = self.state.lock();
        state.calls.push(RemoteCall::CreateRegister {
            kind,
            file_no: entry.file_no.clone(),
        });

        let key = file_no_key(&entry.file_no);
        if state.failing_creates.contains(&key) {
            return Err(SyncError::http(500, Some(format!("Failed to save {kind}"))));
        }
        if key.is_empty()
            || entry.office.trim().is_empty()
            || !entry.document.has_inline_data()
            || entry.document.name.is_empty()
        {
            return Err(SyncError::http(400, Some("Missing required fields".to_string())));
        }
        if state
            .registers_mut(kind)
            .iter()
            .any(|existing| existing.file_no_key() == key)
        {
            return Err(SyncError::http(409, Some("Duplicate file number".to_string())));
        }

        let id = state.next_id();
        let office = Some(entry.office.trim().to_string());
        let (from_office, to_office) = match kind {
            RegisterKind::Inward => (office, None),
            RegisterKind::Outward => (None, office),
        };
        let created = RegisterEntry {
            id: Some(id),
            file_no: entry.file_no.trim().to_string(),
            from_office,
            to_office,
            subject: entry.subject.trim().to_string(),
            note: entry.note.trim().to_string(),
            document: Some(DocumentDescriptor {
                data: None,
                ..entry.document.clone()
            }),
            file_url: Some(format!("/files/{kind}/{}", entry.document.name)),
            date: Some(Utc::now().to_rfc3339()),
        };
        state.registers_mut(kind).insert(0, created.clone());
        Ok(created)
    }

    async fn update_register(
        &self,
        kind: RegisterKind,
        id: &str,
        patch: &RegisterPatch,
    ) -> SyncResult<RegisterEntry> {
        let mut state = self.state.lock();
        state.calls.push(RemoteCall::UpdateRegister {
            kind,
            id: id.to_string(),
        });

        let list = state.registers_mut(kind);
        let index = list
            .iter()
            .position(|e| e.id.as_deref() == Some(id))
            .ok_or_else(|| SyncError::http(404, Some("Not found".to_string())))?;

        if let Some(file_no) = &patch.file_no {
            let key = file_no_key(file_no);
            if list
                .iter()
                .enumerate()
                .any(|(i, e)| i != index && e.file_no_key() == key)
            {
                return Err(SyncError::http(409, Some("Duplicate file number".to_string())));
            }
        }

        let entry = list
            .get_mut(index)
            .ok_or_else(|| SyncError::http(404, Some("Not found".to_string())))?;
        if let Some(file_no) = &patch.file_no {
            entry.file_no = file_no.trim().to_string();
        }
        if let Some(office) = &patch.office {
            let office = Some(office.trim().to_string());
            match kind {
                RegisterKind::Inward => entry.from_office = office,
                RegisterKind::Outward => entry.to_office = office,
            }
        }
        if let Some(subject) = &patch.subject {
            entry.subject = subject.trim().to_string();
        }
        if let Some(note) = &patch.note {
            entry.note = note.trim().to_string();
        }
        Ok(entry.clone())
    }

    async fn delete_register(&self, kind: RegisterKind, id: &str) -> SyncResult<()> {
        let mut state = self.state.lock();
        state.calls.push(RemoteCall::DeleteRegister {
            kind,
            id: id.to_string(),
        });
        let list = state.registers_mut(kind);
        let before = list.len();
        list.retain(|e| e.id.as_deref() != Some(id));
        if list.len() == before {
            return Err(SyncError::http(404, Some("Not found".to_string())));
        }
        Ok(())
    }

    async fn get_attendance(&self) -> SyncResult<AttendanceMap> {
        let mut state = self.state.lock();
        state.calls.push(RemoteCall::GetAttendance);
        state.check_fetch(Collection::Attendance)?;
        Ok(state.attendance.clone())
    }

    async fn upsert_attendance(&self, date: &str, record: &Value) -> SyncResult<()> {
        let mut state = self.state.lock();
        state.calls.push(RemoteCall::UpsertAttendance(date.to_string()));
        if date.is_empty() || !attendance_record_present(record) {
            return Err(SyncError::http(400, Some("Missing date/record".to_string())));
        }
        state.attendance.insert(date.to_string(), record.clone());
        Ok(())
    }

    async fn list_tasks(&self) -> SyncResult<Vec<Task>> {
        let mut state = self.state.lock();
        state.calls.push(RemoteCall::ListTasks);
        state.check_fetch(Collection::Tasks)?;
        Ok(state.tasks.clone())
    }

    async fn create_task(&self, task: &NewTask) -> SyncResult<Task> {
        let mut state = self.state.lock();
        state.calls.push(RemoteCall::CreateTask {
            title: task.title.clone(),
        });
        if task.title.is_empty() || task.due_date.is_empty() {
            return Err(SyncError::http(400, Some("Missing title/dueDate".to_string())));
        }
        let now = Utc::now().to_rfc3339();
        let created = Task {
            id: Some(state.next_id()),
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            status: task.status,
            due_date: task.due_date.clone(),
            related_doc_id: task.related_doc_id.clone(),
            created_at: Some(now.clone()),
            updated_at: Some(now),
        };
        state.tasks.push(created.clone());
        Ok(created)
    }

    async fn update_task(&self, id: &str, patch: &Value) -> SyncResult<Task> {
        let mut state = self.state.lock();
        state.calls.push(RemoteCall::UpdateTask(id.to_string()));
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id.as_deref() == Some(id))
            .ok_or_else(|| SyncError::http(404, Some("Not found".to_string())))?;

        let mut merged = serde_json::to_value(&*task)?;
        if let (Some(target), Some(fields)) = (merged.as_object_mut(), patch.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
            target.insert("id".into(), Value::String(id.to_string()));
            target.insert("updatedAt".into(), Value::String(Utc::now().to_rfc3339()));
        }
        *task = serde_json::from_value(merged)?;
        Ok(task.clone())
    }

    async fn delete_task(&self, id: &str) -> SyncResult<()> {
        let mut state = self.state.lock();
        state.calls.push(RemoteCall::DeleteTask(id.to_string()));
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id.as_deref() != Some(id));
        if state.tasks.len() == before {
            return Err(SyncError::http(404, Some("Not found".to_string())));
        }
        Ok(())
    }

    async fn get_profile(&self) -> SyncResult<Profile> {
        let mut state = self.state.lock();
        state.calls.push(RemoteCall::GetProfile);
        state.check_fetch(Collection::Profile)?;
        Ok(state.profile.clone())
    }

    async fn save_profile(&self, profile: &Profile) -> SyncResult<Profile> {
        let mut state = self.state.lock();
        state.calls.push(RemoteCall::SaveProfile);
        state.profile = profile.clone();
        Ok(profile.clone())
    }

    async fn get_offices(&self) -> SyncResult<Vec<String>> {
        let mut state = self.state.lock();
        state.calls.push(RemoteCall::GetOffices);
        state.check_fetch(Collection::Offices)?;
        Ok(state.offices.clone())
    }

    async fn save_offices(&self, offices: &[String]) -> SyncResult<Vec<String>> {
        let mut state = self.state.lock();
        state.calls.push(RemoteCall::SaveOffices(offices.to_vec()));
        state.offices = normalize_offices(offices);
        Ok(state.offices.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_entry(file_no: &str) -> NewRegisterEntry {
        NewRegisterEntry {
            file_no: file_no.to_string(),
            office: "HR".to_string(),
            subject: String::new(),
            note: String::new(),
            document: DocumentDescriptor {
                name: "scan.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
                size: 3,
                data: Some("data:application/pdf;base64,AAAA".to_string()),
            },
        }
    }

    #[tokio::test]
    async fn test_duplicate_file_number_rejected_case_insensitively() {
        let store = MemoryRemoteStore::new();
        store
            .create_register(RegisterKind::Inward, &new_entry("AB/12"))
            .await
            .unwrap();

        let err = store
            .create_register(RegisterKind::Inward, &new_entry("ab/12"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        // The other register is independent
        store
            .create_register(RegisterKind::Outward, &new_entry("ab/12"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_created_entry_drops_inline_data() {
        let store = MemoryRemoteStore::new();
        let created = store
            .create_register(RegisterKind::Inward, &new_entry("1"))
            .await
            .unwrap();
        let document = created.document.unwrap();
        assert!(!document.has_inline_data());
        assert_eq!(created.file_url.as_deref(), Some("/files/inward/scan.pdf"));
        assert_eq!(created.from_office.as_deref(), Some("HR"));
    }

    #[tokio::test]
    async fn test_fetch_failure_injection() {
        let store = MemoryRemoteStore::new();
        store.fail_fetch(Collection::Tasks);
        assert!(store.list_tasks().await.is_err());
        assert!(store.get_offices().await.is_ok());
        assert!(store.write_calls().is_empty());
    }

    #[tokio::test]
    async fn test_task_update_preserves_id() {
        let store = MemoryRemoteStore::new();
        let created = store
            .create_task(&NewTask {
                title: "Report".into(),
                description: String::new(),
                priority: crate::models::TaskPriority::High,
                status: crate::models::TaskStatus::Pending,
                due_date: "2025-03-01".into(),
                related_doc_id: String::new(),
            })
            .await
            .unwrap();
        let id = created.id.clone().unwrap();

        let updated = store
            .update_task(&id, &serde_json::json!({ "id": "other", "status": "Done" }))
            .await
            .unwrap();
        assert_eq!(updated.id.as_deref(), Some(id.as_str()));
        assert_eq!(updated.status, crate::models::TaskStatus::Done);
    }
}
