//! Inward and outward registers
//!
//! Entries live in `<register_dir>/<kind>.json`, newest first, with their
//! attachments stored next to the file. File numbers are unique per
//! register, compared trimmed and case-insensitively.

use crate::error::ApiError;
use crate::storage::{decode_data_url, AttachmentStore, JsonStore};
use crate::validation::RequestValidation;
use chrono::Utc;
use mydesk_sync::models::{file_no_key, lenient_opt_string};
use mydesk_sync::{DocumentDescriptor, RegisterEntry, RegisterKind};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

/// Create or update body of a register entry
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub file_no: Option<String>,
    #[serde(default, alias = "from")]
    pub from_office: Option<String>,
    #[serde(default, alias = "to")]
    pub to_office: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub document: Option<DocumentDescriptor>,
}

impl RegisterInput {
    pub fn office(&self, kind: RegisterKind) -> Option<&str> {
        match kind {
            RegisterKind::Inward => self.from_office.as_deref(),
            RegisterKind::Outward => self.to_office.as_deref(),
        }
    }

    /// Document carrying both a name and inline data
    fn upload(&self) -> Option<&DocumentDescriptor> {
        self.document
            .as_ref()
            .filter(|d| d.has_inline_data() && !d.name.trim().is_empty())
    }
}

/// Create request of one register
struct NewEntryRequest<'a> {
    kind: RegisterKind,
    input: &'a RegisterInput,
}

impl RequestValidation for NewEntryRequest<'_> {
    fn validate(&self) -> Result<(), ApiError> {
        validate_present!(self.input.file_no, "Missing required fields");
        validate_field!(
            self.input.office(self.kind),
            self.input.office(self.kind).is_some_and(|o| !o.trim().is_empty()),
            "Missing required fields"
        );
        validate_field!(self.input.document, self.input.upload().is_some(), "Missing required fields");
        Ok(())
    }
}

fn trimmed(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

fn set_office(entry: &mut RegisterEntry, kind: RegisterKind, office: String) {
    match kind {
        RegisterKind::Inward => entry.from_office = Some(office),
        RegisterKind::Outward => entry.to_office = Some(office),
    }
}

pub struct RegisterService {
    kind: RegisterKind,
    entries: JsonStore<Vec<RegisterEntry>>,
    attachments: AttachmentStore,
}

impl RegisterService {
    /// Open `<dir>/<kind>.json` and the attachment directory `dir`
    pub async fn open(kind: RegisterKind, dir: impl Into<PathBuf>) -> error_common::Result<Self> {
        let dir = dir.into();
        let attachments = AttachmentStore::open(kind, &dir).await?;
        let entries = JsonStore::open(dir.join(format!("{kind}.json")), Vec::new()).await?;
        Ok(Self {
            kind,
            entries,
            attachments,
        })
    }

    pub fn attachments(&self) -> &AttachmentStore {
        &self.attachments
    }

    /// All entries, newest first
    pub async fn list(&self) -> Result<Vec<RegisterEntry>, ApiError> {
        Ok(self.entries.load().await?)
    }

    /// Decode and store an uploaded document; returns the stored descriptor
    async fn store_document(&self, document: &DocumentDescriptor) -> Result<DocumentDescriptor, ApiError> {
        let bytes = document
            .data
            .as_deref()
            .and_then(decode_data_url)
            .ok_or_else(|| ApiError::validation("Invalid document data"))?;
        let name = self.attachments.store(&document.name, &bytes).await?;
        Ok(DocumentDescriptor {
            name,
            mime_type: document.mime_type.clone(),
            size: bytes.len() as u64,
            data: None,
        })
    }

    pub async fn create(&self, input: RegisterInput) -> Result<RegisterEntry, ApiError> {
        NewEntryRequest {
            kind: self.kind,
            input: &input,
        }
        .validate()?;

        let file_no = trimmed(input.file_no.as_deref());
        let key = file_no_key(&file_no);

        let mut locked = self.entries.lock().await?;
        if locked.value.iter().any(|e| e.file_no_key() == key) {
            return Err(ApiError::conflict("Duplicate file number"));
        }

        let upload = input
            .upload()
            .ok_or_else(|| ApiError::validation("Missing required fields"))?;
        let document = self.store_document(upload).await?;

        let mut entry = RegisterEntry {
            id: Some(Uuid::new_v4().to_string()),
            file_no,
            subject: trimmed(input.subject.as_deref()),
            note: trimmed(input.note.as_deref()),
            file_url: Some(self.attachments.url_for(&document.name)),
            date: Some(Utc::now().to_rfc3339()),
            ..RegisterEntry::default()
        };
        set_office(&mut entry, self.kind, trimmed(input.office(self.kind)));
        let stored_name = document.name.clone();
        entry.document = Some(document);

        locked.value.insert(0, entry.clone());
        if let Err(e) = locked.commit().await {
            self.attachments.remove(&stored_name).await;
            return Err(e.into());
        }

        info!(register = %self.kind, file_no = %entry.file_no, "Register entry created");
        Ok(entry)
    }

    pub async fn update(&self, id: &str, patch: RegisterInput) -> Result<RegisterEntry, ApiError> {
        let mut locked = self.entries.lock().await?;
        let index = locked
            .value
            .iter()
            .position(|e| e.id.as_deref() == Some(id))
            .ok_or_else(|| ApiError::not_found("Entry"))?;

        let current = locked
            .value
            .get(index)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Entry"))?;

        let file_no = match patch.file_no.as_deref() {
            Some(next) => next.trim().to_string(),
            None => current.file_no.clone(),
        };
        if file_no.is_empty() {
            return Err(ApiError::validation("fileNo required"));
        }
        let key = file_no_key(&file_no);
        let duplicate = locked
            .value
            .iter()
            .enumerate()
            .any(|(i, e)| i != index && e.file_no_key() == key);
        if duplicate {
            return Err(ApiError::conflict("Duplicate file number"));
        }

        let mut updated = RegisterEntry {
            file_no,
            ..current.clone()
        };
        if let Some(office) = patch.office(self.kind) {
            set_office(&mut updated, self.kind, office.trim().to_string());
        }
        if let Some(subject) = patch.subject.as_deref() {
            updated.subject = subject.trim().to_string();
        }
        if let Some(note) = patch.note.as_deref() {
            updated.note = note.trim().to_string();
        }

        let previous_name = current.document.as_ref().map(|d| d.name.clone());
        let mut replaced = None;
        if let Some(upload) = patch.upload() {
            let document = self.store_document(upload).await?;
            updated.file_url = Some(self.attachments.url_for(&document.name));
            replaced = Some(document.name.clone());
            updated.document = Some(document);
        }
        if updated.date.is_none() {
            updated.date = Some(Utc::now().to_rfc3339());
        }

        if let Some(slot) = locked.value.get_mut(index) {
            *slot = updated.clone();
        }
        if let Err(e) = locked.commit().await {
            if let Some(name) = &replaced {
                self.attachments.remove(name).await;
            }
            return Err(e.into());
        }

        if let (Some(previous), Some(new_name)) = (previous_name, replaced) {
            if previous != new_name {
                self.attachments.remove(&previous).await;
            }
        }

        info!(register = %self.kind, id, "Register entry updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let mut locked = self.entries.lock().await?;
        let index = locked
            .value
            .iter()
            .position(|e| e.id.as_deref() == Some(id))
            .ok_or_else(|| ApiError::not_found("Entry"))?;
        let removed = locked.value.remove(index);
        locked.commit().await?;

        if let Some(document) = removed.document {
            self.attachments.remove(&document.name).await;
        }
        info!(register = %self.kind, id, "Register entry deleted");
        Ok(())
    }
}
