//! Register attachments
//!
//! Documents arrive as base64 data URLs and are written under the register's
//! directory with a sanitised name. A name that is already taken gets a
//! millisecond timestamp suffix (`<stem>_<millis><ext>`); files are opened
//! with `create_new`, so racing uploads never overwrite each other.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use error_common::{DeskError, Result};
use lazy_static::lazy_static;
use mydesk_sync::RegisterKind;
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

lazy_static! {
    static ref UNSAFE_CHARS: Option<Regex> = Regex::new(r"[^A-Za-z0-9._-]+").ok();
}

/// Attempts with a counter after the timestamped name is also taken
const MAX_COUNTER_ATTEMPTS: u32 = 100;

/// Split a client-supplied name into (stem, extension), ignoring any
/// directory part. A leading dot is part of the stem (`.env` has no
/// extension).
fn split_name(name: &str) -> (&str, &str) {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match base.rfind('.') {
        Some(i) if i > 0 => base.split_at(i),
        _ => (base, ""),
    }
}

/// Sanitise a document name: runs of characters outside `[A-Za-z0-9._-]` in
/// the stem become `_`, the extension is kept. Without a usable name the
/// file is called `attachment_<millis>`.
pub fn sanitize_filename(name: Option<&str>, now_millis: i64) -> String {
    let name = name.map(str::trim).unwrap_or_default();
    let (stem, ext) = split_name(name);
    if stem.is_empty() {
        return format!("attachment_{now_millis}{ext}");
    }
    let stem = match UNSAFE_CHARS.as_ref() {
        Some(re) => re.replace_all(stem, "_").into_owned(),
        None => stem
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
            .collect(),
    };
    format!("{stem}{ext}")
}

/// Bytes of a `data:<mime>;base64,<payload>` URL; `None` when the URL has no
/// base64 payload or the payload does not decode
pub fn decode_data_url(data_url: &str) -> Option<Vec<u8>> {
    let start = data_url.find("base64,")? + "base64,".len();
    let payload: String = data_url
        .get(start..)?
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    BASE64.decode(payload.as_bytes()).ok()
}

/// Attachment directory of one register
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    kind: RegisterKind,
    dir: PathBuf,
}

impl AttachmentStore {
    pub async fn open(kind: RegisterKind, dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { kind, dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Public URL of a stored file
    pub fn url_for(&self, name: &str) -> String {
        format!("/files/{}/{}", self.kind, urlencoding::encode(name))
    }

    /// Write `bytes` under a free name derived from `name`; returns the name
    /// actually used
    pub async fn store(&self, name: &str, bytes: &[u8]) -> Result<String> {
        let now = chrono::Utc::now().timestamp_millis();
        let preferred = sanitize_filename(Some(name), now);
        let (stem, ext) = split_name(&preferred);

        let mut candidates = vec![preferred.clone(), format!("{stem}_{now}{ext}")];
        candidates.extend((1..=MAX_COUNTER_ATTEMPTS).map(|n| format!("{stem}_{now}_{n}{ext}")));

        for candidate in candidates {
            let path = self.dir.join(&candidate);
            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match file {
                Ok(mut file) => {
                    file.write_all(bytes).await?;
                    file.flush().await?;
                    if candidate != preferred {
                        tracing::debug!(register = %self.kind, %preferred, stored = %candidate, "Name taken, renamed attachment");
                    }
                    return Ok(candidate);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(DeskError::StorageError(format!(
            "No free file name for {preferred}"
        )))
    }

    /// Best-effort removal; names with a directory component are ignored
    pub async fn remove(&self, name: &str) {
        if name.is_empty() || Path::new(name).file_name() != Some(std::ffi::OsStr::new(name)) {
            return;
        }
        match tokio::fs::remove_file(self.dir.join(name)).await {
            Ok(()) => tracing::debug!(register = %self.kind, name, "Removed attachment"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(register = %self.kind, name, error = %e, "Could not remove attachment"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename(Some("scan.pdf"), 1), "scan.pdf");
        assert_eq!(sanitize_filename(Some("my letter (v2).pdf"), 1), "my_letter_v2_.pdf");
        assert_eq!(sanitize_filename(Some("C:\\fakepath\\a b.PDF"), 1), "a_b.PDF");
        assert_eq!(sanitize_filename(Some("archive.tar.gz"), 1), "archive.tar.gz");
        assert_eq!(sanitize_filename(Some(".env"), 1), ".env");
        assert_eq!(sanitize_filename(None, 42), "attachment_42");
        assert_eq!(sanitize_filename(Some(""), 42), "attachment_42");
        assert!(UNSAFE_CHARS.is_some());
    }

    #[test]
    fn test_decode_data_url() {
        assert_eq!(
            decode_data_url("data:text/plain;base64,aGVsbG8="),
            Some(b"hello".to_vec())
        );
        assert_eq!(decode_data_url("data:text/plain,hello"), None);
        assert_eq!(decode_data_url("data:text/plain;base64,***"), None);
    }

    #[tokio::test]
    async fn test_store_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = AttachmentStore::open(RegisterKind::Inward, dir.path())
            .await
            .unwrap();

        let first = store.store("scan.pdf", b"one").await.unwrap();
        let second = store.store("scan.pdf", b"two").await.unwrap();
        let third = store.store("scan.pdf", b"three").await.unwrap();

        assert_eq!(first, "scan.pdf");
        assert_ne!(second, first);
        assert!(second.starts_with("scan_") && second.ends_with(".pdf"));
        assert_ne!(third, second);

        assert_eq!(std::fs::read(dir.path().join(&first)).unwrap(), b"one");
        assert_eq!(std::fs::read(dir.path().join(&second)).unwrap(), b"two");
        assert_eq!(std::fs::read(dir.path().join(&third)).unwrap(), b"three");
    }

    #[tokio::test]
    async fn test_concurrent_uploads_get_distinct_names() {
        let dir = TempDir::new().unwrap();
        let store = std::sync::Arc::new(
            AttachmentStore::open(RegisterKind::Outward, dir.path())
                .await
                .unwrap(),
        );

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.store("same.pdf", format!("{i}").as_bytes()).await })
            })
            .collect();

        let mut names = std::collections::HashSet::new();
        for handle in handles {
            names.insert(handle.await.unwrap().unwrap());
        }
        assert_eq!(names.len(), 8);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 8);
    }

    #[tokio::test]
    async fn test_url_and_remove() {
        let dir = TempDir::new().unwrap();
        let store = AttachmentStore::open(RegisterKind::Outward, dir.path())
            .await
            .unwrap();
        assert_eq!(store.url_for("a b.pdf"), "/files/outward/a%20b.pdf");

        let name = store.store("x.pdf", b"x").await.unwrap();
        store.remove(&name).await;
        assert!(!dir.path().join(&name).exists());

        // Traversal attempts and missing files are ignored
        store.remove("../x.pdf").await;
        store.remove("missing.pdf").await;
    }
}
