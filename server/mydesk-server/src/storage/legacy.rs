//! One-shot import of registers from a previous data location
//!
//! `<legacy>/Inward` and `<legacy>/Outward` hold a register index and its
//! attachments. Files are copied only where the destination has no file of
//! the same name, so the import is idempotent across restarts. With cleanup
//! enabled, legacy files already present at the destination are removed and
//! emptied legacy directories deleted. Failures are logged and never stop
//! the server from starting.

use error_common::Result;
use mydesk_sync::RegisterKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// What an import pass did for one register
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub index_copied: bool,
    pub attachments_copied: usize,
    pub removed: usize,
}

pub struct LegacyImport {
    base_dir: PathBuf,
    cleanup: bool,
}

impl LegacyImport {
    pub fn new(base_dir: impl Into<PathBuf>, cleanup: bool) -> Self {
        Self {
            base_dir: base_dir.into(),
            cleanup,
        }
    }

    /// Legacy directory of a register (`Inward` or `Outward`)
    pub fn source_dir(&self, kind: RegisterKind) -> PathBuf {
        let name = match kind {
            RegisterKind::Inward => "Inward",
            RegisterKind::Outward => "Outward",
        };
        self.base_dir.join(name)
    }

    /// Import one register into `dest_dir`, logging instead of failing
    pub async fn run(&self, kind: RegisterKind, dest_dir: &Path) -> ImportSummary {
        let source = self.source_dir(kind);
        match self.import(kind, &source, dest_dir).await {
            Ok(summary) => {
                if summary != ImportSummary::default() {
                    info!(
                        register = kind.as_str(),
                        source = %source.display(),
                        index_copied = summary.index_copied,
                        attachments = summary.attachments_copied,
                        removed = summary.removed,
                        "Legacy register imported"
                    );
                }
                summary
            }
            Err(e) => {
                warn!(register = kind.as_str(), source = %source.display(), error = %e, "Legacy import failed");
                ImportSummary::default()
            }
        }
    }

    async fn import(&self, kind: RegisterKind, source: &Path, dest_dir: &Path) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        if !fs::try_exists(source).await? {
            debug!(source = %source.display(), "No legacy directory");
            return Ok(summary);
        }
        fs::create_dir_all(dest_dir).await?;
        let index = format!("{}.json", kind.as_str());

        summary.index_copied = copy_if_missing(&source.join(&index), &dest_dir.join(&index)).await;
        for name in file_names(source).await? {
            if name != index && copy_if_missing(&source.join(&name), &dest_dir.join(&name)).await {
                summary.attachments_copied += 1;
            }
        }

        if self.cleanup {
            summary.removed = remove_imported(source, dest_dir, &index).await?;
        }
        Ok(summary)
    }
}

/// Regular files directly inside `dir`
async fn file_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if let (true, Some(name)) = (is_file, entry.file_name().to_str()) {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

async fn copy_if_missing(src: &Path, dst: &Path) -> bool {
    if !exists(src).await || exists(dst).await {
        return false;
    }
    match fs::copy(src, dst).await {
        Ok(_) => true,
        Err(e) => {
            warn!(file = %src.display(), error = %e, "Legacy copy failed");
            false
        }
    }
}

/// Delete legacy files that exist at the destination, the index last, then
/// the legacy directory when nothing is left in it
async fn remove_imported(source: &Path, dest_dir: &Path, index: &str) -> Result<usize> {
    let mut removed = 0;
    let mut names: Vec<String> = file_names(source).await?.into_iter().filter(|n| n != index).collect();
    names.push(index.to_string());

    for name in names {
        let src = source.join(&name);
        if !exists(&src).await || !exists(&dest_dir.join(&name)).await {
            continue;
        }
        match fs::remove_file(&src).await {
            Ok(()) => removed += 1,
            Err(e) => warn!(file = %src.display(), error = %e, "Legacy cleanup failed"),
        }
    }

    let mut rest = fs::read_dir(source).await?;
    if rest.next_entry().await?.is_none() {
        fs::remove_dir(source).await?;
        debug!(source = %source.display(), "Legacy directory removed");
    }
    Ok(removed)
}
