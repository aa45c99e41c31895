//! Reconciler
//!
//! One-shot merge of the Local Store into the Remote Store. Every record
//! that exists only locally is created remotely; nothing remote is ever
//! deleted and newer remote data is never overwritten. Each collection is
//! processed independently and every failure is counted in the
//! [`ReconcileReport`] instead of aborting the run.

use crate::config::{OfficeChangeDetection, SyncConfig};
use crate::error::SyncResult;
use crate::local_store::{keys, LocalStore, LocalStoreExt};
use crate::models::{
    attendance_record_present, file_no_key, merge_offices, office_name, profile_is_newer,
    AttendanceMap, AttendanceRecord, NewRegisterEntry, Profile, RegisterEntry, RegisterKind, Task,
    TaskSignature,
};
use crate::remote_store::RemoteStore;
use crate::report::{CollectionOutcome, ReconcileReport};
use chrono::Utc;
use logger_redacted::redacted_warn;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Persisted "already migrated" flag, passed into and returned from a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MigrationFlag(bool);

impl MigrationFlag {
    pub const PENDING: MigrationFlag = MigrationFlag(false);
    pub const MIGRATED: MigrationFlag = MigrationFlag(true);

    pub fn is_set(self) -> bool {
        self.0
    }

    /// Read the flag; only the exact value `"1"` counts as migrated
    pub fn load(local: &dyn LocalStore) -> Self {
        match local.get_raw(keys::MIGRATED) {
            Ok(value) => MigrationFlag(value.as_deref().map(str::trim) == Some("1")),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read migration flag");
                Self::PENDING
            }
        }
    }

    pub fn store(self, local: &dyn LocalStore) {
        let result = if self.0 {
            local.set_raw(keys::MIGRATED, "1")
        } else {
            local.remove(keys::MIGRATED)
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "Could not persist migration flag");
        }
    }
}

/// Result of [`Reconciler::run`]. `report` is `None` when the flag was
/// already set and nothing ran.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub flag: MigrationFlag,
    pub report: Option<ReconcileReport>,
}

/// Why a local register entry was not pushed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyFileNo,
    AlreadyRemote,
    NoInlineData,
    MissingOffice,
    Malformed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::EmptyFileNo => "empty file number",
            SkipReason::AlreadyRemote => "file number already on server",
            SkipReason::NoInlineData => "document already uploaded",
            SkipReason::MissingOffice => "counterpart office missing",
            SkipReason::Malformed => "malformed record",
        };
        f.write_str(reason)
    }
}

/// Decide whether a raw local register entry must be created remotely.
/// `remote_file_nos` holds normalised file numbers (see [`file_no_key`]).
pub fn plan_register(
    kind: RegisterKind,
    raw: &Value,
    remote_file_nos: &HashSet<String>,
) -> Result<NewRegisterEntry, SkipReason> {
    let entry: RegisterEntry =
        serde_json::from_value(raw.clone()).map_err(|_| SkipReason::Malformed)?;

    let key = entry.file_no_key();
    if key.is_empty() {
        return Err(SkipReason::EmptyFileNo);
    }
    if remote_file_nos.contains(&key) {
        return Err(SkipReason::AlreadyRemote);
    }
    let document = entry
        .document
        .clone()
        .filter(|d| d.has_inline_data())
        .ok_or(SkipReason::NoInlineData)?;
    let office = entry.office(kind).ok_or(SkipReason::MissingOffice)?;

    Ok(NewRegisterEntry {
        file_no: entry.file_no.trim().to_string(),
        office: office.to_string(),
        subject: entry.subject.clone(),
        note: entry.note.clone(),
        document,
    })
}

/// Publishes `true` on creation and `false` on drop
struct BusyGuard<'a>(Option<&'a watch::Sender<bool>>);

impl<'a> BusyGuard<'a> {
    fn start(sender: Option<&'a watch::Sender<bool>>) -> Self {
        if let Some(tx) = sender {
            tx.send_replace(true);
        }
        BusyGuard(sender)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if let Some(tx) = self.0 {
            tx.send_replace(false);
        }
    }
}

pub struct Reconciler {
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteStore>,
    office_detection: OfficeChangeDetection,
    busy: Option<watch::Sender<bool>>,
}

impl Reconciler {
    pub fn new(local: Arc<dyn LocalStore>, remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            local,
            remote,
            office_detection: OfficeChangeDetection::default(),
            busy: None,
        }
    }

    /// Reconciler configured from a [`SyncConfig`]
    pub fn from_config(
        local: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteStore>,
        config: &SyncConfig,
    ) -> Self {
        Self::new(local, remote).with_office_detection(config.office_detection)
    }

    /// Publish `true`/`false` on `tx` while a pass is running
    #[must_use]
    pub fn with_busy_signal(mut self, tx: watch::Sender<bool>) -> Self {
        self.busy = Some(tx);
        self
    }

    #[must_use]
    pub fn with_office_detection(mut self, mode: OfficeChangeDetection) -> Self {
        self.office_detection = mode;
        self
    }

    /// Run once unless `flag` is already set. The returned flag is always
    /// set, even when individual collections failed.
    pub async fn run(&self, flag: MigrationFlag) -> ReconcileOutcome {
        if flag.is_set() {
            tracing::debug!("Local data already migrated, skipping");
            return ReconcileOutcome { flag, report: None };
        }
        let report = self.reconcile().await;
        ReconcileOutcome {
            flag: MigrationFlag::MIGRATED,
            report: Some(report),
        }
    }

    /// [`Reconciler::run`] with the flag read from and written back to the
    /// Local Store
    pub async fn run_persisted(&self) -> ReconcileOutcome {
        let flag = MigrationFlag::load(self.local.as_ref());
        let outcome = self.run(flag).await;
        if outcome.report.is_some() {
            outcome.flag.store(self.local.as_ref());
        }
        outcome
    }

    /// One unguarded reconciliation pass
    pub async fn reconcile(&self) -> ReconcileReport {
        let _busy = BusyGuard::start(self.busy.as_ref());
        let mut report = ReconcileReport::new(Utc::now());
        tracing::info!("Reconciling local data with server");

        let (inward, outward, attendance, tasks, profile, offices) = tokio::join!(
            self.remote.list_registers(RegisterKind::Inward),
            self.remote.list_registers(RegisterKind::Outward),
            self.remote.get_attendance(),
            self.remote.list_tasks(),
            self.remote.get_profile(),
            self.remote.get_offices(),
        );

        self.reconcile_registers(RegisterKind::Inward, inward, &mut report.inward)
            .await;
        self.reconcile_registers(RegisterKind::Outward, outward, &mut report.outward)
            .await;
        self.reconcile_attendance(attendance, &mut report.attendance)
            .await;
        self.reconcile_tasks(tasks, &mut report.tasks).await;
        self.reconcile_profile(profile, &mut report.profile).await;
        self.reconcile_offices(offices, &mut report.offices).await;

        report.finished_at = Utc::now();
        report.log_summary();
        tracing::info!(
            created = report.total_created(),
            failed = report.total_failed(),
            "Reconciliation finished"
        );
        report
    }

    async fn reconcile_registers(
        &self,
        kind: RegisterKind,
        remote: SyncResult<Vec<RegisterEntry>>,
        outcome: &mut CollectionOutcome,
    ) {
        let Some(remote) = fetched(kind.as_str(), remote, outcome) else {
            return;
        };
        let mut known: HashSet<String> = remote.iter().map(RegisterEntry::file_no_key).collect();
        let local: Vec<Value> = self.local.get_or(kind.collection().local_key(), Vec::new());

        for raw in &local {
            let entry = match plan_register(kind, raw, &known) {
                Ok(entry) => entry,
                Err(reason) => {
                    tracing::debug!(register = %kind, %reason, "Skipping local entry");
                    outcome.skipped += 1;
                    continue;
                }
            };

            match self.remote.create_register(kind, &entry).await {
                Ok(_) => {
                    tracing::debug!(register = %kind, file_no = %entry.file_no, "Created");
                    known.insert(file_no_key(&entry.file_no));
                    outcome.created += 1;
                }
                Err(e) => {
                    redacted_warn!("Failed to create {} entry {}: {}", kind, entry.file_no, e);
                    outcome.record_failure(format!("{}: {e}", entry.file_no));
                }
            }
        }
    }

    async fn reconcile_attendance(
        &self,
        remote: SyncResult<AttendanceMap>,
        outcome: &mut CollectionOutcome,
    ) {
        let Some(remote) = fetched("attendance", remote, outcome) else {
            return;
        };
        let local: Map<String, Value> = self.local.get_or(keys::ATTENDANCE, Map::new());

        for (date, record) in local {
            if !attendance_record_present(&record) {
                tracing::debug!(%date, "Skipping empty attendance record");
                outcome.skipped += 1;
                continue;
            }
            let existing = remote.get(&date);
            if existing == Some(&record) {
                outcome.skipped += 1;
                continue;
            }
            tracing::debug!(
                %date,
                kind = ?AttendanceRecord::from_value(&record).and_then(|r| r.kind),
                "Upserting attendance"
            );

            match self.remote.upsert_attendance(&date, &record).await {
                Ok(()) if existing.is_some() => outcome.updated += 1,
                Ok(()) => outcome.created += 1,
                Err(e) => {
                    redacted_warn!("Failed to upsert attendance for {}: {}", date, e);
                    outcome.record_failure(format!("{date}: {e}"));
                }
            }
        }
    }

    async fn reconcile_tasks(&self, remote: SyncResult<Vec<Task>>, outcome: &mut CollectionOutcome) {
        let Some(remote) = fetched("tasks", remote, outcome) else {
            return;
        };
        let mut ids: HashSet<String> = remote.iter().filter_map(|t| t.id.clone()).collect();
        let mut signatures: HashSet<TaskSignature> = remote.iter().map(Task::signature).collect();
        let local: Vec<Value> = self.local.get_or(keys::TASKS, Vec::new());

        for raw in local {
            let task: Task = match serde_json::from_value(raw) {
                Ok(task) => task,
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping malformed task");
                    outcome.skipped += 1;
                    continue;
                }
            };
            let signature = task.signature();
            if task.id.as_ref().is_some_and(|id| ids.contains(id)) || signatures.contains(&signature)
            {
                outcome.skipped += 1;
                continue;
            }

            match self.remote.create_task(&task.to_new_task()).await {
                Ok(created) => {
                    tracing::debug!(title = %task.title, "Created task");
                    ids.extend(created.id);
                    signatures.insert(signature);
                    outcome.created += 1;
                }
                Err(e) => {
                    redacted_warn!("Failed to create task {}: {}", task.title, e);
                    outcome.record_failure(format!("{}: {e}", task.title));
                }
            }
        }
    }

    async fn reconcile_profile(&self, remote: SyncResult<Profile>, outcome: &mut CollectionOutcome) {
        let Some(remote) = fetched("profile", remote, outcome) else {
            return;
        };
        let Value::Object(fields) = self.local.get_or(keys::PROFILE, Value::Null) else {
            outcome.skipped += 1;
            return;
        };
        let local = Profile::from_fields(fields);

        if !profile_is_newer(&local, &remote) {
            outcome.skipped += 1;
            return;
        }
        match self.remote.save_profile(&local).await {
            Ok(_) => outcome.updated += 1,
            Err(e) => {
                redacted_warn!("Failed to save profile: {}", e);
                outcome.record_failure(e);
            }
        }
    }

    async fn reconcile_offices(
        &self,
        remote: SyncResult<Vec<String>>,
        outcome: &mut CollectionOutcome,
    ) {
        let Some(remote) = fetched("offices", remote, outcome) else {
            return;
        };
        let local: Vec<String> = self
            .local
            .get_or::<Vec<Value>>(keys::OFFICES, Vec::new())
            .iter()
            .map(office_name)
            .collect();
        let merged = merge_offices(&remote, &local);

        let changed = match self.office_detection {
            OfficeChangeDetection::LengthOnly => merged.len() != remote.len(),
            OfficeChangeDetection::FullEquality => merged != remote,
        };
        if !changed {
            outcome.skipped += 1;
            return;
        }
        match self.remote.save_offices(&merged).await {
            Ok(_) => outcome.updated += 1,
            Err(e) => {
                redacted_warn!("Failed to save offices: {}", e);
                outcome.record_failure(e);
            }
        }
    }
}

/// Unwrap a fetch result, recording the failure on `outcome`
fn fetched<T>(
    collection: &str,
    result: SyncResult<T>,
    outcome: &mut CollectionOutcome,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(collection, error = %e, "Fetch failed, collection not merged");
            outcome.record_fetch_failure(e);
            None
        }
    }
}
