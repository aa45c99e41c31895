//! Local-to-server data migration for My Desk
//!
//! A client keeps its collections (inward and outward registers,
//! attendance, tasks, profile, office list) in a key-value Local Store. The
//! [`Reconciler`] pushes every record that exists only locally to the record
//! server, per collection, without duplicating entries and without
//! overwriting newer server data.
//!
//! Provides:
//! - [`LocalStore`] with in-memory, directory and export-snapshot backends
//! - [`RemoteStore`] with an HTTP client and an in-memory implementation
//! - [`Reconciler`] and its per-collection [`ReconcileReport`]
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mydesk_sync::{HttpRemoteStore, MemoryLocalStore, Reconciler, SyncConfig};
//!
//! # async fn example() -> mydesk_sync::SyncResult<()> {
//! let remote = HttpRemoteStore::new(&SyncConfig::from_env()?)?;
//! let reconciler = Reconciler::new(Arc::new(MemoryLocalStore::new()), Arc::new(remote));
//! let outcome = reconciler.run_persisted().await;
//! assert!(outcome.flag.is_set());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod local_store;
pub mod memory_remote;
pub mod models;
pub mod reconciler;
pub mod remote_store;
pub mod report;

pub use config::{OfficeChangeDetection, SyncConfig};
pub use error::{SyncError, SyncResult};
pub use http::HttpRemoteStore;
pub use local_store::{
    keys, FileLocalStore, LocalStore, LocalStoreExt, MemoryLocalStore, SnapshotLocalStore,
};
pub use memory_remote::{MemoryRemoteStore, RemoteCall};
pub use models::{
    attendance_record_present, merge_offices, normalize_offices, profile_is_newer, task_signature,
    AttendanceKind,
    AttendanceMap, AttendanceRecord, Collection, DocumentDescriptor, NewRegisterEntry, NewTask,
    Profile, RegisterEntry, RegisterKind, RegisterPatch, Task, TaskPriority, TaskStatus,
};
pub use reconciler::{plan_register, MigrationFlag, ReconcileOutcome, Reconciler, SkipReason};
pub use remote_store::RemoteStore;
pub use report::{CollectionOutcome, ReconcileReport};
