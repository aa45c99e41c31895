//! Reconciliation outcome reporting

use crate::models::Collection;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result counters for one collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionOutcome {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    /// The remote fetch failed, so the collection was not merged
    pub fetch_failed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl CollectionOutcome {
    pub fn record_failure(&mut self, error: impl ToString) {
        self.failed += 1;
        self.errors.push(error.to_string());
    }

    pub fn record_fetch_failure(&mut self, error: impl ToString) {
        self.fetch_failed = true;
        self.errors.push(error.to_string());
    }

    /// Number of write calls issued to the Remote Store
    pub fn writes(&self) -> usize {
        self.created + self.updated + self.failed
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0 && !self.fetch_failed
    }
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub inward: CollectionOutcome,
    pub outward: CollectionOutcome,
    pub attendance: CollectionOutcome,
    pub tasks: CollectionOutcome,
    pub profile: CollectionOutcome,
    pub offices: CollectionOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ReconcileReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            inward: CollectionOutcome::default(),
            outward: CollectionOutcome::default(),
            attendance: CollectionOutcome::default(),
            tasks: CollectionOutcome::default(),
            profile: CollectionOutcome::default(),
            offices: CollectionOutcome::default(),
            started_at,
            finished_at: started_at,
        }
    }

    pub fn outcome(&self, collection: Collection) -> &CollectionOutcome {
        match collection {
            Collection::Inward => &self.inward,
            Collection::Outward => &self.outward,
            Collection::Attendance => &self.attendance,
            Collection::Tasks => &self.tasks,
            Collection::Profile => &self.profile,
            Collection::Offices => &self.offices,
        }
    }

    pub fn outcome_mut(&mut self, collection: Collection) -> &mut CollectionOutcome {
        match collection {
            Collection::Inward => &mut self.inward,
            Collection::Outward => &mut self.outward,
            Collection::Attendance => &mut self.attendance,
            Collection::Tasks => &mut self.tasks,
            Collection::Profile => &mut self.profile,
            Collection::Offices => &mut self.offices,
        }
    }

    pub fn total_created(&self) -> usize {
        Collection::ALL.iter().map(|c| self.outcome(*c).created).sum()
    }

    pub fn total_failed(&self) -> usize {
        Collection::ALL.iter().map(|c| self.outcome(*c).failed).sum()
    }

    pub fn is_clean(&self) -> bool {
        Collection::ALL.iter().all(|c| self.outcome(*c).is_clean())
    }

    /// One `info!` line per collection, `warn!` when anything failed
    pub fn log_summary(&self) {
        for collection in Collection::ALL {
            let outcome = self.outcome(collection);
            if outcome.is_clean() {
                tracing::info!(
                    collection = %collection,
                    created = outcome.created,
                    updated = outcome.updated,
                    skipped = outcome.skipped,
                    "Collection reconciled"
                );
            } else {
                tracing::warn!(
                    collection = %collection,
                    created = outcome.created,
                    updated = outcome.updated,
                    skipped = outcome.skipped,
                    failed = outcome.failed,
                    fetch_failed = outcome.fetch_failed,
                    "Collection reconciled with errors"
                );
            }
        }
    }
}
