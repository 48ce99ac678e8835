//! Form snapshot cache.
//!
//! A form's state outlives the sheet that shows it: on close the owner
//! saves a snapshot, on reopen it restores one. Snapshots are stored
//! serialized, so a store can be swapped for a persistent one without
//! touching callers.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{FormVariant, ImportedEntry, ReportSection};
use crate::pipeline::report::{PatientDetails, SectionMap};
use crate::pipeline::risk::RiskGrading;

/// Serializable copy of one form's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSnapshot {
    pub form_id: Uuid,
    pub variant: FormVariant,
    pub sections: SectionMap,
    pub entries: BTreeMap<ReportSection, Vec<ImportedEntry>>,
    pub risk_grading: RiskGrading,
    pub patient_details: PatientDetails,
    pub saved_at: DateTime<Utc>,
}

/// Errors from snapshot store operations.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Snapshot store lock poisoned")]
    LockPoisoned,
}

/// Caller-owned snapshot storage keyed by form id.
pub trait SnapshotStore: Send + Sync {
    fn save(&self, snapshot: &FormSnapshot) -> Result<(), SnapshotError>;

    fn load(&self, form_id: &Uuid) -> Result<Option<FormSnapshot>, SnapshotError>;

    /// Drop a snapshot. Returns whether one existed.
    fn remove(&self, form_id: &Uuid) -> Result<bool, SnapshotError>;
}

/// Process-lifetime store holding snapshots as JSON.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshots: Mutex<HashMap<Uuid, String>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every snapshot.
    pub fn clear(&self) -> Result<(), SnapshotError> {
        self.snapshots
            .lock()
            .map_err(|_| SnapshotError::LockPoisoned)?
            .clear();
        Ok(())
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn save(&self, snapshot: &FormSnapshot) -> Result<(), SnapshotError> {
        let json = serde_json::to_string(snapshot)?;
        self.snapshots
            .lock()
            .map_err(|_| SnapshotError::LockPoisoned)?
            .insert(snapshot.form_id, json);
        tracing::debug!(form_id = %snapshot.form_id, "Form snapshot saved");
        Ok(())
    }

    fn load(&self, form_id: &Uuid) -> Result<Option<FormSnapshot>, SnapshotError> {
        let guard = self.snapshots.lock().map_err(|_| SnapshotError::LockPoisoned)?;
        match guard.get(form_id) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn remove(&self, form_id: &Uuid) -> Result<bool, SnapshotError> {
        let mut guard = self.snapshots.lock().map_err(|_| SnapshotError::LockPoisoned)?;
        Ok(guard.remove(form_id).is_some())
    }
}
