//! Per-job action status tracking.
//!
//! UI actions triggered against an asynchronous job (re-ingest, export, and
//! the like) record their lifecycle here so a reload can render "already
//! triggered" state instead of offering the action again. One JSON map is
//! persisted per job; entries are last-write-wins per action id.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::storage::SessionStorage;

const ACTION_STATUS_PREFIX: &str = "classweaver:action-status::";

/// Lifecycle state of a triggered action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Pending,
    Running,
    Completed,
}

/// One recorded action, keyed by `(job id, action id)` in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStatusEntry {
    pub status: ActionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Wall-clock write time in epoch milliseconds. Display/debugging only,
    /// never used for conflict resolution.
    pub updated_at: i64,
}

/// Tracker for per-job action status maps.
///
/// All operations are no-ops returning an empty or `None` result when the
/// job id (or action id, for writes) is absent, so callers never need to
/// guard. The whole per-job map is destroyed by [`clear`](Self::clear) or
/// expires with the storage scope.
#[derive(Clone)]
pub struct ActionStatusTracker {
    storage: Arc<dyn SessionStorage>,
}

impl ActionStatusTracker {
    /// Creates a tracker over the given storage.
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    fn storage_key(job_id: &str) -> String {
        format!("{ACTION_STATUS_PREFIX}{job_id}")
    }

    /// Returns the status map for a job. Absent job id, missing entry, and
    /// unparsable stored JSON all yield an empty map.
    pub fn get_map(&self, job_id: Option<&str>) -> HashMap<String, ActionStatusEntry> {
        let Some(job_id) = job_id.filter(|id| !id.is_empty()) else {
            return HashMap::new();
        };
        let Some(raw) = self.storage.get_item(&Self::storage_key(job_id)) else {
            return HashMap::new();
        };
        serde_json::from_str(&raw).unwrap_or_default()
    }

    /// Records a status for one action, overwriting any previous entry.
    ///
    /// Returns the written entry, or `None` when either id is absent (no
    /// persistence write happens in that case).
    pub fn set_status(
        &self,
        job_id: Option<&str>,
        action_id: Option<&str>,
        status: ActionStatus,
        note: Option<String>,
    ) -> Option<ActionStatusEntry> {
        let job_id = job_id.filter(|id| !id.is_empty())?;
        let action_id = action_id.filter(|id| !id.is_empty())?;

        let mut map = self.get_map(Some(job_id));
        let entry = ActionStatusEntry {
            status,
            note,
            updated_at: Utc::now().timestamp_millis(),
        };
        map.insert(action_id.to_string(), entry.clone());

        match serde_json::to_string(&map) {
            Ok(serialized) => {
                self.storage.set_item(&Self::storage_key(job_id), &serialized);
                debug!(job_id, action_id, ?status, "recorded action status");
                Some(entry)
            }
            Err(_) => None,
        }
    }

    /// Destroys the whole status map for a job.
    pub fn clear(&self, job_id: Option<&str>) {
        if let Some(job_id) = job_id.filter(|id| !id.is_empty()) {
            self.storage.remove_item(&Self::storage_key(job_id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn tracker() -> (ActionStatusTracker, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (ActionStatusTracker::new(storage.clone()), storage)
    }

    #[test]
    fn test_set_then_get_round_trip() {
        let (tracker, _storage) = tracker();
        let entry = tracker
            .set_status(Some("job-1"), Some("export"), ActionStatus::Running, None)
            .expect("entry written");
        assert_eq!(entry.status, ActionStatus::Running);

        let map = tracker.get_map(Some("job-1"));
        assert_eq!(map.len(), 1);
        assert_eq!(map["export"].status, ActionStatus::Running);
    }

    #[test]
    fn test_last_write_wins_per_action() {
        let (tracker, _storage) = tracker();
        tracker.set_status(Some("job-1"), Some("export"), ActionStatus::Pending, None);
        tracker.set_status(
            Some("job-1"),
            Some("export"),
            ActionStatus::Completed,
            Some("done".to_string()),
        );

        let map = tracker.get_map(Some("job-1"));
        assert_eq!(map.len(), 1);
        assert_eq!(map["export"].status, ActionStatus::Completed);
        assert_eq!(map["export"].note.as_deref(), Some("done"));
    }

    #[test]
    fn test_missing_ids_are_noops() {
        let (tracker, storage) = tracker();
        assert!(tracker
            .set_status(None, Some("export"), ActionStatus::Running, None)
            .is_none());
        assert!(tracker
            .set_status(Some("job-1"), None, ActionStatus::Running, None)
            .is_none());
        assert!(storage.is_empty());
        assert!(tracker.get_map(None).is_empty());
    }

    #[test]
    fn test_clear_destroys_map() {
        let (tracker, storage) = tracker();
        tracker.set_status(Some("job-1"), Some("export"), ActionStatus::Running, None);
        tracker.clear(Some("job-1"));
        assert!(tracker.get_map(Some("job-1")).is_empty());
        assert!(storage.is_empty());
        // Clearing an unknown job is a no-op
        tracker.clear(Some("job-2"));
        tracker.clear(None);
    }

    #[test]
    fn test_corrupt_stored_map_reads_as_empty() {
        let (tracker, storage) = tracker();
        storage.set_item("classweaver:action-status::job-1", "{not json");
        assert!(tracker.get_map(Some("job-1")).is_empty());
    }

    #[test]
    fn test_maps_are_scoped_per_job() {
        let (tracker, _storage) = tracker();
        tracker.set_status(Some("job-1"), Some("export"), ActionStatus::Running, None);
        tracker.set_status(Some("job-2"), Some("export"), ActionStatus::Completed, None);

        assert_eq!(
            tracker.get_map(Some("job-1"))["export"].status,
            ActionStatus::Running
        );
        assert_eq!(
            tracker.get_map(Some("job-2"))["export"].status,
            ActionStatus::Completed
        );
    }
}
