use std::collections::BTreeMap;
#[cfg(test)]
use std::collections::HashMap;
use std::path::PathBuf;
#[cfg(test)]
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Snapshot of an in-progress attempt, keyed by assignment id. A draft is
/// only removed once the server has confirmed the submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SessionDraft {
    pub(crate) assignment_id: String,
    pub(crate) answers: BTreeMap<String, Vec<String>>,
    pub(crate) current_idx: usize,
    pub(crate) question_order: Vec<String>,
    pub(crate) remaining_seconds: u64,
    pub(crate) violation_count: u32,
    pub(crate) saved_at: i64,
}

pub(crate) trait DraftStore {
    /// Returns the stored draft, or None when absent or malformed.
    fn load(&self, assignment_id: &str) -> Option<SessionDraft>;
    fn save(&self, draft: &SessionDraft);
    fn remove(&self, assignment_id: &str);
}

/// One JSON file per assignment id under a local directory.
pub(crate) struct FileDraftStore {
    dir: PathBuf,
}

impl FileDraftStore {
    pub(crate) fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self, assignment_id: &str) -> PathBuf {
        self.dir.join(format!("attempt-{assignment_id}.json"))
    }
}

impl DraftStore for FileDraftStore {
    fn load(&self, assignment_id: &str) -> Option<SessionDraft> {
        let raw = std::fs::read_to_string(self.path(assignment_id)).ok()?;
        serde_json::from_str(&raw).ok()
    }

    fn save(&self, draft: &SessionDraft) {
        if let Err(err) = std::fs::create_dir_all(&self.dir) {
            tracing::warn!(error = %err, "failed to create draft directory");
            return;
        }
        match serde_json::to_string(draft) {
            Ok(raw) => {
                if let Err(err) = std::fs::write(self.path(&draft.assignment_id), raw) {
                    tracing::warn!(error = %err, "failed to persist draft");
                }
            }
            Err(err) => tracing::warn!(error = %err, "failed to serialize draft"),
        }
    }

    fn remove(&self, assignment_id: &str) {
        let _ = std::fs::remove_file(self.path(assignment_id));
    }
}

/// In-memory store for tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemoryDraftStore {
    entries: Mutex<HashMap<String, String>>,
}

#[cfg(test)]
impl MemoryDraftStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_raw(&self, assignment_id: &str, raw: &str) {
        self.entries.lock().unwrap().insert(assignment_id.to_string(), raw.to_string());
    }

    pub(crate) fn contains(&self, assignment_id: &str) -> bool {
        self.entries.lock().unwrap().contains_key(assignment_id)
    }
}

#[cfg(test)]
impl DraftStore for MemoryDraftStore {
    fn load(&self, assignment_id: &str) -> Option<SessionDraft> {
        let entries = self.entries.lock().unwrap();
        let raw = entries.get(assignment_id)?;
        serde_json::from_str(raw).ok()
    }

    fn save(&self, draft: &SessionDraft) {
        if let Ok(raw) = serde_json::to_string(draft) {
            self.entries.lock().unwrap().insert(draft.assignment_id.clone(), raw);
        }
    }

    fn remove(&self, assignment_id: &str) {
        self.entries.lock().unwrap().remove(assignment_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(assignment_id: &str) -> SessionDraft {
        SessionDraft {
            assignment_id: assignment_id.to_string(),
            answers: BTreeMap::from([("q1".to_string(), vec!["a".to_string()])]),
            current_idx: 2,
            question_order: vec!["q1".into(), "q2".into(), "q3".into()],
            remaining_seconds: 120,
            violation_count: 1,
            saved_at: 1_700_000_000,
        }
    }

    #[test]
    fn file_store_roundtrip_and_remove() {
        let dir = std::env::temp_dir().join(format!("draft-{}", uuid::Uuid::new_v4()));
        let store = FileDraftStore::new(dir.clone());

        let d = draft("a1");
        store.save(&d);
        assert_eq!(store.load("a1"), Some(d));

        store.remove("a1");
        assert_eq!(store.load("a1"), None);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn malformed_draft_loads_as_none() {
        let store = MemoryDraftStore::new();
        store.insert_raw("a1", "{not json");
        assert_eq!(store.load("a1"), None);

        store.insert_raw("a1", r#"{"unexpected": true}"#);
        assert_eq!(store.load("a1"), None);
    }
}
