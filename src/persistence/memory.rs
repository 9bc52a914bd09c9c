//! In-process backend. Used when no API is configured, and by tests.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use super::HighlightBackend;
use crate::overlay::{
    Highlight, HighlightDraft, HighlightId, HighlightPatch, PersistenceError,
};

#[derive(Default)]
struct MemoryState {
    records: BTreeMap<String, Highlight>,
    next_id: u64,
    /// Errors returned by the next calls, oldest first.
    failures: VecDeque<PersistenceError>,
}

#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call fail with `error`. Queues up when called repeatedly.
    pub fn fail_next(&self, error: PersistenceError) {
        self.lock().failures.push_back(error);
    }

    /// Insert a record as if it had been created earlier.
    pub fn seed(&self, highlight: Highlight) {
        let id = highlight.id.to_string();
        self.lock().records.insert(id, highlight);
    }

    pub fn get(&self, id: &str) -> Option<Highlight> {
        self.lock().records.get(id).cloned()
    }

    pub fn count(&self) -> usize {
        self.lock().records.len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin(&self) -> Result<MutexGuard<'_, MemoryState>, PersistenceError> {
        let mut state = self.lock();
        match state.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }
}

impl HighlightBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn create(&self, draft: &HighlightDraft) -> Result<String, PersistenceError> {
        let mut state = self.begin()?;
        state.next_id += 1;
        let id = format!("mem-{}", state.next_id);
        let highlight = draft
            .clone()
            .into_highlight(HighlightId::Server(id.clone()));
        state.records.insert(id.clone(), highlight);
        Ok(id)
    }

    fn update(&self, id: &str, patch: &HighlightPatch) -> Result<(), PersistenceError> {
        let mut state = self.begin()?;
        let record = state
            .records
            .get_mut(id)
            .ok_or_else(|| PersistenceError::Status {
                status: 404,
                message: "Location not found".to_string(),
            })?;
        patch.apply_to(record);
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        let mut state = self.begin()?;
        state.records.remove(id);
        Ok(())
    }

    fn list(&self, document_id: &str) -> Result<Vec<Highlight>, PersistenceError> {
        let state = self.begin()?;
        Ok(state
            .records
            .values()
            .filter(|h| h.document_id == document_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::HighlightRect;

    fn draft(document_id: &str) -> HighlightDraft {
        HighlightDraft {
            document_id: document_id.into(),
            page_number: 1,
            rect: HighlightRect::new(50.0, 50.0, 10.0, 5.0),
            color: "#FFFF00".into(),
            owner_ref: None,
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let backend = MemoryBackend::new();
        let a = backend.create(&draft("doc")).unwrap();
        let b = backend.create(&draft("doc")).unwrap();
        assert_ne!(a, b);
        assert_eq!(backend.count(), 2);
    }

    #[test]
    fn test_list_filters_by_document() {
        let backend = MemoryBackend::new();
        backend.create(&draft("a")).unwrap();
        backend.create(&draft("b")).unwrap();
        backend.create(&draft("a")).unwrap();
        assert_eq!(backend.list("a").unwrap().len(), 2);
        assert!(backend.list("c").unwrap().is_empty());
    }

    #[test]
    fn test_update_missing_record_is_404() {
        let backend = MemoryBackend::new();
        let result = backend.update("nope", &HighlightPatch::default());
        assert!(matches!(result, Err(PersistenceError::Status { status: 404, .. })));
    }

    #[test]
    fn test_delete_missing_record_succeeds() {
        let backend = MemoryBackend::new();
        assert!(backend.delete("nope").is_ok());
    }

    #[test]
    fn test_failures_are_consumed_in_order() {
        let backend = MemoryBackend::new();
        backend.fail_next(PersistenceError::Network("one".into()));
        backend.fail_next(PersistenceError::Rejected("two".into()));

        assert_eq!(
            backend.create(&draft("doc")),
            Err(PersistenceError::Network("one".into()))
        );
        assert_eq!(
            backend.list("doc"),
            Err(PersistenceError::Rejected("two".into()))
        );
        assert!(backend.create(&draft("doc")).is_ok());
    }

    #[test]
    fn test_seed_is_listed() {
        let backend = MemoryBackend::new();
        backend.seed(draft("doc").into_highlight(HighlightId::Server("s1".into())));
        assert_eq!(backend.list("doc").unwrap()[0].id.to_string(), "s1");
    }
}
