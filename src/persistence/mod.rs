//! Durable storage for highlights.
//!
//! The engine only produces [`PersistCall`]s; a [`HighlightBackend`] executes
//! them. [`HttpBackend`] talks to the highlight API, [`MemoryBackend`] keeps
//! records in process (offline mode and tests).

mod http;
mod memory;
mod wire;

pub use http::HttpBackend;
pub use memory::MemoryBackend;

use crate::overlay::{
    Highlight, HighlightDraft, HighlightPatch, PersistCall, PersistReply, PersistenceError,
};

/// Create / update / delete / list highlight records.
///
/// Implementations block; callers run them on a task pool.
pub trait HighlightBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Store a new record and return its server-assigned id.
    fn create(&self, draft: &HighlightDraft) -> Result<String, PersistenceError>;

    /// Partial update; the id is preserved.
    fn update(&self, id: &str, patch: &HighlightPatch) -> Result<(), PersistenceError>;

    /// Delete a record. Deleting a missing record succeeds.
    fn delete(&self, id: &str) -> Result<(), PersistenceError>;

    /// All records of one document.
    fn list(&self, document_id: &str) -> Result<Vec<Highlight>, PersistenceError>;
}

/// Run one engine request against a backend.
pub fn execute(
    backend: &dyn HighlightBackend,
    call: &PersistCall,
) -> Result<PersistReply, PersistenceError> {
    match call {
        PersistCall::Create(draft) => backend.create(draft).map(PersistReply::Created),
        PersistCall::Update { id, patch } => {
            backend.update(id, patch).map(|_| PersistReply::Done)
        }
        PersistCall::Delete { id } => backend.delete(id).map(|_| PersistReply::Done),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::HighlightRect;

    fn draft() -> HighlightDraft {
        HighlightDraft {
            document_id: "doc".into(),
            page_number: 1,
            rect: HighlightRect::new(50.0, 50.0, 10.0, 5.0),
            color: "#FFFF00".into(),
            owner_ref: None,
        }
    }

    #[test]
    fn test_execute_maps_replies() {
        let backend = MemoryBackend::new();
        let created = execute(&backend, &PersistCall::Create(draft())).unwrap();
        let PersistReply::Created(id) = created else {
            panic!("expected a created reply");
        };

        let patch = HighlightPatch {
            color: Some("#FF0000".into()),
            ..Default::default()
        };
        let updated = execute(
            &backend,
            &PersistCall::Update {
                id: id.clone(),
                patch,
            },
        );
        assert_eq!(updated, Ok(PersistReply::Done));
        assert_eq!(backend.get(&id).unwrap().color, "#FF0000");

        let deleted = execute(&backend, &PersistCall::Delete { id });
        assert_eq!(deleted, Ok(PersistReply::Done));
        assert_eq!(backend.count(), 0);
    }

    #[test]
    fn test_execute_propagates_errors() {
        let backend = MemoryBackend::new();
        backend.fail_next(PersistenceError::Network("down".into()));
        let result = execute(&backend, &PersistCall::Create(draft()));
        assert!(matches!(result, Err(PersistenceError::Network(_))));
    }
}
