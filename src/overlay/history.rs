//! Bounded undo/redo log for highlight mutations.
//!
//! Entries are recorded only after the backend confirmed the mutation. Each
//! entry keeps enough state to apply its inverse (undo) and to re-apply it
//! (redo).

use std::collections::VecDeque;

use super::highlight::{Highlight, HighlightId};

/// Default number of entries kept on the undo stack.
pub const DEFAULT_UNDO_CAPACITY: usize = 20;

/// A committed, reversible highlight mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoEntry {
    /// A highlight was created; undo deletes it.
    Create { highlight: Highlight },
    /// A highlight was deleted; undo re-creates it from `prior`.
    Delete { prior: Highlight },
    /// A highlight was moved/resized/recolored; undo restores `prior`.
    Update { prior: Highlight, next: Highlight },
}

impl UndoEntry {
    pub fn highlight_id(&self) -> &HighlightId {
        match self {
            UndoEntry::Create { highlight } => &highlight.id,
            UndoEntry::Delete { prior } => &prior.id,
            UndoEntry::Update { prior, .. } => &prior.id,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UndoEntry::Create { .. } => "create",
            UndoEntry::Delete { .. } => "delete",
            UndoEntry::Update { .. } => "update",
        }
    }

    /// Point the entry at `new` wherever it referenced `old`.
    pub fn rebind(&mut self, old: &HighlightId, new: &HighlightId) {
        let records: Vec<&mut Highlight> = match self {
            UndoEntry::Create { highlight } => vec![highlight],
            UndoEntry::Delete { prior } => vec![prior],
            UndoEntry::Update { prior, next } => vec![prior, next],
        };
        for record in records {
            if &record.id == old {
                record.id = new.clone();
            }
        }
    }
}

/// Undo and redo stacks, each capped at `capacity` (oldest dropped first).
#[derive(Debug, Clone)]
pub struct UndoLog {
    /// Most recent last.
    undo_stack: VecDeque<UndoEntry>,
    /// Most recent last.
    redo_stack: VecDeque<UndoEntry>,
    capacity: usize,
}

impl Default for UndoLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_UNDO_CAPACITY)
    }
}

impl UndoLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            undo_stack: VecDeque::with_capacity(capacity),
            redo_stack: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a new mutation. Clears the redo stack.
    pub fn record(&mut self, entry: UndoEntry) {
        self.redo_stack.clear();
        Self::push_bounded(&mut self.undo_stack, entry, self.capacity);
    }

    /// Return an entry to the undo stack without touching redo (after a redo
    /// succeeded, or an undo failed).
    pub fn push_undo(&mut self, entry: UndoEntry) {
        Self::push_bounded(&mut self.undo_stack, entry, self.capacity);
    }

    pub fn push_redo(&mut self, entry: UndoEntry) {
        Self::push_bounded(&mut self.redo_stack, entry, self.capacity);
    }

    pub fn pop_undo(&mut self) -> Option<UndoEntry> {
        self.undo_stack.pop_back()
    }

    pub fn pop_redo(&mut self) -> Option<UndoEntry> {
        self.redo_stack.pop_back()
    }

    pub fn peek_undo(&self) -> Option<&UndoEntry> {
        self.undo_stack.back()
    }

    pub fn peek_redo(&self) -> Option<&UndoEntry> {
        self.redo_stack.back()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Rewrite every entry that references `old` (server-assigned id after a
    /// re-create).
    pub fn rebind(&mut self, old: &HighlightId, new: &HighlightId) {
        for entry in self.undo_stack.iter_mut().chain(self.redo_stack.iter_mut()) {
            entry.rebind(old, new);
        }
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn push_bounded(stack: &mut VecDeque<UndoEntry>, entry: UndoEntry, capacity: usize) {
        while stack.len() >= capacity {
            stack.pop_front();
        }
        stack.push_back(entry);
    }
}
