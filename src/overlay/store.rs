//! In-memory projection of the highlights of the open document.

use std::collections::HashMap;

use super::highlight::{Highlight, HighlightId};

/// Highlights of one document keyed by id. No persistence side effects.
#[derive(Debug, Default, Clone)]
pub struct HighlightStore {
    highlights: HashMap<HighlightId, Highlight>,
}

impl HighlightStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by id, returning the previous record.
    pub fn upsert(&mut self, highlight: Highlight) -> Option<Highlight> {
        self.highlights.insert(highlight.id.clone(), highlight)
    }

    pub fn remove(&mut self, id: &HighlightId) -> Option<Highlight> {
        self.highlights.remove(id)
    }

    pub fn by_id(&self, id: &HighlightId) -> Option<&Highlight> {
        self.highlights.get(id)
    }

    pub fn by_id_mut(&mut self, id: &HighlightId) -> Option<&mut Highlight> {
        self.highlights.get_mut(id)
    }

    pub fn contains(&self, id: &HighlightId) -> bool {
        self.highlights.contains_key(id)
    }

    /// Highlights on `page_number`, in no particular order.
    pub fn by_page(&self, page_number: u32) -> impl Iterator<Item = &Highlight> {
        self.highlights
            .values()
            .filter(move |h| h.page_number == page_number)
    }

    /// Highlights on `page_number` in draw order: stable by id, with the
    /// active highlight last so it renders above the others.
    pub fn paint_order(&self, page_number: u32, active: Option<&HighlightId>) -> Vec<&Highlight> {
        let mut page: Vec<&Highlight> = self.by_page(page_number).collect();
        page.sort_by(|a, b| {
            let a_active = Some(&a.id) == active;
            let b_active = Some(&b.id) == active;
            a_active.cmp(&b_active).then_with(|| a.id.cmp(&b.id))
        });
        page
    }

    /// Move a record to a new id (local id replaced by the server id).
    pub fn rekey(&mut self, old: &HighlightId, new: HighlightId) -> bool {
        match self.highlights.remove(old) {
            Some(highlight) => {
                self.highlights
                    .insert(new.clone(), highlight.with_id(new));
                true
            }
            None => false,
        }
    }

    pub fn replace_all(&mut self, highlights: impl IntoIterator<Item = Highlight>) {
        self.highlights = highlights
            .into_iter()
            .map(|h| (h.id.clone(), h))
            .collect();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Highlight> {
        self.highlights.values()
    }

    pub fn len(&self) -> usize {
        self.highlights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty()
    }

    pub fn clear(&mut self) {
        self.highlights.clear();
    }
}
