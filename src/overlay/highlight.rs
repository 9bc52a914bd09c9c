//! The highlight record and its identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::geometry::HighlightRect;

/// Identifier of a highlight within one document.
///
/// Highlights drawn locally carry a `Local` id until the backend answers the
/// create call with a server id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HighlightId {
    Local(u64),
    Server(String),
}

impl HighlightId {
    pub fn is_local(&self) -> bool {
        matches!(self, HighlightId::Local(_))
    }

    /// The id understood by the backend, if the highlight has been persisted.
    pub fn server_id(&self) -> Option<&str> {
        match self {
            HighlightId::Server(id) => Some(id),
            HighlightId::Local(_) => None,
        }
    }
}

impl fmt::Display for HighlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HighlightId::Local(n) => write!(f, "local-{}", n),
            HighlightId::Server(id) => f.write_str(id),
        }
    }
}

/// A rectangular marker anchored to a document page.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub id: HighlightId,
    pub document_id: String,
    /// 1-indexed.
    pub page_number: u32,
    pub rect: HighlightRect,
    pub color: String,
    /// Caller-owned reference (e.g. a study node); never interpreted here.
    pub owner_ref: Option<String>,
}

impl Highlight {
    /// Everything but the id, as sent to the backend on create.
    pub fn draft(&self) -> HighlightDraft {
        HighlightDraft {
            document_id: self.document_id.clone(),
            page_number: self.page_number,
            rect: self.rect,
            color: self.color.clone(),
            owner_ref: self.owner_ref.clone(),
        }
    }

    pub fn with_id(self, id: HighlightId) -> Self {
        Self { id, ..self }
    }

    /// Fields of `self` that differ from `other`, as a partial update.
    pub fn patch_from(&self, other: &Highlight) -> HighlightPatch {
        HighlightPatch {
            page_number: (self.page_number != other.page_number).then_some(self.page_number),
            rect: (!self.rect.approx_eq(&other.rect)).then_some(self.rect),
            color: (self.color != other.color).then(|| self.color.clone()),
        }
    }

    /// True when page, geometry and color all match.
    pub fn same_content(&self, other: &Highlight) -> bool {
        self.page_number == other.page_number
            && self.rect.approx_eq(&other.rect)
            && self.color == other.color
    }
}

/// Highlight content without an id, sent on create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightDraft {
    pub document_id: String,
    pub page_number: u32,
    pub rect: HighlightRect,
    pub color: String,
    pub owner_ref: Option<String>,
}

impl HighlightDraft {
    pub fn into_highlight(self, id: HighlightId) -> Highlight {
        Highlight {
            id,
            document_id: self.document_id,
            page_number: self.page_number,
            rect: self.rect,
            color: self.color,
            owner_ref: self.owner_ref,
        }
    }
}

/// Partial update; `None` fields are left untouched by the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HighlightPatch {
    pub page_number: Option<u32>,
    pub rect: Option<HighlightRect>,
    pub color: Option<String>,
}

impl HighlightPatch {
    pub fn is_empty(&self) -> bool {
        self.page_number.is_none() && self.rect.is_none() && self.color.is_none()
    }

    /// Apply the patch to a highlight in place.
    pub fn apply_to(&self, highlight: &mut Highlight) {
        if let Some(page) = self.page_number {
            highlight.page_number = page;
        }
        if let Some(rect) = self.rect {
            highlight.rect = rect;
        }
        if let Some(color) = &self.color {
            highlight.color = color.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Highlight {
        Highlight {
            id: HighlightId::Server("abc".into()),
            document_id: "doc".into(),
            page_number: 2,
            rect: HighlightRect::new(50.0, 50.0, 10.0, 5.0),
            color: "#FFFF00".into(),
            owner_ref: Some("node-1".into()),
        }
    }

    #[test]
    fn test_id_display() {
        assert_eq!(HighlightId::Local(7).to_string(), "local-7");
        assert_eq!(HighlightId::Server("f00".into()).to_string(), "f00");
        assert!(HighlightId::Local(1).is_local());
        assert_eq!(HighlightId::Server("x".into()).server_id(), Some("x"));
        assert_eq!(HighlightId::Local(1).server_id(), None);
    }

    #[test]
    fn test_patch_only_carries_changes() {
        let before = sample();
        let mut after = before.clone();
        after.rect.center_x = 60.0;

        let patch = after.patch_from(&before);
        assert_eq!(patch.rect, Some(after.rect));
        assert!(patch.page_number.is_none());
        assert!(patch.color.is_none());
        assert!(before.patch_from(&before).is_empty());
    }

    #[test]
    fn test_patch_apply() {
        let mut highlight = sample();
        let patch = HighlightPatch {
            color: Some("#FF0000".into()),
            ..Default::default()
        };
        patch.apply_to(&mut highlight);
        assert_eq!(highlight.color, "#FF0000");
        assert_eq!(highlight.rect, sample().rect);
    }

    #[test]
    fn test_draft_round_trip_keeps_content() {
        let highlight = sample();
        let restored = highlight.draft().into_highlight(HighlightId::Local(3));
        assert!(restored.same_content(&highlight));
        assert_eq!(restored.owner_ref, highlight.owner_ref);
        assert_eq!(restored.id, HighlightId::Local(3));
    }
}
