//! Toolkit-neutral pointer events.
//!
//! The host translates its own input (Bevy mouse buttons, DOM events, ...) into
//! these before handing them to the engine.

use super::geometry::{Corner, PixelPoint};
use super::highlight::HighlightId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    /// Pointer left the page surface or the window lost focus. Finishes the
    /// current gesture like `Up`.
    Leave,
    /// Explicit abort (Escape). Reverts the current gesture.
    Cancel,
}

/// What the pointer is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerTarget {
    /// Page surface with no highlight under the pointer.
    Canvas,
    /// Body of a highlight.
    Body(HighlightId),
    /// Corner resize handle of a highlight.
    Handle(HighlightId, Corner),
}

impl PointerTarget {
    pub fn highlight_id(&self) -> Option<&HighlightId> {
        match self {
            PointerTarget::Canvas => None,
            PointerTarget::Body(id) | PointerTarget::Handle(id, _) => Some(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    /// Position in container pixels.
    pub position: PixelPoint,
    /// Pre-resolved target; when `None` the engine hit-tests `position`.
    pub target: Option<PointerTarget>,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, x: f32, y: f32) -> Self {
        Self {
            kind,
            position: PixelPoint::new(x, y),
            target: None,
        }
    }

    pub fn down(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Down, x, y)
    }

    pub fn moved(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Move, x, y)
    }

    pub fn up(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Up, x, y)
    }

    pub fn leave(x: f32, y: f32) -> Self {
        Self::new(PointerKind::Leave, x, y)
    }

    pub fn cancel() -> Self {
        Self::new(PointerKind::Cancel, 0.0, 0.0)
    }

    pub fn with_target(mut self, target: PointerTarget) -> Self {
        self.target = Some(target);
        self
    }
}
