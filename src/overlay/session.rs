//! Interaction state machine.
//!
//! Turns pointer sequences (in page percentages) into live store mutations and
//! finished [`Gesture`]s. Persistence is not handled here; the engine decides
//! what to do with a finished gesture.

use tracing::debug;

use super::geometry::{Corner, HighlightRect, PagePoint, SizeLimits};
use super::highlight::{Highlight, HighlightId};
use super::pointer::{PointerKind, PointerTarget};
use super::store::HighlightStore;

/// Current gesture, if any.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    /// Provisional rectangle between `anchor` and `current`.
    Drawing { anchor: PagePoint, current: PagePoint },
    /// `grab_offset = pointer - center` at pointer-down; `origin` is the
    /// highlight before the gesture.
    Dragging {
        id: HighlightId,
        grab_offset: PagePoint,
        origin: Highlight,
    },
    /// `fixed` is the corner opposite the grabbed handle.
    Resizing {
        id: HighlightId,
        corner: Corner,
        fixed: PagePoint,
        origin: Highlight,
    },
}

impl InteractionMode {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionMode::Idle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            InteractionMode::Idle => "idle",
            InteractionMode::Drawing { .. } => "drawing",
            InteractionMode::Dragging { .. } => "dragging",
            InteractionMode::Resizing { .. } => "resizing",
        }
    }
}

/// A gesture that reached its end and should be committed.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// A draw gesture that met the size threshold.
    Drawn(HighlightRect),
    /// A drag or resize that changed the highlight.
    Edited { prior: Highlight, next: Highlight },
}

/// Inputs the state machine needs besides the event itself.
pub struct GestureContext<'a, F>
where
    F: Fn(&HighlightId) -> bool,
{
    pub store: &'a mut HighlightStore,
    pub page_number: u32,
    pub limits: SizeLimits,
    /// Minimum width and height (percent) for a draw gesture to commit.
    pub draw_threshold: f32,
    /// Highlights with a persistence call in flight cannot be grabbed.
    pub is_locked: F,
}

/// Per-viewer interaction state: current mode, active highlight and the
/// highlight-mode flag.
#[derive(Debug, Clone, Default)]
pub struct InteractionSession {
    mode: InteractionMode,
    active: Option<HighlightId>,
    highlight_mode: bool,
}

impl InteractionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    pub fn active(&self) -> Option<&HighlightId> {
        self.active.as_ref()
    }

    pub fn set_active(&mut self, id: Option<HighlightId>) {
        self.active = id;
    }

    pub fn highlight_mode(&self) -> bool {
        self.highlight_mode
    }

    /// Toggle drawing mode. Any gesture in progress is reverted first, and the
    /// selection is dropped when drawing is enabled.
    pub fn set_highlight_mode(&mut self, enabled: bool, store: &mut HighlightStore) {
        if self.highlight_mode == enabled {
            return;
        }
        self.cancel(store);
        self.highlight_mode = enabled;
        if enabled {
            self.active = None;
        }
    }

    /// Provisional rectangle while drawing.
    pub fn preview(&self) -> Option<HighlightRect> {
        match &self.mode {
            InteractionMode::Drawing { anchor, current } => {
                Some(HighlightRect::from_corners(*anchor, *current))
            }
            _ => None,
        }
    }

    /// Rewrite references after a highlight changed id.
    pub fn rebind(&mut self, old: &HighlightId, new: &HighlightId) {
        if self.active.as_ref() == Some(old) {
            self.active = Some(new.clone());
        }
        match &mut self.mode {
            InteractionMode::Dragging { id, origin, .. }
            | InteractionMode::Resizing { id, origin, .. }
                if *id == *old =>
            {
                *id = new.clone();
                origin.id = new.clone();
            }
            _ => {}
        }
    }

    /// Forget a highlight that left the store.
    pub fn forget(&mut self, id: &HighlightId) {
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
        let in_gesture = match &self.mode {
            InteractionMode::Dragging { id: current, .. }
            | InteractionMode::Resizing { id: current, .. } => current == id,
            _ => false,
        };
        if in_gesture {
            self.mode = InteractionMode::Idle;
        }
    }

    /// Abort the current gesture: drawings are discarded, drags and resizes
    /// are reverted to their origin. Always leaves the session Idle.
    pub fn cancel(&mut self, store: &mut HighlightStore) {
        match std::mem::take(&mut self.mode) {
            InteractionMode::Dragging { origin, .. } | InteractionMode::Resizing { origin, .. } => {
                if store.contains(&origin.id) {
                    store.upsert(origin);
                }
            }
            InteractionMode::Drawing { .. } | InteractionMode::Idle => {}
        }
    }

    /// Feed one pointer event. Returns a gesture when one completes.
    pub fn handle<F>(
        &mut self,
        kind: PointerKind,
        point: PagePoint,
        target: &PointerTarget,
        ctx: &mut GestureContext<'_, F>,
    ) -> Option<Gesture>
    where
        F: Fn(&HighlightId) -> bool,
    {
        match kind {
            PointerKind::Down => {
                self.pointer_down(point, target, ctx);
                None
            }
            PointerKind::Move => {
                self.pointer_move(point, ctx);
                None
            }
            PointerKind::Up | PointerKind::Leave => {
                // Leave finishes like Up; apply the last position first.
                self.pointer_move(point, ctx);
                self.finish(ctx)
            }
            PointerKind::Cancel => {
                self.cancel(ctx.store);
                None
            }
        }
    }

    fn pointer_down<F>(&mut self, point: PagePoint, target: &PointerTarget, ctx: &mut GestureContext<'_, F>)
    where
        F: Fn(&HighlightId) -> bool,
    {
        if !self.mode.is_idle() {
            // A second button press mid-gesture; keep the current gesture.
            return;
        }

        if self.highlight_mode {
            // Highlights are inert while drawing is enabled.
            let anchor = point.clamped();
            self.mode = InteractionMode::Drawing {
                anchor,
                current: anchor,
            };
            return;
        }

        match target {
            PointerTarget::Canvas => {
                self.active = None;
            }
            PointerTarget::Body(id) => {
                let page = ctx.page_number;
                let Some(highlight) = ctx.store.by_id(id).filter(|h| h.page_number == page) else {
                    return;
                };
                self.active = Some(id.clone());
                if (ctx.is_locked)(id) {
                    debug!("Ignoring drag on {} while a change is pending", id);
                    return;
                }
                self.mode = InteractionMode::Dragging {
                    id: id.clone(),
                    grab_offset: point.offset_from(highlight.rect.center()),
                    origin: highlight.clone(),
                };
            }
            PointerTarget::Handle(id, corner) => {
                // Handles only exist on the active highlight.
                if self.active.as_ref() != Some(id) || (ctx.is_locked)(id) {
                    return;
                }
                let page = ctx.page_number;
                let Some(highlight) = ctx.store.by_id(id).filter(|h| h.page_number == page) else {
                    return;
                };
                self.mode = InteractionMode::Resizing {
                    id: id.clone(),
                    corner: *corner,
                    fixed: highlight.rect.corner(corner.opposite()),
                    origin: highlight.clone(),
                };
            }
        }
    }

    fn pointer_move<F>(&mut self, point: PagePoint, ctx: &mut GestureContext<'_, F>)
    where
        F: Fn(&HighlightId) -> bool,
    {
        match &mut self.mode {
            InteractionMode::Idle => {}
            InteractionMode::Drawing { current, .. } => {
                *current = point.clamped();
            }
            InteractionMode::Dragging { id, grab_offset, .. } => {
                let center = point.minus(*grab_offset).clamped();
                if let Some(highlight) = ctx.store.by_id_mut(id) {
                    highlight.rect = highlight.rect.with_center(center);
                }
            }
            InteractionMode::Resizing { id, fixed, .. } => {
                let rect = HighlightRect::anchored(*fixed, point, &ctx.limits);
                if let Some(highlight) = ctx.store.by_id_mut(id) {
                    highlight.rect = rect;
                }
            }
        }
    }

    fn finish<F>(&mut self, ctx: &mut GestureContext<'_, F>) -> Option<Gesture>
    where
        F: Fn(&HighlightId) -> bool,
    {
        match std::mem::take(&mut self.mode) {
            InteractionMode::Idle => None,
            InteractionMode::Drawing { anchor, current } => {
                let rect = HighlightRect::from_corners(anchor, current);
                if rect.width > ctx.draw_threshold && rect.height > ctx.draw_threshold {
                    Some(Gesture::Drawn(rect.clamped(&ctx.limits)))
                } else {
                    debug!(
                        "Discarding draw gesture {:.2}x{:.2} below threshold",
                        rect.width, rect.height
                    );
                    None
                }
            }
            InteractionMode::Dragging { id, origin, .. }
            | InteractionMode::Resizing { id, origin, .. } => {
                let current = ctx.store.by_id(&id)?.clone();
                if current.rect.approx_eq(&origin.rect) {
                    return None;
                }
                Some(Gesture::Edited {
                    prior: origin,
                    next: current,
                })
            }
        }
    }
}

/// Resolve what lies under `point` on `page_number`.
///
/// The active highlight's corner handles win, then highlights from the top of
/// the paint order down. `tolerance` is the handle hit radius in percent per
/// axis.
pub fn hit_test(
    store: &HighlightStore,
    page_number: u32,
    active: Option<&HighlightId>,
    point: PagePoint,
    tolerance: (f32, f32),
) -> PointerTarget {
    if let Some(highlight) = active.and_then(|id| store.by_id(id))
        && highlight.page_number == page_number
    {
        for corner in Corner::ALL {
            let c = highlight.rect.corner(corner);
            if (point.x - c.x).abs() <= tolerance.0 && (point.y - c.y).abs() <= tolerance.1 {
                return PointerTarget::Handle(highlight.id.clone(), corner);
            }
        }
    }

    store
        .paint_order(page_number, active)
        .iter()
        .rev()
        .find(|h| h.rect.contains(point))
        .map(|h| PointerTarget::Body(h.id.clone()))
        .unwrap_or(PointerTarget::Canvas)
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
