//! Per-document highlight engine.
//!
//! Ties the store, the interaction session and the undo log together and
//! implements "apply locally, persist asynchronously, roll back on failure".
//! The engine never talks to a backend itself: every durable change becomes a
//! [`PersistRequest`] in an outbox, and the host reports the outcome back with
//! [`HighlightEngine::resolve`].

use std::collections::{HashMap, VecDeque};

use tracing::{debug, info, warn};

use super::error::{PersistenceError, UndoError};
use super::geometry::{ContainerRect, HighlightRect, PixelPoint, SizeLimits};
use super::highlight::{Highlight, HighlightDraft, HighlightId, HighlightPatch};
use super::history::{DEFAULT_UNDO_CAPACITY, UndoEntry, UndoLog};
use super::pointer::{PointerEvent, PointerKind, PointerTarget};
use super::session::{Gesture, GestureContext, InteractionSession, hit_test};
use super::store::HighlightStore;

/// Identifies one persistence call between the engine and the host.
pub type OperationId = u64;

/// Tunables for one engine instance.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub limits: SizeLimits,
    /// Minimum width and height (percent) of a committed drawing.
    pub draw_threshold: f32,
    /// Corner handle hit radius in screen pixels.
    pub handle_radius_px: f32,
    pub undo_capacity: usize,
    pub default_color: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            limits: SizeLimits::default(),
            draw_threshold: 1.0,
            handle_radius_px: 8.0,
            undo_capacity: DEFAULT_UNDO_CAPACITY,
            default_color: "#FFFF00".to_string(),
        }
    }
}

/// A durable call the host must execute.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistCall {
    Create(HighlightDraft),
    Update { id: String, patch: HighlightPatch },
    Delete { id: String },
}

impl PersistCall {
    pub fn label(&self) -> &'static str {
        match self {
            PersistCall::Create(_) => "create",
            PersistCall::Update { .. } => "update",
            PersistCall::Delete { .. } => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersistRequest {
    pub op: OperationId,
    pub call: PersistCall,
}

/// Successful outcome of a [`PersistCall`].
#[derive(Debug, Clone, PartialEq)]
pub enum PersistReply {
    /// Create succeeded; carries the server-assigned id.
    Created(String),
    /// Update or delete succeeded.
    Done,
}

/// A user-visible, non-fatal message.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
}

/// How to put the store back if a call fails.
#[derive(Debug, Clone)]
enum Rollback {
    Remove(HighlightId),
    Restore(Highlight),
}

/// What happens to the history entry once the call resolves.
#[derive(Debug, Clone)]
enum Disposition {
    /// New user mutation: recorded on success, dropped on failure.
    Record(UndoEntry),
    /// Inverse of an undo entry: moves to redo on success, back to undo on
    /// failure.
    Undone(UndoEntry),
    /// Re-application of a redo entry: moves to undo on success, back to redo
    /// on failure.
    Redone(UndoEntry),
}

impl Disposition {
    fn entry(&self) -> &UndoEntry {
        match self {
            Disposition::Record(entry) | Disposition::Undone(entry) | Disposition::Redone(entry) => {
                entry
            }
        }
    }

    fn entry_mut(&mut self) -> &mut UndoEntry {
        match self {
            Disposition::Record(entry) | Disposition::Undone(entry) | Disposition::Redone(entry) => {
                entry
            }
        }
    }
}

#[derive(Debug, Clone)]
struct PendingOp {
    label: &'static str,
    /// Highlight the call acts on (a local id for creates).
    target: HighlightId,
    rollback: Rollback,
    disposition: Disposition,
    /// Value of the record counter when the call was queued.
    records_seen: u64,
}

impl PendingOp {
    /// A re-create locks both the local id and the id it replaces.
    fn locks(&self, id: &HighlightId) -> bool {
        &self.target == id || self.disposition.entry().highlight_id() == id
    }
}

/// Call, locked id and rollback of a replayed history entry.
type Replay = (PersistCall, HighlightId, Rollback);

/// One open document: highlights, interaction state and undo history.
#[derive(Debug)]
pub struct HighlightEngine {
    document_id: String,
    settings: EngineSettings,
    store: HighlightStore,
    session: InteractionSession,
    history: UndoLog,
    current_page: u32,
    page_count: u32,
    color: String,
    owner_ref: Option<String>,
    pending: HashMap<OperationId, PendingOp>,
    outbox: VecDeque<PersistRequest>,
    notices: Vec<Notice>,
    next_op: OperationId,
    next_local: u64,
    /// Bumped whenever a new mutation lands in the history.
    records: u64,
}

impl HighlightEngine {
    pub fn new(document_id: impl Into<String>, settings: EngineSettings) -> Self {
        let history = UndoLog::with_capacity(settings.undo_capacity);
        let color = settings.default_color.clone();
        Self {
            document_id: document_id.into(),
            settings,
            store: HighlightStore::new(),
            session: InteractionSession::new(),
            history,
            current_page: 1,
            page_count: 1,
            color,
            owner_ref: None,
            pending: HashMap::new(),
            outbox: VecDeque::new(),
            notices: Vec::new(),
            next_op: 1,
            next_local: 1,
            records: 0,
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn store(&self) -> &HighlightStore {
        &self.store
    }

    pub fn session(&self) -> &InteractionSession {
        &self.session
    }

    pub fn history(&self) -> &UndoLog {
        &self.history
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn owner_ref(&self) -> Option<&str> {
        self.owner_ref.as_deref()
    }

    pub fn active(&self) -> Option<&HighlightId> {
        self.session.active()
    }

    pub fn active_highlight(&self) -> Option<&Highlight> {
        self.session.active().and_then(|id| self.store.by_id(id))
    }

    pub fn highlight_mode(&self) -> bool {
        self.session.highlight_mode()
    }

    /// Highlights of the current page in paint order.
    pub fn visible(&self) -> Vec<&Highlight> {
        self.store.paint_order(self.current_page, self.session.active())
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// True while a persistence call for `id` is in flight.
    pub fn is_locked(&self, id: &HighlightId) -> bool {
        self.pending.values().any(|op| op.locks(id))
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        let color = color.into();
        if !color.is_empty() {
            self.color = color;
        }
    }

    pub fn set_owner_ref(&mut self, owner_ref: Option<String>) {
        self.owner_ref = owner_ref;
    }

    pub fn set_highlight_mode(&mut self, enabled: bool) {
        self.session.set_highlight_mode(enabled, &mut self.store);
    }

    pub fn set_page_count(&mut self, page_count: u32) {
        self.page_count = page_count.max(1);
        if self.current_page > self.page_count {
            self.set_page(self.page_count);
        }
    }

    /// Switch the visible page. A gesture in progress is reverted and a
    /// selection on another page is dropped.
    pub fn set_page(&mut self, page_number: u32) {
        let page_number = page_number.clamp(1, self.page_count);
        if page_number == self.current_page {
            return;
        }
        self.session.cancel(&mut self.store);
        self.current_page = page_number;
        let stale = self
            .active_highlight()
            .is_some_and(|h| h.page_number != page_number);
        if stale {
            self.session.set_active(None);
        }
    }

    /// Switch to another document. Everything of the previous one is dropped;
    /// operation ids keep counting so late results cannot match new calls.
    pub fn open_document(&mut self, document_id: impl Into<String>, page_count: u32) {
        self.document_id = document_id.into();
        self.page_count = page_count.max(1);
        self.current_page = 1;
        self.load(Vec::new());
    }

    /// Replace every highlight with a fresh listing. Resets selection, history
    /// and pending bookkeeping; results of earlier calls are ignored.
    pub fn load(&mut self, highlights: Vec<Highlight>) {
        let limits = self.settings.limits;
        let loaded = highlights.into_iter().map(|mut h| {
            if let Err(e) = h.rect.validate(&limits) {
                warn!("Clamping highlight {} loaded from backend: {}", h.id, e);
                h.rect = sanitize(h.rect).clamped(&limits);
            }
            h
        });
        self.store.replace_all(loaded);
        let highlight_mode = self.session.highlight_mode();
        self.session = InteractionSession::new();
        self.session.set_highlight_mode(highlight_mode, &mut self.store);
        self.history.clear();
        self.pending.clear();
        self.outbox.clear();
        info!(
            "Loaded {} highlights for document {}",
            self.store.len(),
            self.document_id
        );
    }

    /// What lies under a container pixel position on the current page.
    pub fn target_at(&self, position: PixelPoint, container: &ContainerRect) -> PointerTarget {
        hit_test(
            &self.store,
            self.current_page,
            self.session.active(),
            container.to_percent(position),
            self.handle_tolerance(container),
        )
    }

    /// Feed one pointer event. Returns the operation id when the event
    /// completed a gesture that needs persisting.
    pub fn pointer(&mut self, event: PointerEvent, container: &ContainerRect) -> Option<OperationId> {
        let point = container.to_percent(event.position);
        let target = match (&event.target, event.kind) {
            (Some(target), _) => target.clone(),
            (None, PointerKind::Down) => self.target_at(event.position, container),
            (None, _) => PointerTarget::Canvas,
        };

        let pending = &self.pending;
        let mut ctx = GestureContext {
            store: &mut self.store,
            page_number: self.current_page,
            limits: self.settings.limits,
            draw_threshold: self.settings.draw_threshold,
            is_locked: |id: &HighlightId| pending.values().any(|op| op.locks(id)),
        };
        let gesture = self.session.handle(event.kind, point, &target, &mut ctx)?;
        self.commit(gesture)
    }

    /// Revert the current gesture without persisting anything.
    pub fn cancel_gesture(&mut self) {
        self.session.cancel(&mut self.store);
    }

    /// Delete a highlight. Refused during a gesture or while the highlight
    /// has a call in flight.
    pub fn delete(&mut self, id: &HighlightId) -> Option<OperationId> {
        if !self.session.mode().is_idle() {
            debug!("Ignoring delete of {} during a gesture", id);
            return None;
        }
        if self.is_locked(id) {
            debug!("Ignoring delete of {} while a change is pending", id);
            return None;
        }
        let server_id = id.server_id()?.to_string();
        let prior = self.store.remove(id)?;
        self.session.forget(id);
        Some(self.enqueue(
            PersistCall::Delete { id: server_id },
            id.clone(),
            Rollback::Restore(prior.clone()),
            Disposition::Record(UndoEntry::Delete { prior }),
        ))
    }

    pub fn delete_active(&mut self) -> Option<OperationId> {
        let id = self.session.active()?.clone();
        self.delete(&id)
    }

    /// Change the color of an existing highlight.
    pub fn recolor(&mut self, id: &HighlightId, color: &str) -> Option<OperationId> {
        if color.is_empty() || !self.session.mode().is_idle() || self.is_locked(id) {
            return None;
        }
        let prior = self.store.by_id(id)?.clone();
        if prior.color == color {
            return None;
        }
        let next = Highlight {
            color: color.to_string(),
            ..prior.clone()
        };
        self.commit_update(prior, next)
    }

    /// Undo the most recent committed mutation by persisting its inverse.
    pub fn undo(&mut self) -> Result<OperationId, UndoError> {
        self.session.cancel(&mut self.store);
        let id = self
            .history
            .peek_undo()
            .ok_or(UndoError::Unavailable)?
            .highlight_id()
            .clone();
        self.check_history_idle(&id)?;
        let entry = self.history.pop_undo().ok_or(UndoError::Unavailable)?;
        debug!("Undo {} of {}", entry.label(), id);

        let replay = match &entry {
            UndoEntry::Create { highlight } => self.replay_removal(&highlight.id),
            UndoEntry::Delete { prior } => Ok(self.replay_creation(prior)),
            UndoEntry::Update { prior, .. } => self.replay_update(prior),
        };
        self.finish_replay(replay, Disposition::Undone(entry))
    }

    /// Re-apply the most recently undone mutation.
    pub fn redo(&mut self) -> Result<OperationId, UndoError> {
        self.session.cancel(&mut self.store);
        let id = self
            .history
            .peek_redo()
            .ok_or(UndoError::Unavailable)?
            .highlight_id()
            .clone();
        self.check_history_idle(&id)?;
        let entry = self.history.pop_redo().ok_or(UndoError::Unavailable)?;
        debug!("Redo {} of {}", entry.label(), id);

        let replay = match &entry {
            UndoEntry::Create { highlight } => Ok(self.replay_creation(highlight)),
            UndoEntry::Delete { prior } => self.replay_removal(&prior.id),
            UndoEntry::Update { next, .. } => self.replay_update(next),
        };
        self.finish_replay(replay, Disposition::Redone(entry))
    }

    /// History may only move while no new mutation is waiting to be recorded.
    fn check_history_idle(&self, id: &HighlightId) -> Result<(), UndoError> {
        if self.is_locked(id) {
            return Err(UndoError::Busy(id.clone()));
        }
        let unrecorded = self
            .pending
            .iter()
            .filter(|(_, op)| matches!(op.disposition, Disposition::Record(_)))
            .min_by_key(|(op, _)| **op);
        match unrecorded {
            Some((_, op)) => Err(UndoError::Busy(op.target.clone())),
            None => Ok(()),
        }
    }

    /// Requests produced since the last call, oldest first.
    pub fn take_requests(&mut self) -> Vec<PersistRequest> {
        self.outbox.drain(..).collect()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Report the outcome of a persistence call.
    pub fn resolve(&mut self, op: OperationId, result: Result<PersistReply, PersistenceError>) {
        let Some(pending) = self.pending.remove(&op) else {
            debug!("Ignoring result of unknown operation {}", op);
            return;
        };

        let result = match result {
            Ok(PersistReply::Done) if pending.label == "create" => Err(PersistenceError::Decode(
                "create response carried no id".to_string(),
            )),
            other => other,
        };

        match result {
            Ok(reply) => self.on_success(op, pending, reply),
            Err(e) => self.on_failure(op, pending, e),
        }
    }

    fn on_success(&mut self, op: OperationId, pending: PendingOp, reply: PersistReply) {
        let PendingOp {
            label,
            target,
            mut disposition,
            records_seen,
            ..
        } = pending;
        debug!("Operation {} ({} {}) succeeded", op, label, target);

        if let PersistReply::Created(server_id) = reply {
            let new_id = HighlightId::Server(server_id);
            let replaced = disposition.entry().highlight_id().clone();
            for old in [target, replaced] {
                if old != new_id {
                    self.rebind(&old, &new_id);
                    disposition.entry_mut().rebind(&old, &new_id);
                }
            }
        }

        match disposition {
            Disposition::Record(entry) => {
                self.history.record(entry);
                self.records += 1;
            }
            // A mutation recorded after the undo was issued invalidated redo.
            Disposition::Undone(entry) if records_seen != self.records => {
                debug!("Dropping redo of {} after a newer change", entry.label());
            }
            Disposition::Undone(entry) => self.history.push_redo(entry),
            Disposition::Redone(entry) => self.history.push_undo(entry),
        }
    }

    fn on_failure(&mut self, op: OperationId, pending: PendingOp, error: PersistenceError) {
        let PendingOp {
            label,
            target,
            rollback,
            disposition,
            ..
        } = pending;
        warn!("Operation {} ({} {}) failed: {}", op, label, target, error);

        match rollback {
            Rollback::Remove(id) => {
                self.store.remove(&id);
                self.session.forget(&id);
            }
            Rollback::Restore(highlight) => {
                self.store.upsert(highlight);
            }
        }

        let action = match disposition {
            Disposition::Record(_) => label,
            Disposition::Undone(entry) => {
                self.history.push_undo(entry);
                "undo"
            }
            Disposition::Redone(entry) => {
                self.history.push_redo(entry);
                "redo"
            }
        };
        self.notices.push(Notice {
            message: format!("Could not {} highlight: {}", action, error),
        });
    }

    fn commit(&mut self, gesture: Gesture) -> Option<OperationId> {
        match gesture {
            Gesture::Drawn(rect) => Some(self.commit_drawing(rect)),
            Gesture::Edited { prior, next } => self.commit_update(prior, next),
        }
    }

    fn commit_drawing(&mut self, rect: HighlightRect) -> OperationId {
        let id = self.local_id();
        let highlight = Highlight {
            id: id.clone(),
            document_id: self.document_id.clone(),
            page_number: self.current_page,
            rect,
            color: self.color.clone(),
            owner_ref: self.owner_ref.clone(),
        };
        debug_assert!(highlight.rect.validate(&self.settings.limits).is_ok());
        self.store.upsert(highlight.clone());
        self.enqueue(
            PersistCall::Create(highlight.draft()),
            id.clone(),
            Rollback::Remove(id),
            Disposition::Record(UndoEntry::Create { highlight }),
        )
    }

    fn commit_update(&mut self, prior: Highlight, next: Highlight) -> Option<OperationId> {
        let Some(server_id) = prior.id.server_id().map(str::to_string) else {
            // Unreachable while creates lock their highlight; revert quietly.
            self.store.upsert(prior);
            return None;
        };
        let patch = next.patch_from(&prior);
        if patch.is_empty() {
            return None;
        }
        self.store.upsert(next.clone());
        Some(self.enqueue(
            PersistCall::Update {
                id: server_id,
                patch,
            },
            prior.id.clone(),
            Rollback::Restore(prior.clone()),
            Disposition::Record(UndoEntry::Update { prior, next }),
        ))
    }

    fn replay_removal(&mut self, id: &HighlightId) -> Result<Replay, UndoError> {
        let server_id = id
            .server_id()
            .ok_or_else(|| UndoError::Busy(id.clone()))?
            .to_string();
        let current = self
            .store
            .remove(id)
            .ok_or_else(|| UndoError::Missing(id.clone()))?;
        self.session.forget(id);
        Ok((
            PersistCall::Delete { id: server_id },
            id.clone(),
            Rollback::Restore(current),
        ))
    }

    fn replay_creation(&mut self, highlight: &Highlight) -> Replay {
        let id = self.local_id();
        self.store.upsert(highlight.clone().with_id(id.clone()));
        (
            PersistCall::Create(highlight.draft()),
            id.clone(),
            Rollback::Remove(id),
        )
    }

    fn replay_update(&mut self, target: &Highlight) -> Result<Replay, UndoError> {
        let server_id = target
            .id
            .server_id()
            .ok_or_else(|| UndoError::Busy(target.id.clone()))?
            .to_string();
        let current = self
            .store
            .by_id(&target.id)
            .cloned()
            .ok_or_else(|| UndoError::Missing(target.id.clone()))?;
        let patch = target.patch_from(&current);
        self.store.upsert(target.clone());
        Ok((
            PersistCall::Update {
                id: server_id,
                patch,
            },
            target.id.clone(),
            Rollback::Restore(current),
        ))
    }

    fn finish_replay(
        &mut self,
        replay: Result<Replay, UndoError>,
        disposition: Disposition,
    ) -> Result<OperationId, UndoError> {
        match replay {
            Ok((call, target, rollback)) => Ok(self.enqueue(call, target, rollback, disposition)),
            Err(UndoError::Missing(id)) => {
                warn!("Dropping history entry for missing highlight {}", id);
                Err(UndoError::Missing(id))
            }
            Err(e) => {
                match disposition {
                    Disposition::Undone(entry) => self.history.push_undo(entry),
                    Disposition::Redone(entry) => self.history.push_redo(entry),
                    Disposition::Record(_) => {}
                }
                Err(e)
            }
        }
    }

    fn enqueue(
        &mut self,
        call: PersistCall,
        target: HighlightId,
        rollback: Rollback,
        disposition: Disposition,
    ) -> OperationId {
        let op = self.next_op;
        self.next_op += 1;
        debug!("Queueing operation {} ({} {})", op, call.label(), target);
        self.pending.insert(
            op,
            PendingOp {
                label: call.label(),
                target,
                rollback,
                disposition,
                records_seen: self.records,
            },
        );
        self.outbox.push_back(PersistRequest { op, call });
        op
    }

    /// Propagate a server-assigned id to every place that held `old`.
    fn rebind(&mut self, old: &HighlightId, new: &HighlightId) {
        self.store.rekey(old, new.clone());
        self.session.rebind(old, new);
        self.history.rebind(old, new);
    }

    fn local_id(&mut self) -> HighlightId {
        let id = HighlightId::Local(self.next_local);
        self.next_local += 1;
        id
    }

    fn handle_tolerance(&self, container: &ContainerRect) -> (f32, f32) {
        if container.is_degenerate() {
            return (0.0, 0.0);
        }
        let (px, py) = container.pixels_per_percent();
        (
            self.settings.handle_radius_px / px,
            self.settings.handle_radius_px / py,
        )
    }
}

/// Replace non-finite components before clamping.
fn sanitize(rect: HighlightRect) -> HighlightRect {
    let or = |value: f32, fallback: f32| if value.is_finite() { value } else { fallback };
    HighlightRect::new(
        or(rect.center_x, 50.0),
        or(rect.center_y, 50.0),
        or(rect.width, 10.0),
        or(rect.height, 5.0),
    )
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
