use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::overlay::{OperationId, PixelPoint, PointerEvent, UndoError};

use super::notices::Notices;
use super::page::PageDisplay;
use super::params::{CameraParams, is_cursor_over_ui, is_typing_in_ui};
use super::{DeleteActiveRequest, GoToPageRequest, OverlayEngine, RedoRequest, UndoRequest};

/// Left-button state between frames.
#[derive(Resource, Default)]
pub struct PointerTracker {
    /// Last cursor position in viewport pixels.
    pub last: Option<Vec2>,
    /// A press on the page has not been released yet.
    pub pressed: bool,
}

/// Feed left-button presses, motion and releases over the page to the engine.
pub fn translate_pointer(
    mouse_button: Res<ButtonInput<MouseButton>>,
    params: CameraParams,
    page: Res<PageDisplay>,
    mut engine: ResMut<OverlayEngine>,
    mut tracker: ResMut<PointerTracker>,
    mut contexts: EguiContexts,
) {
    let Some(container) = params.page_container(&page) else {
        tracker.pressed = false;
        return;
    };
    let cursor = params.cursor_position();

    // Losing the window or the cursor finishes the gesture where it was.
    if tracker.pressed && (!params.window_focused() || cursor.is_none()) {
        let last = tracker.last.unwrap_or_default();
        if let Some(op) = engine.pointer(PointerEvent::leave(last.x, last.y), &container) {
            debug!("Gesture finished by pointer leave (operation {})", op);
        }
        tracker.pressed = false;
        return;
    }

    let Some(cursor) = cursor else {
        return;
    };
    let position = PixelPoint::new(cursor.x, cursor.y);

    if mouse_button.just_pressed(MouseButton::Left)
        && !is_cursor_over_ui(&mut contexts)
        && container.contains(position)
    {
        engine.pointer(PointerEvent::down(cursor.x, cursor.y), &container);
        tracker.pressed = true;
    } else if tracker.pressed && tracker.last != Some(cursor) {
        engine.pointer(PointerEvent::moved(cursor.x, cursor.y), &container);
    }

    if tracker.pressed && !mouse_button.pressed(MouseButton::Left) {
        if let Some(op) = engine.pointer(PointerEvent::up(cursor.x, cursor.y), &container) {
            debug!("Gesture committed as operation {}", op);
        }
        tracker.pressed = false;
    }

    tracker.last = Some(cursor);
}

/// Keyboard shortcuts of the viewer.
///
/// - `H`: toggle highlight mode
/// - `Delete` / `Backspace`: delete the selected highlight
/// - `PageUp` / `PageDown`: previous / next page
/// - `Ctrl+Z`: undo, `Ctrl+Y` or `Ctrl+Shift+Z`: redo
/// - `Escape`: abort the current gesture
pub fn handle_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut engine: ResMut<OverlayEngine>,
    mut contexts: EguiContexts,
    mut undo_events: MessageWriter<UndoRequest>,
    mut redo_events: MessageWriter<RedoRequest>,
    mut delete_events: MessageWriter<DeleteActiveRequest>,
    mut page_events: MessageWriter<GoToPageRequest>,
) {
    if is_typing_in_ui(&mut contexts) {
        return;
    }

    let ctrl = keyboard.pressed(KeyCode::ControlLeft) || keyboard.pressed(KeyCode::ControlRight);
    let shift = keyboard.pressed(KeyCode::ShiftLeft) || keyboard.pressed(KeyCode::ShiftRight);

    if keyboard.just_pressed(KeyCode::Escape) {
        engine.cancel_gesture();
    }

    if ctrl && !shift && keyboard.just_pressed(KeyCode::KeyZ) {
        undo_events.write(UndoRequest);
    }

    if (ctrl && keyboard.just_pressed(KeyCode::KeyY))
        || (ctrl && shift && keyboard.just_pressed(KeyCode::KeyZ))
    {
        redo_events.write(RedoRequest);
    }

    if ctrl {
        return;
    }

    if keyboard.just_pressed(KeyCode::KeyH) {
        let enabled = !engine.highlight_mode();
        engine.set_highlight_mode(enabled);
        info!("Highlight mode {}", if enabled { "on" } else { "off" });
    }

    if keyboard.any_just_pressed([KeyCode::Delete, KeyCode::Backspace]) {
        delete_events.write(DeleteActiveRequest);
    }

    let current = engine.current_page();
    if keyboard.just_pressed(KeyCode::PageDown) {
        page_events.write(GoToPageRequest { page: current + 1 });
    }
    if keyboard.just_pressed(KeyCode::PageUp) && current > 1 {
        page_events.write(GoToPageRequest { page: current - 1 });
    }
}

pub fn handle_history_requests(
    mut undo_events: MessageReader<UndoRequest>,
    mut redo_events: MessageReader<RedoRequest>,
    mut engine: ResMut<OverlayEngine>,
    mut notices: ResMut<Notices>,
) {
    for _ in undo_events.read() {
        report_history(engine.undo(), "undo", &mut notices);
    }
    for _ in redo_events.read() {
        report_history(engine.redo(), "redo", &mut notices);
    }
}

fn report_history(result: Result<OperationId, UndoError>, action: &str, notices: &mut Notices) {
    match result {
        Ok(op) => debug!("Started {} as operation {}", action, op),
        Err(UndoError::Unavailable) => debug!("Nothing to {}", action),
        Err(e @ UndoError::Busy(_)) => notices.push(format!("Cannot {} yet: {}", action, e)),
        Err(e) => {
            warn!("Dropped {} entry: {}", action, e);
            notices.push(format!("Cannot {}: {}", action, e));
        }
    }
}

pub fn handle_delete_requests(
    mut events: MessageReader<DeleteActiveRequest>,
    mut engine: ResMut<OverlayEngine>,
) {
    for _ in events.read() {
        match engine.delete_active() {
            Some(op) => debug!("Deleting selected highlight (operation {})", op),
            None => debug!("Nothing deletable is selected"),
        }
    }
}
