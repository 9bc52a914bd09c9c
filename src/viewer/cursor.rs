//! Cursor icon feedback for drawing, moving and resizing highlights.

use bevy::prelude::*;
use bevy::window::{CursorIcon, PrimaryWindow, SystemCursorIcon};
use bevy_egui::EguiContexts;

use crate::overlay::{Corner, InteractionMode, PixelPoint, PointerTarget};

use super::OverlayEngine;
use super::page::PageDisplay;
use super::params::{CameraParams, is_cursor_over_ui};

fn corner_cursor(corner: Corner) -> SystemCursorIcon {
    match corner {
        Corner::NorthWest | Corner::SouthEast => SystemCursorIcon::NwseResize,
        Corner::NorthEast | Corner::SouthWest => SystemCursorIcon::NeswResize,
    }
}

/// Cursor for the current gesture, or for what is under an idle pointer.
pub fn cursor_for(
    mode: &InteractionMode,
    hover: Option<&PointerTarget>,
    highlight_mode: bool,
) -> SystemCursorIcon {
    match mode {
        InteractionMode::Drawing { .. } => SystemCursorIcon::Crosshair,
        InteractionMode::Dragging { .. } => SystemCursorIcon::Move,
        InteractionMode::Resizing { corner, .. } => corner_cursor(*corner),
        InteractionMode::Idle => match hover {
            None => SystemCursorIcon::Default,
            Some(_) if highlight_mode => SystemCursorIcon::Crosshair,
            Some(PointerTarget::Handle(_, corner)) => corner_cursor(*corner),
            Some(PointerTarget::Body(_)) => SystemCursorIcon::Move,
            Some(PointerTarget::Canvas) => SystemCursorIcon::Default,
        },
    }
}

pub fn update_cursor_icon(
    mut commands: Commands,
    window_query: Query<Entity, With<PrimaryWindow>>,
    params: CameraParams,
    page: Res<PageDisplay>,
    engine: Res<OverlayEngine>,
    mut contexts: EguiContexts,
) {
    let Ok(window_entity) = window_query.single() else {
        return;
    };

    let mode = engine.session().mode();
    let hover = if mode.is_idle() && !is_cursor_over_ui(&mut contexts) {
        params
            .cursor_position()
            .zip(params.page_container(&page))
            .map(|(cursor, container)| (PixelPoint::new(cursor.x, cursor.y), container))
            .filter(|(position, container)| container.contains(*position))
            .map(|(position, container)| engine.target_at(position, &container))
    } else {
        None
    };

    let icon = cursor_for(mode, hover.as_ref(), engine.highlight_mode());
    commands.entity(window_entity).insert(CursorIcon::System(icon));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::HighlightId;

    #[test]
    fn test_idle_hover_cursors() {
        let id = HighlightId::Server("h1".into());
        let idle = InteractionMode::Idle;
        assert_eq!(
            cursor_for(&idle, Some(&PointerTarget::Body(id.clone())), false),
            SystemCursorIcon::Move
        );
        assert_eq!(
            cursor_for(&idle, Some(&PointerTarget::Handle(id.clone(), Corner::NorthEast)), false),
            SystemCursorIcon::NeswResize
        );
        assert_eq!(
            cursor_for(&idle, Some(&PointerTarget::Handle(id, Corner::SouthEast)), false),
            SystemCursorIcon::NwseResize
        );
        assert_eq!(cursor_for(&idle, None, false), SystemCursorIcon::Default);
    }

    #[test]
    fn test_highlight_mode_shows_crosshair_over_page() {
        let idle = InteractionMode::Idle;
        let id = HighlightId::Local(1);
        assert_eq!(
            cursor_for(&idle, Some(&PointerTarget::Body(id)), true),
            SystemCursorIcon::Crosshair
        );
        assert_eq!(
            cursor_for(&idle, Some(&PointerTarget::Canvas), true),
            SystemCursorIcon::Crosshair
        );
    }
}
