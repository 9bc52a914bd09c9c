//! Camera and window access shared by the viewer systems.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;

use crate::overlay::{ContainerRect, PixelPoint};

use super::camera::ViewerCamera;
use super::page::PageDisplay;

/// Bundled camera and window queries for cursor and page projections
#[derive(SystemParam)]
pub struct CameraParams<'w, 's> {
    pub window: Query<'w, 's, &'static Window, With<PrimaryWindow>>,
    pub camera: Query<'w, 's, (&'static Camera, &'static GlobalTransform), With<ViewerCamera>>,
}

impl CameraParams<'_, '_> {
    /// Cursor position in window (viewport) pixels, if over the window.
    pub fn cursor_position(&self) -> Option<Vec2> {
        self.window.single().ok()?.cursor_position()
    }

    pub fn window_focused(&self) -> bool {
        self.window.single().map(|w| w.focused).unwrap_or(false)
    }

    /// On-screen rectangle of the displayed page, in viewport pixels.
    pub fn page_container(&self, page: &PageDisplay) -> Option<ContainerRect> {
        if page.world_size == Vec2::ZERO {
            return None;
        }
        let (camera, transform) = self.camera.single().ok()?;
        let half = page.world_size / 2.0;
        let top_left = camera
            .world_to_viewport(transform, Vec3::new(-half.x, half.y, 0.0))
            .ok()?;
        let bottom_right = camera
            .world_to_viewport(transform, Vec3::new(half.x, -half.y, 0.0))
            .ok()?;
        Some(ContainerRect::from_corners(
            PixelPoint::new(top_left.x, top_left.y),
            PixelPoint::new(bottom_right.x, bottom_right.y),
        ))
    }
}

/// Check if cursor is over egui UI (for input gating)
pub fn is_cursor_over_ui(contexts: &mut EguiContexts) -> bool {
    contexts
        .ctx_mut()
        .map(|ctx| ctx.is_pointer_over_area())
        .unwrap_or(false)
}

/// Check if egui is consuming keyboard input (a text field has focus)
pub fn is_typing_in_ui(contexts: &mut EguiContexts) -> bool {
    contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_keyboard_input())
        .unwrap_or(false)
}
