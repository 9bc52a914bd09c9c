use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;

use crate::constants::{MAX_ZOOM, MIN_ZOOM};

use super::page::PageDisplay;
use super::params::is_cursor_over_ui;

/// Margin kept around a page when fitting it to the window.
const FIT_MARGIN: f32 = 0.92;

#[derive(Component)]
pub struct ViewerCamera;

#[derive(Component)]
pub struct CameraZoom {
    pub scale: f32,
}

impl Default for CameraZoom {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

pub fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        ViewerCamera,
        CameraZoom::default(),
        Transform::from_translation(Vec3::new(0.0, 0.0, 1000.0)),
    ));
}

pub fn camera_pan(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut camera_query: Query<(&mut Transform, &CameraZoom), With<ViewerCamera>>,
) {
    if !mouse_button.pressed(MouseButton::Middle) {
        mouse_motion.clear();
        return;
    }

    let Ok((mut transform, zoom)) = camera_query.single_mut() else {
        return;
    };

    for event in mouse_motion.read() {
        let delta = event.delta * zoom.scale;
        transform.translation.x -= delta.x;
        transform.translation.y += delta.y;
    }
}

pub fn camera_zoom(
    mut scroll_events: MessageReader<MouseWheel>,
    mut camera_query: Query<&mut CameraZoom, With<ViewerCamera>>,
    mut contexts: EguiContexts,
) {
    // Scrolling a panel must not zoom the page.
    if is_cursor_over_ui(&mut contexts) {
        scroll_events.clear();
        return;
    }

    let Ok(mut zoom) = camera_query.single_mut() else {
        return;
    };

    for event in scroll_events.read() {
        let scroll_amount = match event.unit {
            MouseScrollUnit::Line => event.y * 0.1,
            MouseScrollUnit::Pixel => event.y * 0.001,
        };

        zoom.scale = (zoom.scale * (1.0 - scroll_amount)).clamp(MIN_ZOOM, MAX_ZOOM);
    }
}

pub fn apply_camera_zoom(
    mut camera_query: Query<(&CameraZoom, &mut Projection), (With<ViewerCamera>, Changed<CameraZoom>)>,
) {
    for (zoom, mut projection) in camera_query.iter_mut() {
        if let Projection::Orthographic(ref mut ortho) = *projection {
            ortho.scale = zoom.scale;
        }
    }
}

/// Scale needed to show `page_size` inside `window_size` with a margin.
pub fn fit_scale(page_size: Vec2, window_size: Vec2) -> f32 {
    if page_size.x <= 0.0 || page_size.y <= 0.0 || window_size.x <= 0.0 || window_size.y <= 0.0 {
        return 1.0;
    }
    let scale_x = page_size.x / (window_size.x * FIT_MARGIN);
    let scale_y = page_size.y / (window_size.y * FIT_MARGIN);
    scale_x.max(scale_y).clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Center and fit the camera after a new document was opened.
pub fn fit_camera_to_page(
    mut page: ResMut<PageDisplay>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    mut camera_query: Query<(&mut Transform, &mut CameraZoom), With<ViewerCamera>>,
) {
    if !page.fit_pending || page.world_size == Vec2::ZERO {
        return;
    }
    let Ok(window) = window_query.single() else {
        return;
    };
    let Ok((mut transform, mut zoom)) = camera_query.single_mut() else {
        return;
    };

    transform.translation.x = 0.0;
    transform.translation.y = 0.0;
    zoom.scale = fit_scale(page.world_size, window.size());
    page.fit_pending = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_scale_uses_limiting_axis() {
        let scale = fit_scale(Vec2::new(1600.0, 2000.0), Vec2::new(1600.0, 1000.0));
        assert!((scale - 2.0 / FIT_MARGIN).abs() < 1e-4);
    }

    #[test]
    fn test_fit_scale_degenerate_sizes() {
        assert_eq!(fit_scale(Vec2::ZERO, Vec2::new(800.0, 600.0)), 1.0);
        assert_eq!(fit_scale(Vec2::new(800.0, 600.0), Vec2::ZERO), 1.0);
    }
}
