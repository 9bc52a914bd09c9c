//! Drawing the overlay: one translucent sprite per visible highlight, gizmo
//! outlines, resize handles and the draw preview.

use std::collections::{HashMap, HashSet};

use bevy::gizmos::config::{GizmoConfigGroup, GizmoConfigStore};
use bevy::prelude::*;

use crate::overlay::{Corner, HighlightId};
use crate::theme;

use super::OverlayEngine;
use super::camera::{CameraZoom, ViewerCamera};
use super::page::PageDisplay;

/// Highlights sit above the page sprite; later paint order stacks higher.
const HIGHLIGHT_BASE_Z: f32 = 1.0;
const HIGHLIGHT_Z_STEP: f32 = 0.001;

#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct OverlayGizmoGroup;

pub fn configure_overlay_gizmos(mut config_store: ResMut<GizmoConfigStore>) {
    let (config, _) = config_store.config_mut::<OverlayGizmoGroup>();
    config.line.width = 2.0;
}

/// Sprite entity of each highlight on screen.
#[derive(Resource, Default)]
pub struct HighlightSprites {
    entities: HashMap<HighlightId, Entity>,
}

#[derive(Component)]
pub struct HighlightSprite {
    pub id: HighlightId,
}

/// Mirror the visible highlights of the engine into sprites.
pub fn sync_highlight_sprites(
    mut commands: Commands,
    engine: Res<OverlayEngine>,
    page: Res<PageDisplay>,
    mut sprites: ResMut<HighlightSprites>,
    mut query: Query<(&mut Sprite, &mut Transform), With<HighlightSprite>>,
) {
    if !engine.is_changed() && !page.is_changed() {
        return;
    }

    let visible = if page.world_size == Vec2::ZERO {
        Vec::new()
    } else {
        engine.visible()
    };
    let mut seen = HashSet::with_capacity(visible.len());

    for (index, highlight) in visible.iter().enumerate() {
        let (center, size) = page.rect_to_world(&highlight.rect);
        let alpha = if engine.is_locked(&highlight.id) {
            theme::PENDING_FILL_ALPHA
        } else {
            theme::HIGHLIGHT_FILL_ALPHA
        };
        let color = theme::highlight_fill(&highlight.color, alpha);
        let translation = center.extend(HIGHLIGHT_BASE_Z + index as f32 * HIGHLIGHT_Z_STEP);
        seen.insert(highlight.id.clone());

        if let Some(&entity) = sprites.entities.get(&highlight.id)
            && let Ok((mut sprite, mut transform)) = query.get_mut(entity)
        {
            sprite.color = color;
            sprite.custom_size = Some(size);
            transform.translation = translation;
            continue;
        }

        let entity = commands
            .spawn((
                HighlightSprite {
                    id: highlight.id.clone(),
                },
                Sprite {
                    color,
                    custom_size: Some(size),
                    ..default()
                },
                Transform::from_translation(translation),
            ))
            .id();
        sprites.entities.insert(highlight.id.clone(), entity);
    }

    sprites.entities.retain(|id, entity| {
        if seen.contains(id) {
            return true;
        }
        commands.entity(*entity).despawn();
        false
    });
}

/// Outlines, the selected highlight's handles and the draw preview.
pub fn draw_overlay_gizmos(
    mut gizmos: Gizmos<OverlayGizmoGroup>,
    engine: Res<OverlayEngine>,
    page: Res<PageDisplay>,
    camera_query: Query<&CameraZoom, With<ViewerCamera>>,
) {
    if page.world_size == Vec2::ZERO {
        return;
    }
    let scale = camera_query.single().map(|zoom| zoom.scale).unwrap_or(1.0);

    for highlight in engine.visible() {
        let (center, size) = page.rect_to_world(&highlight.rect);
        let active = engine.active() == Some(&highlight.id);
        let color = if active {
            theme::ACTIVE_OUTLINE
        } else {
            theme::highlight_fill(&highlight.color, theme::HIGHLIGHT_OUTLINE_ALPHA)
        };
        gizmos.rect_2d(Isometry2d::from_translation(center), size, color);
    }

    // Handles are only offered while they can be grabbed.
    if let Some(highlight) = engine.active_highlight()
        && highlight.page_number == engine.current_page()
        && !engine.highlight_mode()
        && !engine.is_locked(&highlight.id)
    {
        let handle_size = Vec2::splat(engine.settings().handle_radius_px * scale);
        for corner in Corner::ALL {
            let position = page.percent_to_world(highlight.rect.corner(corner));
            gizmos.rect_2d(
                Isometry2d::from_translation(position),
                handle_size,
                theme::HANDLE_COLOR,
            );
        }
    }

    if let Some(preview) = engine.session().preview() {
        let (center, size) = page.rect_to_world(&preview);
        gizmos.rect_2d(Isometry2d::from_translation(center), size, theme::DRAW_PREVIEW);
    }
}
