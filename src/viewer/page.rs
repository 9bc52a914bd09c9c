use std::path::PathBuf;
use std::sync::Arc;

use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::tasks::{AsyncComputeTaskPool, Task};
use futures_lite::future;

use crate::config::{AppConfig, SetPagesDirRequest};
use crate::overlay::{HighlightRect, PAGE_EXTENT, PagePoint};
use crate::pages::{ImageDirectory, PageError, PageSource, RenderedPage};

use super::notices::Notices;
use super::{
    GoToPageRequest, OpenPagesRequest, OverlayEngine, ReloadHighlightsRequest, UNTITLED_DOCUMENT,
};

/// The open document and the page currently on screen.
#[derive(Resource, Default)]
pub struct PageDisplay {
    pub source: Option<Arc<dyn PageSource>>,
    pub root: Option<PathBuf>,
    /// Size of the page sprite in world units; zero until the first render.
    pub world_size: Vec2,
    /// Refit the camera once the next page size is known.
    pub fit_pending: bool,
    pub loading: bool,
    pub label: Option<String>,
    /// Bumped on every render request so stale results can be dropped.
    pub generation: u64,
}

impl PageDisplay {
    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    /// World position of a point given in page percent.
    pub fn percent_to_world(&self, point: PagePoint) -> Vec2 {
        let half = self.world_size / 2.0;
        Vec2::new(
            -half.x + point.x / PAGE_EXTENT * self.world_size.x,
            half.y - point.y / PAGE_EXTENT * self.world_size.y,
        )
    }

    /// World center and size of a highlight rectangle.
    pub fn rect_to_world(&self, rect: &HighlightRect) -> (Vec2, Vec2) {
        let center = self.percent_to_world(rect.center());
        let size = Vec2::new(
            rect.width / PAGE_EXTENT * self.world_size.x,
            rect.height / PAGE_EXTENT * self.world_size.y,
        );
        (center, size)
    }
}

/// The sprite showing the current page raster.
#[derive(Component)]
pub struct PageSprite;

/// Background rasterisation of one page.
#[derive(Component)]
pub struct RenderPageTask {
    page: u32,
    generation: u64,
    task: Task<Result<RenderedPage, PageError>>,
}

fn spawn_render(commands: &mut Commands, display: &mut PageDisplay, page: u32, width_px: u32) {
    let Some(source) = display.source.clone() else {
        return;
    };
    display.generation += 1;
    display.loading = true;
    display.label = source.page_label(page);

    let task_pool = AsyncComputeTaskPool::get();
    let task = task_pool.spawn(async move { source.render_page(page, width_px) });
    commands.spawn(RenderPageTask {
        page,
        generation: display.generation,
        task,
    });
}

pub fn handle_open_pages(
    mut commands: Commands,
    mut events: MessageReader<OpenPagesRequest>,
    config: Res<AppConfig>,
    mut display: ResMut<PageDisplay>,
    mut engine: ResMut<OverlayEngine>,
    mut notices: ResMut<Notices>,
    mut set_dir_events: MessageWriter<SetPagesDirRequest>,
    mut reload_events: MessageWriter<ReloadHighlightsRequest>,
) {
    // Only the latest request matters when several arrive in one frame.
    let Some(request) = events.read().last() else {
        return;
    };

    let directory = match ImageDirectory::open(&request.path) {
        Ok(directory) => directory,
        Err(e) => {
            warn!("Failed to open pages: {}", e);
            notices.push(format!("Could not open pages: {}", e));
            return;
        }
    };

    let page_count = directory.page_count();
    info!("Opened {} pages from {:?}", page_count, request.path);

    let document_id = config
        .data
        .document_id_for(Some(&request.path))
        .unwrap_or_else(|| UNTITLED_DOCUMENT.to_string());
    engine.open_document(document_id, page_count);

    display.source = Some(Arc::new(directory));
    display.root = Some(request.path.clone());
    display.fit_pending = true;
    spawn_render(&mut commands, &mut display, 1, config.data.page_render_width);

    set_dir_events.write(SetPagesDirRequest {
        path: request.path.clone(),
    });
    reload_events.write(ReloadHighlightsRequest);
}

pub fn handle_go_to_page(
    mut commands: Commands,
    mut events: MessageReader<GoToPageRequest>,
    config: Res<AppConfig>,
    mut display: ResMut<PageDisplay>,
    mut engine: ResMut<OverlayEngine>,
) {
    let Some(request) = events.read().last() else {
        return;
    };
    if !display.is_open() {
        return;
    }

    let before = engine.current_page();
    engine.set_page(request.page);
    if engine.current_page() != before {
        debug!("Showing page {}", engine.current_page());
        spawn_render(
            &mut commands,
            &mut display,
            engine.current_page(),
            config.data.page_render_width,
        );
    }
}

pub fn poll_render_tasks(
    mut commands: Commands,
    mut display: ResMut<PageDisplay>,
    mut images: ResMut<Assets<Image>>,
    mut notices: ResMut<Notices>,
    mut tasks: Query<(Entity, &mut RenderPageTask)>,
    sprites: Query<Entity, With<PageSprite>>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut task.task)) else {
            continue;
        };
        commands.entity(entity).despawn();

        if task.generation != display.generation {
            debug!("Dropping stale render of page {}", task.page);
            continue;
        }
        display.loading = false;

        let rendered = match result {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!("Failed to render page {}: {}", task.page, e);
                notices.push(format!("Could not show page {}: {}", task.page, e));
                continue;
            }
        };

        for sprite in sprites.iter() {
            commands.entity(sprite).despawn();
        }

        let world_size = Vec2::new(rendered.width as f32, rendered.height as f32);
        let image = Image::new(
            Extent3d {
                width: rendered.width,
                height: rendered.height,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            rendered.rgba,
            TextureFormat::Rgba8UnormSrgb,
            default(),
        );
        let handle = images.add(image);

        if display.world_size != world_size {
            display.fit_pending = true;
        }
        display.world_size = world_size;

        commands.spawn((
            PageSprite,
            Sprite {
                image: handle,
                custom_size: Some(world_size),
                ..default()
            },
            Transform::from_xyz(0.0, 0.0, 0.0),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(width: f32, height: f32) -> PageDisplay {
        PageDisplay {
            world_size: Vec2::new(width, height),
            ..default()
        }
    }

    #[test]
    fn test_percent_corners_map_to_page_edges() {
        let page = display(1000.0, 800.0);
        assert_eq!(page.percent_to_world(PagePoint::new(0.0, 0.0)), Vec2::new(-500.0, 400.0));
        assert_eq!(page.percent_to_world(PagePoint::new(100.0, 100.0)), Vec2::new(500.0, -400.0));
        assert_eq!(page.percent_to_world(PagePoint::new(50.0, 50.0)), Vec2::ZERO);
    }

    #[test]
    fn test_rect_to_world_scales_each_axis() {
        let page = display(1000.0, 800.0);
        let rect = HighlightRect::new(25.0, 75.0, 10.0, 20.0);
        let (center, size) = page.rect_to_world(&rect);
        assert_eq!(center, Vec2::new(-250.0, -200.0));
        assert_eq!(size, Vec2::new(100.0, 160.0));
    }

    #[test]
    fn test_default_display_is_closed() {
        let page = PageDisplay::default();
        assert!(!page.is_open());
        assert_eq!(page.world_size, Vec2::ZERO);
    }
}
