//! Bevy side of the viewer: camera, page display, pointer translation,
//! highlight rendering and the persistence task plumbing around the
//! toolkit-neutral [`HighlightEngine`].

mod camera;
mod cursor;
mod input;
pub mod notices;
pub mod page;
mod params;
mod render;
mod sync;

pub use camera::ViewerCamera;
pub use notices::Notices;
pub use page::PageDisplay;
pub use sync::{Backend, SyncStatus};

use std::path::PathBuf;

use bevy::prelude::*;

use crate::config::{AppConfig, ConfigLoaded};
use crate::overlay::{EngineSettings, HighlightEngine};

/// Document id used until a page folder or configured document is open.
const UNTITLED_DOCUMENT: &str = "untitled";

/// The highlight engine of the open document.
#[derive(Resource, Deref, DerefMut)]
pub struct OverlayEngine(pub HighlightEngine);

impl Default for OverlayEngine {
    fn default() -> Self {
        Self(HighlightEngine::new(UNTITLED_DOCUMENT, EngineSettings::default()))
    }
}

/// Open a folder of page images as the current document.
#[derive(Message)]
pub struct OpenPagesRequest {
    pub path: PathBuf,
}

/// Show another page (1-indexed; clamped to the document).
#[derive(Message)]
pub struct GoToPageRequest {
    pub page: u32,
}

#[derive(Message)]
pub struct UndoRequest;

#[derive(Message)]
pub struct RedoRequest;

/// Delete the selected highlight.
#[derive(Message)]
pub struct DeleteActiveRequest;

/// Fetch the highlights of the open document again.
#[derive(Message)]
pub struct ReloadHighlightsRequest;

/// Ordering of the per-frame viewer work.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewerSet {
    /// Keyboard and pointer input into the engine.
    Input,
    /// Dispatch and poll background tasks.
    Sync,
    /// Sprites, gizmos and cursor.
    Render,
}

/// Build the engine for the configured document and open the remembered
/// page folder.
fn init_document(
    config: Res<AppConfig>,
    mut engine: ResMut<OverlayEngine>,
    mut open_events: MessageWriter<OpenPagesRequest>,
    mut reload_events: MessageWriter<ReloadHighlightsRequest>,
) {
    let document_id = config
        .data
        .effective_document_id()
        .unwrap_or_else(|| UNTITLED_DOCUMENT.to_string());
    engine.0 = new_engine(&config, document_id);

    match &config.data.pages_dir {
        Some(path) if path.exists() => {
            open_events.write(OpenPagesRequest { path: path.clone() });
        }
        _ => {
            reload_events.write(ReloadHighlightsRequest);
        }
    }
}

/// Engine configured from the current settings.
pub fn new_engine(config: &AppConfig, document_id: String) -> HighlightEngine {
    let mut engine = HighlightEngine::new(document_id, config.data.highlight.engine_settings());
    engine.set_owner_ref(config.data.owner_ref.clone().filter(|r| !r.is_empty()));
    engine
}

pub struct ViewerPlugin;

impl Plugin for ViewerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<OverlayEngine>()
            .init_resource::<PageDisplay>()
            .init_resource::<Notices>()
            .init_resource::<SyncStatus>()
            .init_resource::<Backend>()
            .init_resource::<input::PointerTracker>()
            .init_resource::<render::HighlightSprites>()
            .add_message::<OpenPagesRequest>()
            .add_message::<GoToPageRequest>()
            .add_message::<UndoRequest>()
            .add_message::<RedoRequest>()
            .add_message::<DeleteActiveRequest>()
            .add_message::<ReloadHighlightsRequest>()
            .init_gizmo_group::<render::OverlayGizmoGroup>()
            .configure_sets(
                Update,
                (ViewerSet::Input, ViewerSet::Sync, ViewerSet::Render).chain(),
            )
            .add_systems(Startup, (camera::spawn_camera, render::configure_overlay_gizmos))
            .add_systems(
                Startup,
                (sync::init_backend, init_document)
                    .chain()
                    .after(ConfigLoaded),
            )
            .add_systems(
                Update,
                (
                    camera::camera_pan,
                    camera::camera_zoom,
                    camera::apply_camera_zoom,
                    input::handle_shortcuts,
                    input::translate_pointer,
                    input::handle_history_requests,
                    input::handle_delete_requests,
                )
                    .chain()
                    .in_set(ViewerSet::Input),
            )
            .add_systems(
                Update,
                (
                    page::handle_open_pages,
                    page::handle_go_to_page,
                    page::poll_render_tasks,
                    camera::fit_camera_to_page,
                    sync::start_highlight_load.run_if(on_message::<ReloadHighlightsRequest>),
                    sync::poll_highlight_load,
                    sync::dispatch_requests,
                    sync::poll_persist_tasks,
                    sync::collect_notices,
                    notices::expire_notices,
                )
                    .chain()
                    .in_set(ViewerSet::Sync),
            )
            .add_systems(
                Update,
                (
                    render::sync_highlight_sprites,
                    render::draw_overlay_gizmos,
                    cursor::update_cursor_icon,
                )
                    .in_set(ViewerSet::Render),
            );
    }
}
