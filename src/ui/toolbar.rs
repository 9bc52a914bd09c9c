use std::path::PathBuf;

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use bevy_egui::{EguiContexts, egui};
use futures_lite::future;

use crate::config::AppConfig;
use crate::theme;
use crate::viewer::{
    DeleteActiveRequest, GoToPageRequest, OpenPagesRequest, OverlayEngine, PageDisplay,
    RedoRequest, ReloadHighlightsRequest, UndoRequest,
};

#[derive(Resource, Default)]
pub struct ToolbarState {
    /// Folder picker running in the background
    pub pending_browse: Option<Task<Option<PathBuf>>>,
}

/// Forward the picked folder once the dialog closes.
pub fn poll_folder_picker(
    mut state: ResMut<ToolbarState>,
    mut open_events: MessageWriter<OpenPagesRequest>,
) {
    if let Some(ref mut task) = state.pending_browse
        && let Some(result) = future::block_on(future::poll_once(task))
    {
        state.pending_browse = None;
        if let Some(path) = result {
            open_events.write(OpenPagesRequest { path });
        }
    }
}

/// Main toolbar: document, highlight tool, palette, history and paging.
#[allow(clippy::too_many_arguments)]
pub fn toolbar_ui(
    mut contexts: EguiContexts,
    mut state: ResMut<ToolbarState>,
    mut engine: ResMut<OverlayEngine>,
    config: Res<AppConfig>,
    page: Res<PageDisplay>,
    mut open_events: MessageWriter<OpenPagesRequest>,
    mut page_events: MessageWriter<GoToPageRequest>,
    mut undo_events: MessageWriter<UndoRequest>,
    mut redo_events: MessageWriter<RedoRequest>,
    mut delete_events: MessageWriter<DeleteActiveRequest>,
    mut reload_events: MessageWriter<ReloadHighlightsRequest>,
) -> Result {
    let mut should_browse = false;

    egui::TopBottomPanel::top("main_toolbar")
        .frame(
            egui::Frame::side_top_panel(&contexts.ctx_mut()?.style())
                .inner_margin(egui::Margin::symmetric(12, 8)),
        )
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 4.0;

                ui.menu_button("Pages", |ui| {
                    if ui.button("Open folder...").clicked() {
                        should_browse = true;
                        ui.close();
                    }
                    if !config.data.recent_pages_dirs.is_empty() {
                        ui.separator();
                        for dir in &config.data.recent_pages_dirs {
                            let name = dir
                                .file_name()
                                .map(|n| n.to_string_lossy().into_owned())
                                .unwrap_or_else(|| dir.to_string_lossy().into_owned());
                            if ui
                                .button(name)
                                .on_hover_text(dir.to_string_lossy())
                                .clicked()
                            {
                                open_events.write(OpenPagesRequest { path: dir.clone() });
                                ui.close();
                            }
                        }
                    }
                    ui.separator();
                    if ui.button("Reload highlights").clicked() {
                        reload_events.write(ReloadHighlightsRequest);
                        ui.close();
                    }
                });

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                // Highlight mode toggle
                let enabled = engine.highlight_mode();
                let mut label = egui::RichText::new("Highlight (H)").size(14.0).strong();
                if enabled {
                    label = label.color(egui::Color32::WHITE);
                }
                let mut button = egui::Button::new(label)
                    .min_size(egui::vec2(0.0, 28.0))
                    .selected(enabled);
                if enabled {
                    button = button.fill(theme::HIGHLIGHT_MODE_ACTIVE);
                }
                if ui
                    .add(button)
                    .on_hover_text("Drag on the page to draw a highlight")
                    .clicked()
                {
                    engine.set_highlight_mode(!enabled);
                }

                ui.add_space(8.0);

                // Color palette
                let current = engine.color().to_string();
                for color in &config.data.highlight.palette {
                    let selected = current.eq_ignore_ascii_case(color);
                    let size = egui::vec2(20.0, 20.0);
                    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());
                    ui.painter()
                        .rect_filled(rect, 3.0, theme::egui_swatch(color));
                    if selected {
                        ui.painter().rect_stroke(
                            rect,
                            3.0,
                            egui::Stroke::new(2.0, egui::Color32::WHITE),
                            egui::StrokeKind::Outside,
                        );
                    }
                    if response.on_hover_text(color).clicked() {
                        engine.set_color(color.clone());
                        if let Some(id) = engine.active().cloned() {
                            engine.recolor(&id, color);
                        }
                    }
                }

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                let history = engine.history();
                if ui
                    .add_enabled(history.can_undo(), egui::Button::new("Undo"))
                    .on_hover_text("Ctrl+Z")
                    .clicked()
                {
                    undo_events.write(UndoRequest);
                }
                if ui
                    .add_enabled(history.can_redo(), egui::Button::new("Redo"))
                    .on_hover_text("Ctrl+Y")
                    .clicked()
                {
                    redo_events.write(RedoRequest);
                }
                let can_delete = engine
                    .active()
                    .is_some_and(|id| !id.is_local() && !engine.is_locked(id));
                if ui
                    .add_enabled(can_delete, egui::Button::new("Delete"))
                    .on_hover_text("Delete")
                    .clicked()
                {
                    delete_events.write(DeleteActiveRequest);
                }

                // Right-aligned page navigation
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if !page.is_open() {
                        ui.label(egui::RichText::new("No pages open").color(theme::MUTED_TEXT));
                        return;
                    }
                    let current = engine.current_page();
                    let count = engine.page_count();
                    if ui
                        .add_enabled(current < count, egui::Button::new("▶"))
                        .on_hover_text("Next page (PageDown)")
                        .clicked()
                    {
                        page_events.write(GoToPageRequest { page: current + 1 });
                    }
                    ui.label(format!("{} / {}", current, count));
                    if ui
                        .add_enabled(current > 1, egui::Button::new("◀"))
                        .on_hover_text("Previous page (PageUp)")
                        .clicked()
                    {
                        page_events.write(GoToPageRequest { page: current - 1 });
                    }
                });
            });
        });

    if should_browse && state.pending_browse.is_none() {
        let task_pool = AsyncComputeTaskPool::get();
        state.pending_browse = Some(task_pool.spawn(async {
            rfd::AsyncFileDialog::new()
                .set_title("Open Page Folder")
                .pick_folder()
                .await
                .map(|h| h.path().to_path_buf())
        }));
    }

    Ok(())
}
