use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};

use crate::theme;
use crate::viewer::{OverlayEngine, PageDisplay, SyncStatus};

/// Bottom bar: document, page label, selection and save activity.
pub fn status_bar_ui(
    mut contexts: EguiContexts,
    engine: Res<OverlayEngine>,
    page: Res<PageDisplay>,
    status: Res<SyncStatus>,
) -> Result {
    egui::TopBottomPanel::bottom("status_bar").show(contexts.ctx_mut()?, |ui| {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(engine.document_id()).strong());
            if let Some(ref label) = page.label {
                ui.label(egui::RichText::new(label).color(theme::MUTED_TEXT));
            }
            if page.loading {
                ui.spinner();
            }

            ui.separator();
            ui.label(format!("{} highlights", engine.store().len()));
            if let Some(active) = engine.active_highlight() {
                let rect = active.rect;
                ui.label(
                    egui::RichText::new(format!(
                        "selected: {:.1}%, {:.1}%  {:.1} x {:.1}",
                        rect.center_x, rect.center_y, rect.width, rect.height
                    ))
                    .color(theme::MUTED_TEXT),
                );
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(egui::RichText::new(status.backend_name).color(theme::MUTED_TEXT));
                if status.loading {
                    ui.label("loading highlights...");
                } else if status.in_flight > 0 {
                    ui.label(format!("saving {}...", status.in_flight));
                }
                let mode = engine.session().mode();
                if !mode.is_idle() {
                    ui.label(mode.name());
                }
            });
        });
    });
    Ok(())
}
