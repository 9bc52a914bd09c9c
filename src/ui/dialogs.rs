use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};

use crate::config::{AppConfig, ConfigResetNotification, MissingPagesWarning, SaveConfigRequest};
use crate::theme;
use crate::viewer::Notices;

/// Shorten long paths from the left for display.
fn display_path(path_str: &str) -> String {
    let chars: Vec<char> = path_str.chars().collect();
    if chars.len() > 50 {
        let tail: String = chars[chars.len() - 47..].iter().collect();
        format!("...{}", tail)
    } else {
        path_str.to_string()
    }
}

/// Shown at startup when the remembered page folder no longer exists.
pub fn missing_pages_warning_ui(
    mut contexts: EguiContexts,
    mut warning: ResMut<MissingPagesWarning>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) -> Result {
    if !warning.show {
        return Ok(());
    }

    egui::Window::new("Pages Not Found")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.label("The last opened page folder no longer exists:");

            if let Some(ref path) = warning.path {
                ui.add_space(5.0);
                let path_str = path.to_string_lossy();
                ui.label(egui::RichText::new(display_path(&path_str)).weak())
                    .on_hover_text(path_str.as_ref());
                ui.add_space(10.0);
            }

            ui.horizontal(|ui| {
                if ui.button("OK").clicked() {
                    warning.show = false;
                }

                if ui.button("Clear from history").clicked() {
                    if let Some(ref path) = warning.path {
                        config.data.recent_pages_dirs.retain(|p| p != path);
                    }
                    config.data.pages_dir = None;
                    config.dirty = true;
                    save_events.write(SaveConfigRequest);
                    warning.show = false;
                }
            });
        });

    Ok(())
}

/// Tells the user the config file was unreadable and defaults are in use.
pub fn config_reset_notification_ui(
    mut contexts: EguiContexts,
    mut notification: ResMut<ConfigResetNotification>,
) -> Result {
    if !notification.show {
        return Ok(());
    }

    egui::Window::new("Settings Reset")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.label("Your settings could not be loaded and were reset to defaults.");
            if let Some(ref reason) = notification.reason {
                ui.add_space(5.0);
                ui.colored_label(theme::WARNING_TEXT, reason);
            }
            ui.add_space(10.0);
            if ui.button("OK").clicked() {
                notification.show = false;
                notification.reason = None;
            }
        });

    Ok(())
}

/// Stack of transient notices in the bottom-right corner.
pub fn notices_ui(mut contexts: EguiContexts, mut notices: ResMut<Notices>) -> Result {
    if notices.is_empty() {
        return Ok(());
    }

    let mut dismissed = None;
    egui::Area::new(egui::Id::new("notices"))
        .anchor(egui::Align2::RIGHT_BOTTOM, [-12.0, -36.0])
        .show(contexts.ctx_mut()?, |ui| {
            for entry in notices.entries() {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.colored_label(theme::WARNING_TEXT, &entry.message);
                        if ui.small_button("✕").clicked() {
                            dismissed = Some(entry.id);
                        }
                    });
                });
                ui.add_space(4.0);
            }
        });

    if let Some(id) = dismissed {
        notices.dismiss(id);
    }

    Ok(())
}
