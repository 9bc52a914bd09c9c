mod dialogs;
mod status_bar;
mod toolbar;

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<toolbar::ToolbarState>()
            .add_systems(Update, toolbar::poll_folder_picker)
            // Top and bottom panels first so dialogs float over the page area
            .add_systems(
                EguiPrimaryContextPass,
                (toolbar::toolbar_ui, status_bar::status_bar_ui).chain(),
            )
            .add_systems(
                EguiPrimaryContextPass,
                (
                    dialogs::notices_ui,
                    dialogs::missing_pages_warning_ui,
                    dialogs::config_reset_notification_ui,
                )
                    .after(status_bar::status_bar_ui),
            );
    }
}
