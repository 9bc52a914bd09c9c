//! Centralized color theme for the application.
//!
//! Highlight colors come from the data as `#RRGGBB` strings; everything drawn
//! around them (outlines, handles, previews) is defined here.

use bevy::color::{Alpha, ColorToPacked};
use bevy::prelude::{Color, Srgba};
use bevy_egui::egui;

// ============================================================================
// Highlight Colors
// ============================================================================

/// Used when a stored color cannot be parsed
pub const FALLBACK_HIGHLIGHT: Srgba = Srgba::rgb(1.0, 1.0, 0.0);

/// Opacity of a highlight fill over the page
pub const HIGHLIGHT_FILL_ALPHA: f32 = 0.35;

/// Opacity of a highlight while a save is in flight
pub const PENDING_FILL_ALPHA: f32 = 0.2;

/// Thin outline around every highlight
pub const HIGHLIGHT_OUTLINE_ALPHA: f32 = 0.8;

// ============================================================================
// Selection Colors
// ============================================================================

/// Outline of the selected highlight
pub const ACTIVE_OUTLINE: Color = Color::srgb(0.2, 0.6, 1.0);

/// Corner resize handles of the selected highlight
pub const HANDLE_COLOR: Color = Color::srgba(0.2, 0.6, 1.0, 1.0);

/// Rubber band shown while drawing a new highlight
pub const DRAW_PREVIEW: Color = Color::srgba(1.0, 0.7, 0.2, 0.9);

// ============================================================================
// UI Colors
// ============================================================================

/// Warning text (missing pages folder, failed saves)
pub const WARNING_TEXT: egui::Color32 = egui::Color32::from_rgb(255, 180, 100);

/// Muted helper text in the status bar
pub const MUTED_TEXT: egui::Color32 = egui::Color32::GRAY;

/// Toolbar toggle while highlight mode is on
pub const HIGHLIGHT_MODE_ACTIVE: egui::Color32 = egui::Color32::from_rgb(90, 140, 200);

// ============================================================================
// Helpers
// ============================================================================

/// Parse a `#RRGGBB` (or `#RGB`) highlight color.
pub fn parse_highlight_color(hex: &str) -> Option<Srgba> {
    Srgba::hex(hex.trim()).ok()
}

/// Fill color of a highlight; unparsable colors fall back to yellow.
pub fn highlight_fill(hex: &str, alpha: f32) -> Color {
    let base = parse_highlight_color(hex).unwrap_or(FALLBACK_HIGHLIGHT);
    Color::Srgba(base.with_alpha(alpha))
}

/// Swatch color for the toolbar palette.
pub fn egui_swatch(hex: &str) -> egui::Color32 {
    let base = parse_highlight_color(hex).unwrap_or(FALLBACK_HIGHLIGHT);
    let [r, g, b, _] = base.to_u8_array();
    egui::Color32::from_rgb(r, g, b)
}
