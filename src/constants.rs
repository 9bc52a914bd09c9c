//! Centralized constants used across the application.
//!
//! Highlight tunables (sizes, threshold, undo capacity, handle radius) live in
//! the config file instead; these are the fixed values of the shell.

/// Default window width in pixels
pub const DEFAULT_WINDOW_WIDTH: f32 = 1600.0;

/// Default window height in pixels
pub const DEFAULT_WINDOW_HEIGHT: f32 = 900.0;

/// Width pages are rasterised at when the config does not say otherwise
pub const DEFAULT_PAGE_RENDER_WIDTH: u32 = 1600;

/// Timeout applied to every highlight API request
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Maximum number of recent page folders to remember in config
pub const MAX_RECENT_PAGE_DIRS: usize = 5;

/// Camera zoom bounds (orthographic scale)
pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 10.0;

/// How long a notice stays on screen before it fades out
pub const NOTICE_LIFETIME_SECS: f32 = 6.0;
