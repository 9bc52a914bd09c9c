use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_PAGE_RENDER_WIDTH, DEFAULT_REQUEST_TIMEOUT_SECS, MAX_RECENT_PAGE_DIRS};
use crate::overlay::{DEFAULT_UNDO_CAPACITY, EngineSettings, SizeLimits};

/// System set for config loading (other plugins can run after this)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigLoaded;

/// Highlight tool tunables. Sizes are percentages of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightSettings {
    pub min_size: f32,
    pub max_size: f32,
    /// A drawing smaller than this on either axis is discarded
    pub draw_threshold: f32,
    pub undo_capacity: usize,
    /// Corner handle hit radius in screen pixels
    pub handle_radius_px: f32,
    pub default_color: String,
    /// Colors offered in the toolbar
    pub palette: Vec<String>,
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            min_size: 1.0,
            max_size: 80.0,
            draw_threshold: 1.0,
            undo_capacity: DEFAULT_UNDO_CAPACITY,
            handle_radius_px: 8.0,
            default_color: "#FFFF00".to_string(),
            palette: ["#FFFF00", "#FF4D4D", "#4DD77A", "#4DB8FF", "#FF9F1A", "#C77DFF"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl HighlightSettings {
    /// Engine settings with out-of-range values repaired.
    pub fn engine_settings(&self) -> EngineSettings {
        let default_color = if self.default_color.is_empty() {
            HighlightSettings::default().default_color
        } else {
            self.default_color.clone()
        };
        EngineSettings {
            limits: SizeLimits::new(self.min_size, self.max_size),
            draw_threshold: self.draw_threshold.max(0.0),
            handle_radius_px: self.handle_radius_px.max(1.0),
            undo_capacity: self.undo_capacity.max(1),
            default_color,
        }
    }
}

/// Application configuration persisted to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfigData {
    /// Base URL of the highlight API; highlights stay in memory when unset
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Bearer token sent with every API request
    #[serde(default)]
    pub api_token: Option<String>,

    /// Document whose highlights are loaded and created
    #[serde(default)]
    pub document_id: Option<String>,

    /// Reference attached to new highlights (e.g. a study node id)
    #[serde(default)]
    pub owner_ref: Option<String>,

    /// Last opened page image folder (reopened on startup)
    #[serde(default)]
    pub pages_dir: Option<PathBuf>,

    /// Recently opened page folders for quick access
    #[serde(default)]
    pub recent_pages_dirs: Vec<PathBuf>,

    #[serde(default = "default_page_render_width")]
    pub page_render_width: u32,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub highlight: HighlightSettings,
}

fn default_page_render_width() -> u32 {
    DEFAULT_PAGE_RENDER_WIDTH
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for AppConfigData {
    fn default() -> Self {
        Self {
            api_base_url: None,
            api_token: None,
            document_id: None,
            owner_ref: None,
            pages_dir: None,
            recent_pages_dirs: Vec::new(),
            page_render_width: DEFAULT_PAGE_RENDER_WIDTH,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            highlight: HighlightSettings::default(),
        }
    }
}

impl AppConfigData {
    /// Document id used for highlights; falls back to the page folder name.
    pub fn effective_document_id(&self) -> Option<String> {
        self.document_id_for(self.pages_dir.as_deref())
    }

    /// Document id for highlights on pages opened from `pages_dir`.
    pub fn document_id_for(&self, pages_dir: Option<&Path>) -> Option<String> {
        self.document_id.clone().filter(|id| !id.is_empty()).or_else(|| {
            pages_dir
                .and_then(|dir| dir.file_name())
                .map(|name| name.to_string_lossy().into_owned())
        })
    }
}

/// Runtime configuration resource
#[derive(Resource)]
pub struct AppConfig {
    /// The persisted configuration data
    pub data: AppConfigData,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Whether config needs to be saved (dirty flag)
    pub dirty: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: AppConfigData::default(),
            config_path: get_config_path(),
            dirty: false,
        }
    }
}

/// Resource for the "page folder missing" warning dialog
#[derive(Resource, Default)]
pub struct MissingPagesWarning {
    pub show: bool,
    pub path: Option<PathBuf>,
}

/// Resource to notify user when config was reset to defaults
#[derive(Resource, Default)]
pub struct ConfigResetNotification {
    /// Whether to show the notification dialog
    pub show: bool,
    /// The reason for the reset (parse error, read error, etc.)
    pub reason: Option<String>,
}

/// Message to trigger config save
#[derive(Message)]
pub struct SaveConfigRequest;

/// Message to remember an opened page folder
#[derive(Message)]
pub struct SetPagesDirRequest {
    pub path: PathBuf,
}

fn get_config_path() -> PathBuf {
    crate::paths::config_file()
}

/// Result of loading config from disk
struct LoadConfigResult {
    data: AppConfigData,
    /// Error message if config was reset to defaults due to an error
    reset_reason: Option<String>,
}

/// Parse config JSON, falling back to defaults with a reason on failure.
fn parse_config(json: &str) -> LoadConfigResult {
    match serde_json::from_str(json) {
        Ok(data) => LoadConfigResult {
            data,
            reset_reason: None,
        },
        Err(e) => {
            warn!("Failed to parse config file: {}", e);
            LoadConfigResult {
                data: AppConfigData::default(),
                reset_reason: Some(format!("Configuration file was corrupted: {}", e)),
            }
        }
    }
}

fn load_config(config_path: &PathBuf) -> LoadConfigResult {
    if !config_path.exists() {
        info!("No config file found, using defaults");
        return LoadConfigResult {
            data: AppConfigData::default(),
            reset_reason: None,
        };
    }

    match std::fs::read_to_string(config_path) {
        Ok(json) => {
            let result = parse_config(&json);
            if result.reset_reason.is_none() {
                info!("Loaded config from {:?}", config_path);
            }
            result
        }
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            LoadConfigResult {
                data: AppConfigData::default(),
                reset_reason: Some(format!("Could not read configuration file: {}", e)),
            }
        }
    }
}

fn save_config(config: &AppConfig) {
    match serde_json::to_string_pretty(&config.data) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&config.config_path, json) {
                error!("Failed to save config: {}", e);
            } else {
                info!("Config saved to {:?}", config.config_path);
            }
        }
        Err(e) => {
            error!("Failed to serialize config: {}", e);
        }
    }
}

fn load_config_system(
    mut config: ResMut<AppConfig>,
    mut reset_notification: ResMut<ConfigResetNotification>,
) {
    let config_path = get_config_path();
    let result = load_config(&config_path);
    config.data = result.data;
    config.config_path = config_path;
    config.dirty = false;

    if let Some(reason) = result.reset_reason {
        reset_notification.show = true;
        reset_notification.reason = Some(reason);
    }
}

fn check_pages_dir_exists(config: Res<AppConfig>, mut warning: ResMut<MissingPagesWarning>) {
    if let Some(ref path) = config.data.pages_dir
        && !path.exists()
    {
        warning.show = true;
        warning.path = Some(path.clone());
        info!("Last opened page folder no longer exists: {:?}", path);
    }
}

fn save_config_system(
    mut events: MessageReader<SaveConfigRequest>,
    mut config: ResMut<AppConfig>,
) {
    for _ in events.read() {
        if config.dirty {
            save_config(&config);
            config.dirty = false;
        }
    }
}

/// Move `path` to the front of the recent list, trimmed to `max`.
fn push_recent(recent: &mut Vec<PathBuf>, path: &PathBuf, max: usize) {
    recent.retain(|p| p != path);
    recent.insert(0, path.clone());
    recent.truncate(max);
}

fn set_pages_dir_system(
    mut events: MessageReader<SetPagesDirRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    for event in events.read() {
        config.data.pages_dir = Some(event.path.clone());
        push_recent(
            &mut config.data.recent_pages_dirs,
            &event.path,
            MAX_RECENT_PAGE_DIRS,
        );
        config.dirty = true;
        save_events.write(SaveConfigRequest);
        info!("Remembering page folder {:?}", event.path);
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AppConfig>()
            .init_resource::<MissingPagesWarning>()
            .init_resource::<ConfigResetNotification>()
            .add_message::<SaveConfigRequest>()
            .add_message::<SetPagesDirRequest>()
            .add_systems(
                Startup,
                (load_config_system, check_pages_dir_exists)
                    .chain()
                    .in_set(ConfigLoaded),
            )
            .add_systems(
                Update,
                (
                    set_pages_dir_system.run_if(on_message::<SetPagesDirRequest>),
                    save_config_system.run_if(on_message::<SaveConfigRequest>),
                )
                    .chain(),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_data_default() {
        let data = AppConfigData::default();
        assert!(data.api_base_url.is_none());
        assert!(data.pages_dir.is_none());
        assert_eq!(data.page_render_width, 1600);
        assert_eq!(data.highlight.undo_capacity, 20);
        assert_eq!(data.highlight.default_color, "#FFFF00");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{
            "api_base_url": "http://localhost:8000",
            "highlight": { "max_size": 50.0 }
        }"#;
        let result = parse_config(json);
        assert!(result.reset_reason.is_none());
        let data = result.data;
        assert_eq!(data.api_base_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(data.page_render_width, 1600);
        assert_eq!(data.highlight.max_size, 50.0);
        assert_eq!(data.highlight.min_size, 1.0);
        assert!(!data.highlight.palette.is_empty());
    }

    #[test]
    fn test_corrupt_config_resets_with_reason() {
        let result = parse_config("{ not json");
        assert!(result.reset_reason.is_some());
        assert!(result.data.api_base_url.is_none());
    }

    #[test]
    fn test_serialization_round_trip() {
        let data = AppConfigData {
            document_id: Some("pid-1".into()),
            pages_dir: Some(PathBuf::from("/drawings/unit-100")),
            recent_pages_dirs: vec![PathBuf::from("/drawings/unit-100")],
            ..Default::default()
        };
        let json = serde_json::to_string(&data).unwrap();
        let parsed: AppConfigData = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.document_id, data.document_id);
        assert_eq!(parsed.pages_dir, data.pages_dir);
        assert_eq!(parsed.recent_pages_dirs, data.recent_pages_dirs);
        assert_eq!(parsed.highlight, data.highlight);
    }

    #[test]
    fn test_engine_settings_repairs_values() {
        let settings = HighlightSettings {
            min_size: 30.0,
            max_size: 10.0,
            undo_capacity: 0,
            default_color: String::new(),
            ..Default::default()
        };
        let engine = settings.engine_settings();
        assert_eq!(engine.limits.min, 30.0);
        assert_eq!(engine.limits.max, 30.0);
        assert_eq!(engine.undo_capacity, 1);
        assert_eq!(engine.default_color, "#FFFF00");
    }

    #[test]
    fn test_document_id_falls_back_to_folder_name() {
        let mut data = AppConfigData {
            pages_dir: Some(PathBuf::from("/drawings/unit-100")),
            ..Default::default()
        };
        assert_eq!(data.effective_document_id().as_deref(), Some("unit-100"));
        data.document_id = Some("pid-9".into());
        assert_eq!(data.effective_document_id().as_deref(), Some("pid-9"));
    }

    #[test]
    fn test_push_recent_moves_to_front() {
        let mut recent = vec![PathBuf::from("a"), PathBuf::from("b")];
        push_recent(&mut recent, &PathBuf::from("b"), 5);
        assert_eq!(recent, vec![PathBuf::from("b"), PathBuf::from("a")]);
        push_recent(&mut recent, &PathBuf::from("c"), 2);
        assert_eq!(recent, vec![PathBuf::from("c"), PathBuf::from("b")]);
    }

    #[test]
    fn test_missing_pages_warning_default() {
        let warning = MissingPagesWarning::default();
        assert!(!warning.show);
        assert!(warning.path.is_none());
    }
}
