//! Editor configuration persisted to disk as JSON.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::constants::{
    DEFAULT_CELL_SIZE, DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH, MAX_RECENT_MAPS,
};
use crate::editor::history::MAX_HISTORY_SIZE;

/// Editor configuration persisted to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfigData {
    /// Undo depth for newly created or loaded documents
    pub history_depth: usize,

    /// Cell size in map pixels for new maps
    pub default_cell_size: f32,

    pub default_map_width: u32,
    pub default_map_height: u32,

    /// Whether new layers allow only one element per cell
    pub exclusive_layers: bool,

    /// Recently opened maps, most recent first
    pub recent_maps: Vec<PathBuf>,

    /// Last opened map file path (not auto-loaded, just remembered for quick access)
    pub last_map_path: Option<PathBuf>,
}

impl Default for EditorConfigData {
    fn default() -> Self {
        Self {
            history_depth: MAX_HISTORY_SIZE,
            default_cell_size: DEFAULT_CELL_SIZE,
            default_map_width: DEFAULT_MAP_WIDTH,
            default_map_height: DEFAULT_MAP_HEIGHT,
            exclusive_layers: true,
            recent_maps: Vec::new(),
            last_map_path: None,
        }
    }
}

/// Runtime configuration resource
#[derive(Resource, Debug, Clone)]
pub struct EditorConfig {
    /// The persisted configuration data
    pub data: EditorConfigData,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Whether config needs to be saved (dirty flag)
    pub dirty: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            data: EditorConfigData::default(),
            config_path: crate::paths::config_file(),
            dirty: false,
        }
    }
}

impl EditorConfig {
    /// Remember a map as most recently used and as the last opened one
    pub fn add_recent_map(&mut self, path: &Path) {
        // Remove if already in list (to move it to front)
        self.data.recent_maps.retain(|p| p != path);
        self.data.recent_maps.insert(0, path.to_path_buf());
        self.data.recent_maps.truncate(MAX_RECENT_MAPS);
        self.data.last_map_path = Some(path.to_path_buf());
        self.dirty = true;
    }
}

/// Resource to notify user when config was reset to defaults
#[derive(Resource, Default)]
pub struct ConfigResetNotification {
    /// Whether to show the notification
    pub show: bool,
    /// The reason for the reset (parse error, read error, etc.)
    pub reason: Option<String>,
}

/// Message to trigger config save
#[derive(Message)]
pub struct SaveConfigRequest;

/// Message to record a map in the recent list
#[derive(Message)]
pub struct AddRecentMapRequest {
    pub path: PathBuf,
}

/// Result of loading config from disk
pub struct LoadConfigResult {
    pub config: EditorConfig,
    /// Error message if config was reset to defaults due to an error
    pub reset_reason: Option<String>,
}

/// Load configuration from the platform config file
pub fn load_config() -> LoadConfigResult {
    load_config_from(crate::paths::config_file())
}

/// Load configuration from `config_path`, falling back to defaults
pub fn load_config_from(config_path: PathBuf) -> LoadConfigResult {
    let (data, reset_reason) = if config_path.exists() {
        match std::fs::read_to_string(&config_path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(data) => {
                    info!("Loaded config from {:?}", config_path);
                    (data, None)
                }
                Err(e) => {
                    warn!("Failed to parse config file: {}", e);
                    (
                        EditorConfigData::default(),
                        Some(format!("Configuration file was corrupted: {}", e)),
                    )
                }
            },
            Err(e) => {
                warn!("Failed to read config file: {}", e);
                (
                    EditorConfigData::default(),
                    Some(format!("Could not read configuration file: {}", e)),
                )
            }
        }
    } else {
        info!("No config file found, using defaults");
        (EditorConfigData::default(), None)
    };

    LoadConfigResult {
        config: EditorConfig {
            data,
            config_path,
            dirty: false,
        },
        reset_reason,
    }
}

/// Save configuration to disk
pub fn save_config(config: &EditorConfig) -> bool {
    match serde_json::to_string_pretty(&config.data) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&config.config_path, json) {
                error!("Failed to save config: {}", e);
                false
            } else {
                info!("Config saved to {:?}", config.config_path);
                true
            }
        }
        Err(e) => {
            error!("Failed to serialize config: {}", e);
            false
        }
    }
}

/// System to save config when requested
fn save_config_system(
    mut events: MessageReader<SaveConfigRequest>,
    mut config: ResMut<EditorConfig>,
) {
    for _ in events.read() {
        if config.dirty && save_config(&config) {
            config.dirty = false;
        }
    }
}

/// System to add a map to the recent list
fn add_recent_map_system(
    mut events: MessageReader<AddRecentMapRequest>,
    mut config: ResMut<EditorConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    for event in events.read() {
        config.add_recent_map(&event.path);
        save_events.write(SaveConfigRequest);
    }
}

/// Loads the config file while the app is being built, so that plugins added
/// afterwards (the map plugin in particular) see the user's settings.
pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<EditorConfig>() {
            let result = load_config();
            app.insert_resource(result.config);
            app.insert_resource(ConfigResetNotification {
                show: result.reset_reason.is_some(),
                reason: result.reset_reason,
            });
        }
        app.init_resource::<ConfigResetNotification>()
            .add_message::<SaveConfigRequest>()
            .add_message::<AddRecentMapRequest>()
            .add_systems(
                Update,
                (
                    add_recent_map_system.run_if(on_message::<AddRecentMapRequest>),
                    save_config_system.run_if(on_message::<SaveConfigRequest>),
                )
                    .chain(),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "cartograpy-config-{}-{}.json",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn test_editor_config_data_default() {
        let data = EditorConfigData::default();
        assert_eq!(data.history_depth, MAX_HISTORY_SIZE);
        assert_eq!(data.default_cell_size, DEFAULT_CELL_SIZE);
        assert!(data.exclusive_layers);
        assert!(data.recent_maps.is_empty());
        assert!(data.last_map_path.is_none());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: EditorConfigData =
            serde_json::from_str(r#"{ "history_depth": 12 }"#).unwrap();
        assert_eq!(parsed.history_depth, 12);
        assert_eq!(parsed.default_map_width, DEFAULT_MAP_WIDTH);
        assert!(parsed.exclusive_layers);
    }

    #[test]
    fn test_add_recent_map_moves_to_front_and_trims() {
        let mut config = EditorConfig::default();
        for i in 0..(MAX_RECENT_MAPS + 2) {
            config.add_recent_map(Path::new(&format!("/maps/{i}.json")));
        }
        config.add_recent_map(Path::new("/maps/3.json"));

        assert_eq!(config.data.recent_maps.len(), MAX_RECENT_MAPS);
        assert_eq!(config.data.recent_maps[0], PathBuf::from("/maps/3.json"));
        assert_eq!(
            config
                .data
                .recent_maps
                .iter()
                .filter(|p| *p == Path::new("/maps/3.json"))
                .count(),
            1
        );
        assert_eq!(config.data.last_map_path, Some(PathBuf::from("/maps/3.json")));
        assert!(config.dirty);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let result = load_config_from(temp_config_path("missing"));
        assert!(result.reset_reason.is_none());
        assert_eq!(result.config.data, EditorConfigData::default());
    }

    #[test]
    fn test_corrupt_file_resets_with_reason() {
        let path = temp_config_path("corrupt");
        std::fs::write(&path, "{ nope").unwrap();
        let result = load_config_from(path.clone());
        assert!(result.reset_reason.is_some());
        assert_eq!(result.config.data, EditorConfigData::default());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_recent_map_message_updates_and_saves() {
        let path = temp_config_path("message");
        let mut app = App::new();
        app.insert_resource(EditorConfig {
            config_path: path.clone(),
            ..EditorConfig::default()
        });
        app.add_plugins(ConfigPlugin);

        app.world_mut().write_message(AddRecentMapRequest {
            path: PathBuf::from("/maps/castle.json"),
        });
        app.update();

        let config = app.world().resource::<EditorConfig>();
        assert_eq!(config.data.recent_maps, vec![PathBuf::from("/maps/castle.json")]);
        assert!(!config.dirty);

        let saved = load_config_from(path.clone());
        assert_eq!(saved.config.data.recent_maps, config.data.recent_maps);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_save_request_without_changes_writes_nothing() {
        let path = temp_config_path("clean");
        let _ = std::fs::remove_file(&path);
        let mut app = App::new();
        app.insert_resource(EditorConfig {
            config_path: path.clone(),
            ..EditorConfig::default()
        });
        app.add_plugins(ConfigPlugin);

        app.world_mut().write_message(SaveConfigRequest);
        app.update();

        assert!(!path.exists());
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_config_path("roundtrip");
        let mut config = EditorConfig {
            config_path: path.clone(),
            ..EditorConfig::default()
        };
        config.data.history_depth = 42;
        config.add_recent_map(Path::new("/maps/a.json"));
        assert!(save_config(&config));

        let loaded = load_config_from(path.clone());
        assert_eq!(loaded.config.data, config.data);
        let _ = std::fs::remove_file(&path);
    }
}
