use bevy::prelude::*;
use constants::editor_settings::{DRAG_DAMPING_RATIO, GRID_EXTENT, GRID_SPACING};
use serde::Deserialize;

/// Editor tunables loadable from `assets/editor_config.json`. Compiled
/// defaults apply until the file finishes loading (or if it is absent).
#[derive(Asset, TypePath, Debug, Clone, Deserialize)]
pub struct EditorConfig {
    pub drag_damping_ratio: f32,
    pub grid_extent: f32,
    pub grid_spacing: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            drag_damping_ratio: DRAG_DAMPING_RATIO,
            grid_extent: GRID_EXTENT,
            grid_spacing: GRID_SPACING,
        }
    }
}

#[derive(Resource, Default)]
pub struct ActiveConfig(pub EditorConfig);

#[derive(Resource, Default)]
pub struct ConfigLoader {
    handle: Option<Handle<EditorConfig>>,
    loaded: bool,
}

const CONFIG_PATH: &str = "editor_config.json";

/// Load the config JSON and swap it in once the asset arrives.
pub fn load_config_system(
    mut loader: ResMut<ConfigLoader>,
    asset_server: Res<AssetServer>,
    configs: Res<Assets<EditorConfig>>,
    mut active: ResMut<ActiveConfig>,
) {
    if loader.handle.is_none() {
        info!("loading editor config from: {}", CONFIG_PATH);
        loader.handle = Some(asset_server.load(CONFIG_PATH));
        return;
    }

    if !loader.loaded {
        if let Some(ref handle) = loader.handle {
            if let Some(config) = configs.get(handle) {
                info!("editor config loaded: {:?}", config);
                active.0 = config.clone();
                loader.loaded = true;
            }
        }
    }
}
