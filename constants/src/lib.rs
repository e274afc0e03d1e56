pub mod editor_settings;
pub mod view_layers;
