pub mod camera;
pub mod config;
pub mod scene;
pub mod volume;
