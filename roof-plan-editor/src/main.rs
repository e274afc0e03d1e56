use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy::window::PresentMode;
use bevy_common_assets::json::JsonAssetPlugin;

mod engine;
mod tools;

use engine::camera::orbit_camera::{spawn_volume_camera, volume_camera_controller};
use engine::camera::plan_camera::{
    CameraInputLock, plan_camera_controller, spawn_plan_camera, update_viewport_split,
};
use engine::config::{ActiveConfig, ConfigLoader, EditorConfig, load_config_system};
use engine::scene::grid::spawn_ground_grid;
use engine::volume::VolumeViewPlugin;
use tools::marker_editor::MarkerEditorPlugin;

fn main() {
    create_app().run();
}

fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        // Registers EditorConfig as a loadable asset type from JSON files.
        .add_plugins(JsonAssetPlugin::<EditorConfig>::new(&["json"]))
        .add_plugins(MarkerEditorPlugin)
        .add_plugins(VolumeViewPlugin)
        .init_resource::<CameraInputLock>()
        .init_resource::<ConfigLoader>()
        .init_resource::<ActiveConfig>()
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (
                load_config_system,
                update_viewport_split,
                plan_camera_controller,
                volume_camera_controller,
                fps_text_update_system,
            ),
        );

    app
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(Window {
            title: "Roof Plan Editor".into(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    spawn_lighting(&mut commands);
    spawn_plan_camera(&mut commands);
    spawn_volume_camera(&mut commands);
    spawn_ground_grid(&mut commands, &mut meshes, &mut materials);
    spawn_fps_overlay(&mut commands);
}

fn spawn_lighting(commands: &mut Commands) {
    commands.spawn((
        DirectionalLight {
            shadows_enabled: false,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));
}

#[derive(Component)]
struct FpsText;

fn spawn_fps_overlay(commands: &mut Commands) {
    commands
        .spawn(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                Text::new("FPS: "),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::srgb(1., 0., 0.)),
                Node {
                    position_type: PositionType::Absolute,
                    bottom: Val::Px(12.0),
                    right: Val::Px(12.0),
                    ..default()
                },
                FpsText,
            ));
        });
}

fn fps_text_update_system(
    diagnostics: Res<DiagnosticsStore>,
    mut query: Query<&mut Text, With<FpsText>>,
) {
    for mut text in &mut query {
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                text.0 = format!("FPS: {value:.1}");
            }
        }
    }
}
