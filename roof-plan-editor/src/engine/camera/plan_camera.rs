use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::render::camera::Viewport;
use bevy::render::view::RenderLayers;
use bevy::window::PrimaryWindow;
use constants::editor_settings::GRID_EXTENT;
use constants::view_layers::PLAN_LAYER;

use super::orbit_camera::VolumeCamera;

/// Top-down orthographic camera over the plan viewport (left half of the
/// window). All gesture picking rays originate from this camera.
#[derive(Component)]
pub struct PlanCamera;

/// Raised by gestures that must not fight camera input (rotation drags in
/// particular); both camera controllers stand down while it is held.
#[derive(Resource, Default)]
pub struct CameraInputLock {
    pub locked: bool,
}

const PLAN_CAMERA_HEIGHT: f32 = 80.0;
const PLAN_VIEW_HEIGHT: f32 = 60.0;
const PLAN_PAN_SPEED: f32 = 25.0;
const PLAN_ZOOM_STEP: f32 = 0.1;

pub fn spawn_plan_camera(commands: &mut Commands) {
    commands.spawn((
        Camera3d::default(),
        Camera {
            order: 0,
            ..default()
        },
        Projection::from(OrthographicProjection {
            scaling_mode: bevy::render::camera::ScalingMode::FixedVertical {
                viewport_height: PLAN_VIEW_HEIGHT,
            },
            ..OrthographicProjection::default_3d()
        }),
        Transform::from_xyz(0.0, PLAN_CAMERA_HEIGHT, 0.0).looking_at(Vec3::ZERO, Vec3::NEG_Z),
        RenderLayers::default().with(PLAN_LAYER),
        PlanCamera,
        // UI anchors to the plan side.
        IsDefaultUiCamera,
        Name::new("plan_camera"),
    ));
}

/// Splits the window between the two views: plan on the left, volume on
/// the right. Runs every frame so resizes stay in sync.
pub fn update_viewport_split(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut q_plan: Query<&mut Camera, (With<PlanCamera>, Without<VolumeCamera>)>,
    mut q_volume: Query<&mut Camera, (With<VolumeCamera>, Without<PlanCamera>)>,
) {
    let Ok(window) = windows.single() else { return };
    let width = window.physical_width();
    let height = window.physical_height();
    if width < 2 || height == 0 {
        return;
    }
    let half = width / 2;

    if let Ok(mut camera) = q_plan.single_mut() {
        camera.viewport = Some(Viewport {
            physical_position: UVec2::ZERO,
            physical_size: UVec2::new(half, height),
            ..default()
        });
    }
    if let Ok(mut camera) = q_volume.single_mut() {
        camera.viewport = Some(Viewport {
            physical_position: UVec2::new(half, 0),
            physical_size: UVec2::new(width - half, height),
            ..default()
        });
    }
}

/// WASD pan and scroll zoom for the plan view.
pub fn plan_camera_controller(
    input_lock: Res<CameraInputLock>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut scroll_events: EventReader<MouseWheel>,
    mut q: Query<(&mut Transform, &mut Projection), With<PlanCamera>>,
    time: Res<Time>,
) {
    if input_lock.locked {
        scroll_events.clear();
        return;
    }
    let Ok((mut transform, mut projection)) = q.single_mut() else {
        return;
    };

    let mut pan = Vec2::ZERO;
    if keyboard.pressed(KeyCode::KeyW) {
        pan.y -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        pan.y += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        pan.x += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyA) {
        pan.x -= 1.0;
    }
    if pan != Vec2::ZERO {
        let delta = pan.normalize() * PLAN_PAN_SPEED * time.delta_secs();
        transform.translation.x =
            (transform.translation.x + delta.x).clamp(-GRID_EXTENT, GRID_EXTENT);
        transform.translation.z =
            (transform.translation.z + delta.y).clamp(-GRID_EXTENT, GRID_EXTENT);
    }

    let mut scroll_accum = 0.0;
    for ev in scroll_events.read() {
        scroll_accum += match ev.unit {
            MouseScrollUnit::Line => ev.y * 1.0,
            MouseScrollUnit::Pixel => ev.y * 0.05,
        };
    }
    if scroll_accum.abs() > f32::EPSILON {
        if let Projection::Orthographic(ortho) = &mut *projection {
            ortho.scale = (ortho.scale * (1.0 - scroll_accum * PLAN_ZOOM_STEP)).clamp(0.2, 5.0);
        }
    }
}
