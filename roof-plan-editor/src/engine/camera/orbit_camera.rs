use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::render::view::RenderLayers;
use constants::view_layers::VOLUME_LAYER;

use super::plan_camera::CameraInputLock;

/// Perspective orbit camera over the volume viewport (right half of the
/// window). Purely an observer; it never participates in picking.
#[derive(Component)]
pub struct VolumeCamera {
    pub focus_point: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub radius: f32,
}

impl Default for VolumeCamera {
    fn default() -> Self {
        Self {
            focus_point: Vec3::ZERO,
            yaw: 0.6,
            pitch: -0.55,
            radius: 55.0,
        }
    }
}

const YAW_SENS: f32 = 0.0035;
const PITCH_SENS: f32 = 0.0030;

pub fn spawn_volume_camera(commands: &mut Commands) {
    commands.spawn((
        Camera3d::default(),
        Camera {
            order: 1,
            ..default()
        },
        Transform::from_xyz(0.0, 35.0, 55.0).looking_at(Vec3::ZERO, Vec3::Y),
        RenderLayers::default().with(VOLUME_LAYER),
        VolumeCamera::default(),
        Name::new("volume_camera"),
    ));
}

/// Right-drag orbit and scroll dolly around the focus point.
pub fn volume_camera_controller(
    input_lock: Res<CameraInputLock>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    mut q: Query<(&mut Transform, &mut VolumeCamera)>,
) {
    if input_lock.locked {
        mouse_motion.clear();
        scroll_events.clear();
        return;
    }
    let Ok((mut transform, mut orbit)) = q.single_mut() else {
        return;
    };

    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    if mouse_button.pressed(MouseButton::Right) && mouse_delta != Vec2::ZERO {
        orbit.yaw -= mouse_delta.x * YAW_SENS;
        orbit.pitch = (orbit.pitch - mouse_delta.y * PITCH_SENS).clamp(-1.45, -0.05);
    }

    let mut scroll_accum = 0.0;
    for ev in scroll_events.read() {
        scroll_accum += match ev.unit {
            MouseScrollUnit::Line => ev.y * 1.0,
            MouseScrollUnit::Pixel => ev.y * 0.05,
        };
    }
    if scroll_accum.abs() > f32::EPSILON {
        let dolly_speed = (orbit.radius * 0.15).clamp(0.5, 20.0);
        orbit.radius = (orbit.radius - scroll_accum * dolly_speed).clamp(5.0, 300.0);
    }

    let rotation = Quat::from_euler(EulerRot::YXZ, orbit.yaw, orbit.pitch, 0.0);
    transform.translation = orbit.focus_point + rotation * Vec3::new(0.0, 0.0, orbit.radius);
    transform.look_at(orbit.focus_point, Vec3::Y);
}
