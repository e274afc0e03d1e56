use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use constants::editor_settings::GROUND_PLANE_HEIGHT;

use super::picking::{PickKind, pick_topmost};
use super::projection::{cursor_ray, cursor_to_ground_plane};
use super::state::{
    FootprintBounds, HandleBounds, HandleOwner, HandleRole, MarkerRotateEnd, MarkerRotateStart,
    RoofMarker,
};
use crate::engine::camera::plan_camera::{CameraInputLock, PlanCamera};

#[derive(Default)]
pub enum RotateState {
    #[default]
    Idle,
    Dragging {
        baseline_rotation: f32,
        baseline_angle: f32,
        origin: Vec3,
    },
}

/// Rotates its marker about the vertical axis from the angular displacement
/// of the rotation disc around the marker centre.
#[derive(Component, Default)]
pub struct RotationController {
    pub state: RotateState,
}

/// Angle of `point` around `center` in the ground plane.
pub fn ground_angle(center: Vec3, point: Vec3) -> f32 {
    (point.z - center.z).atan2(point.x - center.x)
}

/// Rotation opposes the pointer's angular delta because of the top-down
/// viewing convention.
pub fn rotation_from_baseline(
    baseline_rotation: f32,
    baseline_angle: f32,
    current_angle: f32,
) -> f32 {
    baseline_rotation - (current_angle - baseline_angle)
}

pub fn begin_rotation_gesture(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<PlanCamera>>,
    q_markers: Query<(Entity, &GlobalTransform, &FootprintBounds), With<RoofMarker>>,
    q_handles: Query<(&HandleOwner, &GlobalTransform, &HandleBounds, &HandleRole, &Visibility)>,
    mut q_rotate: Query<(&RoofMarker, &Transform, &mut RotationController)>,
    mut input_lock: ResMut<CameraInputLock>,
    mut start_writer: EventWriter<MarkerRotateStart>,
) {
    if !buttons.just_pressed(MouseButton::Left) {
        return;
    }

    let Ok(window) = windows.single() else { return };
    let Some(cursor_pos) = window.cursor_position() else {
        return;
    };
    let Ok((camera, cam_xf)) = cameras.single() else {
        return;
    };
    let Some((origin, dir)) = cursor_ray(camera, cam_xf, cursor_pos) else {
        return;
    };

    let pick = pick_topmost(
        origin,
        dir,
        q_markers.iter().map(|(e, xf, bounds)| (e, xf, bounds.0)),
        q_handles.iter().map(|(owner, xf, bounds, role, vis)| {
            (owner.0, xf, bounds.0, *role, *vis != Visibility::Hidden)
        }),
    );
    let Some(pick) = pick else { return };
    if pick.kind != PickKind::Handle(HandleRole::Rotation) {
        return;
    }

    let Ok((marker, transform, mut controller)) = q_rotate.get_mut(pick.marker) else {
        return;
    };
    let Some(hit) = cursor_to_ground_plane(camera, cam_xf, cursor_pos, GROUND_PLANE_HEIGHT)
    else {
        return;
    };

    controller.state = RotateState::Dragging {
        baseline_rotation: marker.yaw,
        baseline_angle: ground_angle(transform.translation, hit),
        origin: transform.translation,
    };
    // Detach camera input so the view cannot pan or orbit mid-rotation.
    input_lock.locked = true;
    start_writer.write(MarkerRotateStart { id: marker.id });
}

pub fn apply_rotation_gesture(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<PlanCamera>>,
    mut q: Query<(&mut RoofMarker, &mut Transform, &RotationController)>,
) {
    if !buttons.pressed(MouseButton::Left) {
        return;
    }

    let Ok(window) = windows.single() else { return };
    let Some(cursor_pos) = window.cursor_position() else {
        return;
    };
    let Ok((camera, cam_xf)) = cameras.single() else {
        return;
    };
    let Some(hit) = cursor_to_ground_plane(camera, cam_xf, cursor_pos, GROUND_PLANE_HEIGHT)
    else {
        return;
    };

    for (mut marker, mut transform, controller) in &mut q {
        let RotateState::Dragging { baseline_rotation, baseline_angle, origin } =
            controller.state
        else {
            continue;
        };

        let angle = ground_angle(origin, hit);
        marker.yaw = rotation_from_baseline(baseline_rotation, baseline_angle, angle);
        transform.rotation = Quat::from_rotation_y(marker.yaw);
        // Guard against positional drift: the rotation update must never move
        // the marker.
        transform.translation = origin;
    }
}

pub fn end_rotation_gesture(
    buttons: Res<ButtonInput<MouseButton>>,
    mut q: Query<(&RoofMarker, &mut RotationController)>,
    mut input_lock: ResMut<CameraInputLock>,
    mut end_writer: EventWriter<MarkerRotateEnd>,
) {
    if !buttons.just_released(MouseButton::Left) {
        return;
    }

    for (marker, mut controller) in &mut q {
        if matches!(controller.state, RotateState::Dragging { .. }) {
            controller.state = RotateState::Idle;
            input_lock.locked = false;
            end_writer.write(MarkerRotateEnd { id: marker.id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn ground_angle_measures_around_center() {
        let center = Vec3::new(1.0, 0.0, 1.0);
        assert_eq!(ground_angle(center, Vec3::new(3.0, 0.0, 1.0)), 0.0);
        assert!(
            (ground_angle(center, Vec3::new(1.0, 0.0, 3.0)) - FRAC_PI_2).abs() < 1e-6
        );
    }

    #[test]
    fn handle_swept_by_theta_decreases_rotation_by_theta() {
        let baseline_rotation = 0.4;
        let baseline_angle = 0.1;
        let theta = 0.75;
        let result =
            rotation_from_baseline(baseline_rotation, baseline_angle, baseline_angle + theta);
        assert!((result - (baseline_rotation - theta)).abs() < 1e-6);
    }

    #[test]
    fn no_angular_delta_keeps_baseline_rotation() {
        assert_eq!(rotation_from_baseline(1.3, 0.2, 0.2), 1.3);
    }
}
