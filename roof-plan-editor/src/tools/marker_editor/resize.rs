use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use constants::editor_settings::{
    BASE_FOOTPRINT_SIZE, GROUND_PLANE_HEIGHT, MIN_CORNER_EXTENT, MIN_EDGE_HALF_EXTENT,
};

use super::movement::MovementController;
use super::picking::{PickKind, pick_topmost};
use super::projection::{cursor_ray, cursor_to_ground_plane};
use super::state::{
    FootprintBounds, HandleBounds, HandleOwner, HandleRole, MarkerResizeEnd,
    MarkerSelectRequested, RoofMarker,
};
use super::store::MarkerStore;
use crate::engine::camera::plan_camera::PlanCamera;

/// Local footprint axis a single-dimension resize acts along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAxis {
    Width,
    Height,
}

/// Corner sign pattern in local (width, height) space; opposite corner is
/// `(i + 2) % 4`.
pub const CORNER_SIGNS: [(f32, f32); 4] = [(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)];

pub fn opposite_corner(index: usize) -> usize {
    (index + 2) % 4
}

/// The marker's local width/height directions in the ground plane. Resize
/// decomposition runs on these, not on world X/Z, so it stays correct under
/// rotation.
pub fn local_axes(yaw: f32) -> (Vec3, Vec3) {
    let rot = Quat::from_rotation_y(yaw);
    (rot * Vec3::X, rot * Vec3::Z)
}

/// World position of corner `index` for the given footprint state.
pub fn corner_world_position(
    center: Vec3,
    yaw: f32,
    scale_x: f32,
    scale_z: f32,
    index: usize,
) -> Vec3 {
    let (axis_x, axis_z) = local_axes(yaw);
    let (sx, sz) = CORNER_SIGNS[index];
    center
        + axis_x * (sx * scale_x * BASE_FOOTPRINT_SIZE * 0.5)
        + axis_z * (sz * scale_z * BASE_FOOTPRINT_SIZE * 0.5)
}

/// New footprint state produced by a resize step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootprintUpdate {
    pub scale_x: f32,
    pub scale_z: f32,
    pub center: Vec3,
}

/// Corner resize: the anchor (world position of the opposite corner) stays
/// pinned; the dragged corner follows the pointer. Extents come from the
/// anchor-to-pointer vector decomposed onto the local axes, floored at the
/// minimum size so the footprint can never collapse or invert.
pub fn corner_resize(anchor: Vec3, pointer: Vec3, yaw: f32, center_y: f32) -> FootprintUpdate {
    let (axis_x, axis_z) = local_axes(yaw);
    let span = pointer - anchor;
    let along_x = span.dot(axis_x);
    let along_z = span.dot(axis_z);

    let extent_x = along_x.abs().max(MIN_CORNER_EXTENT);
    let extent_z = along_z.abs().max(MIN_CORNER_EXTENT);

    let center = anchor
        + axis_x * (along_x.signum() * extent_x * 0.5)
        + axis_z * (along_z.signum() * extent_z * 0.5);

    FootprintUpdate {
        scale_x: extent_x / BASE_FOOTPRINT_SIZE,
        scale_z: extent_z / BASE_FOOTPRINT_SIZE,
        center: Vec3::new(center.x, center_y, center.z),
    }
}

/// Edge resize: only the active axis changes; the anchor (opposite edge's
/// world position) stays pinned and the other axis's scale is carried over
/// untouched.
pub fn edge_resize(
    anchor: Vec3,
    pointer: Vec3,
    yaw: f32,
    axis: ResizeAxis,
    fixed_scale: f32,
    center_y: f32,
) -> FootprintUpdate {
    let (axis_x, axis_z) = local_axes(yaw);
    let dir = match axis {
        ResizeAxis::Width => axis_x,
        ResizeAxis::Height => axis_z,
    };

    let along = (pointer - anchor).dot(dir);
    let half_extent = (along.abs() * 0.5).max(MIN_EDGE_HALF_EXTENT);
    let center = anchor + dir * (along.signum() * half_extent);
    let scale = (half_extent * 2.0) / BASE_FOOTPRINT_SIZE;

    let (scale_x, scale_z) = match axis {
        ResizeAxis::Width => (scale, fixed_scale),
        ResizeAxis::Height => (fixed_scale, scale),
    };

    FootprintUpdate {
        scale_x,
        scale_z,
        center: Vec3::new(center.x, center_y, center.z),
    }
}

#[derive(Default)]
pub enum CornerResizeState {
    #[default]
    Idle,
    Resizing {
        handle_index: usize,
        anchor: Vec3,
    },
}

#[derive(Default)]
pub enum EdgeResizeState {
    #[default]
    Idle,
    Resizing {
        axis: ResizeAxis,
        anchor: Vec3,
        fixed_scale: f32,
    },
}

/// Two cooperating sub-machines sharing one marker: corner resize and edge
/// resize. At most one is active at a time (both grab through handles and a
/// pointer can only grab one handle).
#[derive(Component, Default)]
pub struct ResizeController {
    pub corner: CornerResizeState,
    pub edge: EdgeResizeState,
}

impl ResizeController {
    pub fn is_resizing(&self) -> bool {
        !matches!(self.corner, CornerResizeState::Idle)
            || !matches!(self.edge, EdgeResizeState::Idle)
    }

    pub fn reset(&mut self) {
        self.corner = CornerResizeState::Idle;
        self.edge = EdgeResizeState::Idle;
    }
}

/// Pointer-down on a corner or edge handle starts the matching sub-machine.
/// Grabbing a handle selects the owning marker (a resize always implies
/// selection) and claims exclusive control by disabling movement.
pub fn begin_resize_gesture(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<PlanCamera>>,
    q_markers: Query<(Entity, &RoofMarker, &Transform, &GlobalTransform, &FootprintBounds)>,
    q_handles: Query<(
        &HandleOwner,
        &Transform,
        &GlobalTransform,
        &HandleBounds,
        &HandleRole,
        &Visibility,
    )>,
    mut q_gesture: Query<(&mut ResizeController, &mut MovementController)>,
    mut store: ResMut<MarkerStore>,
    mut select_writer: EventWriter<MarkerSelectRequested>,
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
        q_markers
            .iter()
            .map(|(e, _, _, xf, bounds)| (e, xf, bounds.0)),
        q_handles.iter().map(|(owner, _, xf, bounds, role, vis)| {
            (owner.0, xf, bounds.0, *role, *vis != Visibility::Hidden)
        }),
    );
    let Some(pick) = pick else { return };
    let PickKind::Handle(role) = pick.kind else {
        return;
    };

    let Ok((_, marker, transform, _, _)) = q_markers.get(pick.marker) else {
        return;
    };
    let Ok((mut resize, mut movement)) = q_gesture.get_mut(pick.marker) else {
        return;
    };

    // Resize implies selection; refuse the gesture if the marker is unknown
    // to the store and selection cannot take effect.
    store.select(Some(marker.id));
    if store.get(marker.id).is_none_or(|m| !m.is_selected) {
        warn!("resize refused: marker {:?} not selectable", marker.id);
        return;
    }
    select_writer.write(MarkerSelectRequested { target: Some(pick.marker) });

    let center = transform.translation;
    let (scale_x, scale_z) = (transform.scale.x, transform.scale.z);

    match role {
        HandleRole::Corner(index) => {
            let anchor = corner_world_position(
                center,
                marker.yaw,
                scale_x,
                scale_z,
                opposite_corner(index),
            );
            resize.corner = CornerResizeState::Resizing { handle_index: index, anchor };
        }
        HandleRole::Edge(_) => {
            // The grabbed handle resizes whichever local axis its offset
            // predominantly sits on.
            let Some(local) = q_handles
                .iter()
                .find(|(owner, _, _, _, role2, _)| {
                    owner.0 == pick.marker && **role2 == role
                })
                .map(|(_, t, _, _, _, _)| t.translation)
            else {
                return;
            };
            let (axis, side, half_extent, fixed_scale) = if local.x.abs() >= local.z.abs() {
                (
                    ResizeAxis::Width,
                    local.x.signum(),
                    scale_x * BASE_FOOTPRINT_SIZE * 0.5,
                    scale_z,
                )
            } else {
                (
                    ResizeAxis::Height,
                    local.z.signum(),
                    scale_z * BASE_FOOTPRINT_SIZE * 0.5,
                    scale_x,
                )
            };
            let (axis_x, axis_z) = local_axes(marker.yaw);
            let dir = match axis {
                ResizeAxis::Width => axis_x,
                ResizeAxis::Height => axis_z,
            };
            let anchor = center - dir * (side * half_extent);
            resize.edge = EdgeResizeState::Resizing { axis, anchor, fixed_scale };
        }
        HandleRole::Rotation => return,
    }

    movement.enabled = false;
}

/// Per-move geometry update while a resize sub-machine is active.
pub fn apply_resize_gesture(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<PlanCamera>>,
    mut q: Query<(&RoofMarker, &mut Transform, &ResizeController)>,
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

    for (marker, mut transform, resize) in &mut q {
        let update = match (&resize.corner, &resize.edge) {
            (CornerResizeState::Resizing { anchor, .. }, _) => {
                corner_resize(*anchor, hit, marker.yaw, transform.translation.y)
            }
            (_, EdgeResizeState::Resizing { axis, anchor, fixed_scale }) => edge_resize(
                *anchor,
                hit,
                marker.yaw,
                *axis,
                *fixed_scale,
                transform.translation.y,
            ),
            _ => continue,
        };

        transform.scale.x = update.scale_x;
        transform.scale.z = update.scale_z;
        transform.translation = update.center;
    }
}

/// Pointer-up ends any active resize: symmetric cleanup for both sub-machines,
/// movement regains control, observers get the end notification.
pub fn end_resize_gesture(
    buttons: Res<ButtonInput<MouseButton>>,
    mut q: Query<(&RoofMarker, &mut ResizeController, &mut MovementController)>,
    mut end_writer: EventWriter<MarkerResizeEnd>,
) {
    if !buttons.just_released(MouseButton::Left) {
        return;
    }

    for (marker, mut resize, mut movement) in &mut q {
        if !resize.is_resizing() {
            continue;
        }
        resize.reset();
        movement.enabled = true;
        end_writer.write(MarkerResizeEnd { id: marker.id });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TOL: f32 = 1e-4;

    fn opposite_of_update(update: &FootprintUpdate, yaw: f32, anchor: Vec3) -> f32 {
        // Distance from the anchor to the closest reconstructed corner.
        (0..4)
            .map(|i| {
                corner_world_position(update.center, yaw, update.scale_x, update.scale_z, i)
                    .distance(anchor)
            })
            .fold(f32::INFINITY, f32::min)
    }

    #[test]
    fn corner_resize_pins_opposite_corner_across_a_gesture() {
        let anchor = Vec3::new(-5.0, 0.0, -5.0);
        let yaw = 0.7;
        for pointer in [
            Vec3::new(4.0, 0.0, 3.0),
            Vec3::new(12.0, 0.0, -1.0),
            Vec3::new(-4.9, 0.0, -4.8),
            Vec3::new(-20.0, 0.0, 30.0),
        ] {
            let update = corner_resize(anchor, pointer, yaw, 0.0);
            assert!(
                opposite_of_update(&update, yaw, anchor) < TOL,
                "anchor drifted for pointer {pointer:?}"
            );
        }
    }

    #[test]
    fn corner_resize_clamps_to_minimum_extent() {
        let anchor = Vec3::new(2.0, 0.0, 2.0);
        // Pointer coincident with the anchor: both extents floor out.
        let update = corner_resize(anchor, anchor, 0.0, 0.0);
        assert_eq!(update.scale_x, MIN_CORNER_EXTENT / BASE_FOOTPRINT_SIZE);
        assert_eq!(update.scale_z, MIN_CORNER_EXTENT / BASE_FOOTPRINT_SIZE);
        assert!(update.scale_x > 0.0 && update.scale_z > 0.0);
    }

    #[test]
    fn corner_resize_round_trip_scenario() {
        // Marker placed at the origin, bottom-left anchor at (-5, -5); drag
        // the top-right corner and check the documented dimension formula.
        let anchor = Vec3::new(-5.0, 0.0, -5.0);
        let pointer = Vec3::new(3.0, 0.0, 1.0);
        let update = corner_resize(anchor, pointer, 0.0, 0.0);

        let dx = pointer.x - update.center.x;
        let dz = pointer.z - update.center.z;
        assert!((update.scale_x * BASE_FOOTPRINT_SIZE - 2.0 * dx.abs()).abs() < TOL);
        assert!((update.scale_z * BASE_FOOTPRINT_SIZE - 2.0 * dz.abs()).abs() < TOL);

        let bottom_left =
            corner_world_position(update.center, 0.0, update.scale_x, update.scale_z, 2);
        assert!((bottom_left.x - -5.0).abs() < TOL);
        assert!((bottom_left.z - -5.0).abs() < TOL);
    }

    #[test]
    fn edge_resize_changes_only_the_active_axis() {
        let yaw = 1.1;
        let fixed_scale = 1.37;
        let anchor = Vec3::new(-3.0, 0.0, 1.0);
        for pointer in [Vec3::new(6.0, 0.0, 2.0), Vec3::new(-8.0, 0.0, -4.0)] {
            let update =
                edge_resize(anchor, pointer, yaw, ResizeAxis::Width, fixed_scale, 0.0);
            // Bit-exact: the inactive axis scale is carried over, not recomputed.
            assert_eq!(update.scale_z, fixed_scale);
        }
    }

    #[test]
    fn edge_resize_pins_opposite_edge() {
        let yaw = -0.4;
        let anchor = Vec3::new(2.0, 0.0, -1.0);
        let update = edge_resize(
            anchor,
            Vec3::new(9.0, 0.0, 4.0),
            yaw,
            ResizeAxis::Height,
            1.0,
            0.0,
        );
        let (_, axis_z) = local_axes(yaw);
        let half = update.scale_z * BASE_FOOTPRINT_SIZE * 0.5;
        let near_edge = update.center - axis_z * half * (update.center - anchor).dot(axis_z).signum();
        assert!(near_edge.distance(anchor) < TOL);
    }

    #[test]
    fn edge_resize_clamps_to_minimum_half_extent() {
        let anchor = Vec3::new(0.0, 0.0, 0.0);
        // Pointer dragged past the anchor onto it.
        let update = edge_resize(anchor, anchor, 0.0, ResizeAxis::Width, 1.0, 0.0);
        assert_eq!(
            update.scale_x,
            (MIN_EDGE_HALF_EXTENT * 2.0) / BASE_FOOTPRINT_SIZE
        );
        assert!(update.scale_x > 0.0);
    }

    #[test]
    fn opposite_corner_index_map() {
        assert_eq!(opposite_corner(0), 2);
        assert_eq!(opposite_corner(1), 3);
        assert_eq!(opposite_corner(2), 0);
        assert_eq!(opposite_corner(3), 1);
    }

    proptest! {
        #[test]
        fn corner_anchor_invariant_under_arbitrary_moves(
            yaw in -3.1f32..3.1,
            ax in -40.0f32..40.0,
            az in -40.0f32..40.0,
            moves in proptest::collection::vec((-60.0f32..60.0, -60.0f32..60.0), 1..16),
        ) {
            let anchor = Vec3::new(ax, 0.0, az);
            for (px, pz) in moves {
                let update = corner_resize(anchor, Vec3::new(px, 0.0, pz), yaw, 0.0);
                prop_assert!(opposite_of_update(&update, yaw, anchor) < 1e-3);
                prop_assert!(update.scale_x > 0.0 && update.scale_z > 0.0);
            }
        }
    }
}
