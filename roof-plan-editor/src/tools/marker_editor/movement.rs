use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use constants::editor_settings::{DRAG_DAMPING_RATIO, GROUND_PLANE_HEIGHT};

use super::picking::pick_topmost;
use super::projection::{cursor_ray, cursor_to_ground_plane};
use super::state::{
    FootprintBounds, HandleBounds, HandleOwner, HandleRole, MarkerDragEnd, MarkerDragStart,
    MarkerSelectRequested, PlacementState, RoofMarker,
};
use crate::engine::camera::plan_camera::PlanCamera;

#[derive(Default)]
pub enum MoveState {
    #[default]
    Idle,
    Dragging {
        last_ground: Vec3,
    },
}

/// Translates its marker within the ground plane while dragged. Disabled
/// markers turn pointer-down into a selection request instead; Resize claims
/// exclusive control by toggling `enabled` for its gesture duration.
#[derive(Component)]
pub struct MovementController {
    pub enabled: bool,
    /// Fraction of the raw pointer delta applied per move event.
    pub damping: f32,
    pub state: MoveState,
}

impl Default for MovementController {
    fn default() -> Self {
        Self {
            enabled: false,
            damping: DRAG_DAMPING_RATIO,
            state: MoveState::Idle,
        }
    }
}

/// Whether a drag may proceed. The top-most pick is re-evaluated on every
/// move event, not just at drag start, so a pointer passing over another
/// marker mid-gesture cannot start a second drag ("drag-through").
pub fn drag_permitted(
    enabled: bool,
    initial_pick_is_handle: bool,
    topmost_is_owner: bool,
    already_dragging: bool,
) -> bool {
    enabled && !initial_pick_is_handle && (topmost_is_owner || already_dragging)
}

pub fn movement_pointer_down(
    buttons: Res<ButtonInput<MouseButton>>,
    place: Res<PlacementState>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<PlanCamera>>,
    q_markers: Query<(Entity, &GlobalTransform, &FootprintBounds), With<RoofMarker>>,
    q_handles: Query<(&HandleOwner, &GlobalTransform, &HandleBounds, &HandleRole, &Visibility)>,
    mut q_move: Query<(&RoofMarker, &mut MovementController)>,
    mut drag_start: EventWriter<MarkerDragStart>,
    mut select_writer: EventWriter<MarkerSelectRequested>,
) {
    if place.active || !buttons.just_pressed(MouseButton::Left) {
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

    // Handles are in the exclusion set; a grabbed handle never starts a move
    // and never selects an occluded marker through itself.
    if pick.is_handle() {
        return;
    }

    let Ok((marker, mut controller)) = q_move.get_mut(pick.marker) else {
        return;
    };

    if drag_permitted(controller.enabled, false, true, false) {
        let Some(hit) = cursor_to_ground_plane(camera, cam_xf, cursor_pos, GROUND_PLANE_HEIGHT)
        else {
            return;
        };
        controller.state = MoveState::Dragging { last_ground: hit };
        drag_start.write(MarkerDragStart { id: marker.id });
    } else if !controller.enabled {
        // Selection-on-click path: the freshly re-picked top-most object at
        // this pixel is this marker's body.
        select_writer.write(MarkerSelectRequested { target: Some(pick.marker) });
    }
}

pub fn movement_pointer_move(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<PlanCamera>>,
    q_pickable: Query<(Entity, &GlobalTransform, &FootprintBounds), With<RoofMarker>>,
    mut q_move: Query<(Entity, &mut Transform, &mut MovementController), With<RoofMarker>>,
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

    let topmost = cursor_ray(camera, cam_xf, cursor_pos).and_then(|(origin, dir)| {
        pick_topmost(
            origin,
            dir,
            q_pickable.iter().map(|(e, xf, bounds)| (e, xf, bounds.0)),
            std::iter::empty(),
        )
    });

    for (entity, mut transform, mut controller) in &mut q_move {
        let MoveState::Dragging { last_ground } = controller.state else {
            continue;
        };
        let topmost_is_owner = topmost.is_some_and(|p| p.marker == entity);
        if !drag_permitted(controller.enabled, false, topmost_is_owner, true) {
            continue;
        }
        let Some(hit) = cursor_to_ground_plane(camera, cam_xf, cursor_pos, GROUND_PLANE_HEIGHT)
        else {
            continue;
        };

        let delta = (hit - last_ground) * controller.damping;
        transform.translation += Vec3::new(delta.x, 0.0, delta.z);
        controller.state = MoveState::Dragging { last_ground: hit };
    }
}

pub fn movement_pointer_up(
    buttons: Res<ButtonInput<MouseButton>>,
    mut q: Query<(&RoofMarker, &mut MovementController)>,
    mut drag_end: EventWriter<MarkerDragEnd>,
) {
    if !buttons.just_released(MouseButton::Left) {
        return;
    }

    for (marker, mut controller) in &mut q {
        if matches!(controller.state, MoveState::Dragging { .. }) {
            controller.state = MoveState::Idle;
            drag_end.write(MarkerDragEnd { id: marker.id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_refused_while_disabled() {
        assert!(!drag_permitted(false, false, true, false));
    }

    #[test]
    fn drag_refused_when_grab_started_on_a_handle() {
        assert!(!drag_permitted(true, true, true, false));
    }

    #[test]
    fn drag_refused_over_another_marker_unless_already_dragging() {
        assert!(!drag_permitted(true, false, false, false));
        assert!(drag_permitted(true, false, false, true));
    }

    #[test]
    fn drag_allowed_over_own_marker() {
        assert!(drag_permitted(true, false, true, false));
    }
}
