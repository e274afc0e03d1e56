//! Roof footprint plan editing tool.
//!
//! Provides interactive placement, selection, and manipulation of roof
//! footprint markers on the ground plane, plus the transform store that
//! broadcasts every committed edit to downstream consumers.
//!
//! ## Architecture
//!
//! Each marker carries three gesture controllers, all explicit state
//! machines driven by pointer events:
//!
//! ### Movement (`MovementController`)
//! Enabled only while its marker is selected:
//! - Pointer-down on the marker body starts a drag
//! - Each move applies the damped ground-plane delta to the footprint
//! - Moving over another marker never transfers the drag
//!
//! ### Rotation (`RotationController`)
//! Driven by the rotation disc floating north of the footprint:
//! - Angular displacement of the pointer around the marker centre maps
//!   to yaw, with the sign flipped for the top-down view
//! - Camera input is locked for the duration of the gesture
//!
//! ### Resize (`ResizeController`)
//! Corner handles scale both axes anchored at the opposite corner; edge
//! handles scale one local axis anchored at the opposite edge. Movement
//! is disabled while a resize is active.
//!
//! ## Transform Data Flow
//!
//! ```text
//! gesture systems (Update)
//!   └─> Transform / RoofMarker.yaw on the marker entity
//!
//! sync systems (PostUpdate, TransformPublishSet)
//!   ├─> per-frame snapshot while a resize is active
//!   └─> final snapshot on every gesture-end event
//!
//! MarkerStore (TransformStore resource)
//!   └─> broadcasts owned snapshots to registered listeners
//! ```
//!
//! Consumers subscribe to the store and never read marker entities
//! directly; the volume view in `engine::volume` is one such listener.
//!
//! ## Picking
//!
//! All gesture systems share one ray pick: the cursor ray is tested
//! against marker footprint OBBs and visible handle OBBs with the AABB
//! slab method in local space, closest hit wins.

/// Pointer-drag translation with damping and drag-through protection.
pub mod movement;

/// Closest-hit ray picking over marker bodies and grab handles.
pub mod picking;

/// Placement mode: ghost preview, click-to-place, handle spawning.
pub mod placement;

/// Cursor ray construction and ground-plane projection.
pub mod projection;

/// Corner and edge resize sub-machines with opposite-side anchoring.
pub mod resize;

/// Rotation-disc yaw gesture with camera input locking.
pub mod rotation;

/// Selection service: store flag, highlight, handle visibility.
pub mod selection;

/// Components, resources, and gesture lifecycle events.
pub mod state;

/// The transform store: snapshot map plus listener broadcast.
pub mod store;

/// Publishes store snapshots at gesture boundaries and during resize.
pub mod sync;

/// Mode and dimensions readout for the plan viewport.
pub mod ui;

use bevy::prelude::*;
use bevy::window::WindowFocused;

pub use state::{PlacementState, RoofMarker, Selected};
pub use store::{MarkerId, MarkerStore, MarkerTransform, RoofType, TransformStore};

use movement::{
    MoveState, MovementController, movement_pointer_down, movement_pointer_move,
    movement_pointer_up,
};
use placement::{
    compensate_handle_scale, ensure_placement_preview, place_marker_on_click,
    placement_mode_hotkeys, setup_marker_assets, update_placement_preview,
};
use resize::{ResizeController, apply_resize_gesture, begin_resize_gesture, end_resize_gesture};
use rotation::{
    RotateState, RotationController, apply_rotation_gesture, begin_rotation_gesture,
    end_rotation_gesture,
};
use selection::{
    delete_selected, deselect_on_empty_click, deselect_on_escape, service_selection_requests,
};
use state::{
    MarkerDragEnd, MarkerDragStart, MarkerResizeEnd, MarkerRotateEnd, MarkerRotateStart,
    MarkerSelectRequested,
};
use store::MarkerIdAllocator;
use sync::{publish_on_gesture_end, publish_resizing_markers};
use ui::{spawn_editor_ui, update_dimensions_text, update_mode_text};

use crate::engine::camera::plan_camera::CameraInputLock;

/// Store publication runs in this set; snapshot consumers order after it.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransformPublishSet;

/// A focus loss mid-gesture would leave a controller dragging with no
/// pointer-up to come; cancel every active gesture and emit the matching
/// end events so publication still happens.
pub fn cancel_gestures_on_focus_loss(
    mut focus_events: EventReader<WindowFocused>,
    mut q: Query<(
        &RoofMarker,
        &mut MovementController,
        &mut RotationController,
        &mut ResizeController,
    )>,
    mut input_lock: ResMut<CameraInputLock>,
    mut drag_end: EventWriter<MarkerDragEnd>,
    mut rotate_end: EventWriter<MarkerRotateEnd>,
    mut resize_end: EventWriter<MarkerResizeEnd>,
) {
    if !focus_events.read().any(|e| !e.focused) {
        return;
    }

    for (marker, mut movement, mut rotation, mut resize) in &mut q {
        if matches!(movement.state, MoveState::Dragging { .. }) {
            movement.state = MoveState::Idle;
            drag_end.write(MarkerDragEnd { id: marker.id });
        }
        if matches!(rotation.state, RotateState::Dragging { .. }) {
            rotation.state = RotateState::Idle;
            input_lock.locked = false;
            rotate_end.write(MarkerRotateEnd { id: marker.id });
        }
        if resize.is_resizing() {
            resize.reset();
            movement.enabled = true;
            resize_end.write(MarkerResizeEnd { id: marker.id });
        }
    }
}

// Registers the marker editor resources, events, and gesture systems.
pub struct MarkerEditorPlugin;

impl Plugin for MarkerEditorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MarkerStore>()
            .init_resource::<MarkerIdAllocator>()
            .init_resource::<PlacementState>()
            .add_event::<MarkerDragStart>()
            .add_event::<MarkerDragEnd>()
            .add_event::<MarkerRotateStart>()
            .add_event::<MarkerRotateEnd>()
            .add_event::<MarkerResizeEnd>()
            .add_event::<MarkerSelectRequested>()
            .add_systems(Startup, (setup_marker_assets, spawn_editor_ui))
            .add_systems(Update, (update_mode_text, update_dimensions_text))
            // One chain: pointer-down arbitration relies on resize and
            // rotation claiming the handle pick before movement sees it,
            // and selection servicing the requests those systems emit.
            .add_systems(
                Update,
                (
                    placement_mode_hotkeys,
                    ensure_placement_preview,
                    update_placement_preview,
                    place_marker_on_click,
                    begin_resize_gesture,
                    apply_resize_gesture,
                    end_resize_gesture,
                    begin_rotation_gesture,
                    apply_rotation_gesture,
                    end_rotation_gesture,
                    movement_pointer_down,
                    movement_pointer_move,
                    movement_pointer_up,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    deselect_on_empty_click,
                    deselect_on_escape,
                    service_selection_requests,
                    delete_selected,
                    cancel_gestures_on_focus_loss,
                    compensate_handle_scale,
                )
                    .chain()
                    .after(movement_pointer_up),
            )
            .add_systems(
                PostUpdate,
                (publish_resizing_markers, publish_on_gesture_end)
                    .chain()
                    .in_set(TransformPublishSet),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resize::CornerResizeState;

    fn cancel_app() -> App {
        let mut app = App::new();
        app.add_event::<WindowFocused>()
            .add_event::<MarkerDragEnd>()
            .add_event::<MarkerRotateEnd>()
            .add_event::<MarkerResizeEnd>()
            .init_resource::<CameraInputLock>()
            .add_systems(Update, cancel_gestures_on_focus_loss);
        app
    }

    fn spawn_marker(app: &mut App) -> Entity {
        app.world_mut()
            .spawn((
                RoofMarker {
                    id: MarkerId(1),
                    roof_type: RoofType::Flat,
                    yaw: 0.0,
                },
                MovementController::default(),
                RotationController::default(),
                ResizeController::default(),
            ))
            .id()
    }

    fn lose_focus(app: &mut App) {
        app.world_mut().send_event(WindowFocused {
            window: Entity::PLACEHOLDER,
            focused: false,
        });
        app.update();
    }

    #[test]
    fn focus_loss_cancels_an_active_drag() {
        let mut app = cancel_app();
        let marker = spawn_marker(&mut app);
        {
            let mut movement = app.world_mut().get_mut::<MovementController>(marker).unwrap();
            movement.enabled = true;
            movement.state = MoveState::Dragging {
                last_ground: Vec3::new(1.0, 0.0, 2.0),
            };
        }

        lose_focus(&mut app);

        let movement = app.world().get::<MovementController>(marker).unwrap();
        assert!(matches!(movement.state, MoveState::Idle));
        let drag_ends = app.world().resource::<Events<MarkerDragEnd>>();
        assert_eq!(drag_ends.len(), 1);
    }

    #[test]
    fn focus_loss_cancels_rotation_and_releases_the_camera_lock() {
        let mut app = cancel_app();
        let marker = spawn_marker(&mut app);
        app.world_mut().resource_mut::<CameraInputLock>().locked = true;
        app.world_mut()
            .get_mut::<RotationController>(marker)
            .unwrap()
            .state = RotateState::Dragging {
            baseline_rotation: 0.3,
            baseline_angle: 0.1,
            origin: Vec3::ZERO,
        };

        lose_focus(&mut app);

        let rotation = app.world().get::<RotationController>(marker).unwrap();
        assert!(matches!(rotation.state, RotateState::Idle));
        assert!(!app.world().resource::<CameraInputLock>().locked);
        assert_eq!(app.world().resource::<Events<MarkerRotateEnd>>().len(), 1);
    }

    #[test]
    fn focus_loss_cancels_resize_and_restores_movement() {
        let mut app = cancel_app();
        let marker = spawn_marker(&mut app);
        {
            let mut resize = app.world_mut().get_mut::<ResizeController>(marker).unwrap();
            resize.corner = CornerResizeState::Resizing {
                handle_index: 0,
                anchor: Vec3::new(-5.0, 0.0, -5.0),
            };
        }

        lose_focus(&mut app);

        let resize = app.world().get::<ResizeController>(marker).unwrap();
        assert!(!resize.is_resizing());
        let movement = app.world().get::<MovementController>(marker).unwrap();
        assert!(movement.enabled);
        assert_eq!(app.world().resource::<Events<MarkerResizeEnd>>().len(), 1);
    }

    #[test]
    fn regaining_focus_leaves_gestures_untouched() {
        let mut app = cancel_app();
        let marker = spawn_marker(&mut app);
        app.world_mut()
            .get_mut::<MovementController>(marker)
            .unwrap()
            .state = MoveState::Dragging {
            last_ground: Vec3::ZERO,
        };

        app.world_mut().send_event(WindowFocused {
            window: Entity::PLACEHOLDER,
            focused: true,
        });
        app.update();

        let movement = app.world().get::<MovementController>(marker).unwrap();
        assert!(matches!(movement.state, MoveState::Dragging { .. }));
        assert!(app.world().resource::<Events<MarkerDragEnd>>().is_empty());
    }
}
