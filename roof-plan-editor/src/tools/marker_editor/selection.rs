use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::movement::MovementController;
use super::picking::pick_topmost;
use super::projection::cursor_ray;
use super::resize::ResizeController;
use super::state::{
    FootprintBounds, HandleBounds, HandleOwner, HandleRole, MarkerMaterials,
    MarkerSelectRequested, PlacementState, RoofMarker, Selected,
};
use super::store::MarkerStore;
use crate::engine::camera::plan_camera::PlanCamera;

/// Applies selection changes: store flag, `Selected` component, highlight
/// material, handle visibility, and movement enablement all switch together
/// so the single-selection invariant holds everywhere at once.
pub fn service_selection_requests(
    mut requests: EventReader<MarkerSelectRequested>,
    mut store: ResMut<MarkerStore>,
    materials: Res<MarkerMaterials>,
    mut q_markers: Query<(
        Entity,
        &RoofMarker,
        &mut MeshMaterial3d<StandardMaterial>,
        &mut MovementController,
        &ResizeController,
        Option<&Selected>,
    )>,
    mut q_handles: Query<(&HandleOwner, &mut Visibility), With<HandleRole>>,
    mut commands: Commands,
) {
    let Some(request) = requests.read().last().copied() else {
        return;
    };

    let target_id = request.target.and_then(|e| q_markers.get(e).ok().map(|m| m.1.id));
    store.select(target_id);

    for (entity, _, mut material, mut movement, resize, selected) in &mut q_markers {
        let is_target = Some(entity) == request.target;
        if is_target {
            if selected.is_none() {
                commands.entity(entity).insert(Selected);
            }
            material.0 = materials.selected.clone();
        } else {
            if selected.is_some() {
                commands.entity(entity).remove::<Selected>();
            }
            material.0 = materials.normal.clone();
        }
        // Movement follows selection, except while resize holds the marker.
        movement.enabled = is_target && !resize.is_resizing();
    }

    for (owner, mut visibility) in &mut q_handles {
        *visibility = if Some(owner.0) == request.target {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
}

/// Clicking empty ground outside placement mode clears the selection.
pub fn deselect_on_empty_click(
    buttons: Res<ButtonInput<MouseButton>>,
    place: Res<PlacementState>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<PlanCamera>>,
    q_markers: Query<(Entity, &GlobalTransform, &FootprintBounds), With<RoofMarker>>,
    q_handles: Query<(&HandleOwner, &GlobalTransform, &HandleBounds, &HandleRole, &Visibility)>,
    q_selected: Query<(), With<Selected>>,
    mut select_writer: EventWriter<MarkerSelectRequested>,
) {
    if place.active || !buttons.just_pressed(MouseButton::Left) || q_selected.is_empty() {
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

    let picked = pick_topmost(
        origin,
        dir,
        q_markers.iter().map(|(e, xf, bounds)| (e, xf, bounds.0)),
        q_handles.iter().map(|(owner, xf, bounds, role, vis)| {
            (owner.0, xf, bounds.0, *role, *vis != Visibility::Hidden)
        }),
    );
    if picked.is_none() {
        select_writer.write(MarkerSelectRequested { target: None });
    }
}

pub fn deselect_on_escape(
    keyboard: Res<ButtonInput<KeyCode>>,
    q_selected: Query<(), With<Selected>>,
    mut select_writer: EventWriter<MarkerSelectRequested>,
) {
    if keyboard.just_pressed(KeyCode::Escape) && !q_selected.is_empty() {
        select_writer.write(MarkerSelectRequested { target: None });
    }
}

/// Delete removes the selected marker everywhere: store entry, marker entity
/// with all its handles, and (through the broadcast) its derived volume.
pub fn delete_selected(
    keyboard: Res<ButtonInput<KeyCode>>,
    q_selected: Query<(Entity, &RoofMarker), With<Selected>>,
    mut store: ResMut<MarkerStore>,
    mut commands: Commands,
) {
    if !keyboard.just_pressed(KeyCode::Delete) {
        return;
    }

    for (entity, marker) in &q_selected {
        store.remove(marker.id);
        commands.entity(entity).despawn();
        info!("deleted marker {:?}", marker.id);
    }
}
