use bevy::prelude::*;

use super::resize::ResizeController;
use super::state::{
    MarkerDragEnd, MarkerResizeEnd, MarkerRotateEnd, RoofMarker, Selected,
};
use super::store::{MarkerId, MarkerStore, MarkerTransform};

/// Build a store snapshot from the marker's live ECS transform.
pub fn snapshot_marker(
    marker: &RoofMarker,
    transform: &Transform,
    is_resizing: bool,
    is_selected: bool,
) -> MarkerTransform {
    let mut snapshot = MarkerTransform {
        id: marker.id,
        roof_type: marker.roof_type,
        position: transform.translation,
        rotation_y: marker.yaw,
        scale_x: transform.scale.x,
        scale_z: transform.scale.z,
        width_meters: 0.0,
        height_meters: 0.0,
        is_resizing,
        is_selected,
    };
    snapshot.set_scale(transform.scale.x, transform.scale.z);
    snapshot
}

/// Resize changes continuously, and downstream consumers (the dimensions
/// readout, the 3D view) must track it live: publish every frame while a
/// resize sub-machine is active.
pub fn publish_resizing_markers(
    q: Query<(&RoofMarker, &Transform, &ResizeController, Option<&Selected>)>,
    mut store: ResMut<MarkerStore>,
) {
    for (marker, transform, resize, selected) in &q {
        if resize.is_resizing() {
            store.upsert(snapshot_marker(marker, transform, true, selected.is_some()));
        }
    }
}

/// One final snapshot at every gesture boundary.
pub fn publish_on_gesture_end(
    mut drag_end: EventReader<MarkerDragEnd>,
    mut rotate_end: EventReader<MarkerRotateEnd>,
    mut resize_end: EventReader<MarkerResizeEnd>,
    q: Query<(&RoofMarker, &Transform, &ResizeController, Option<&Selected>)>,
    mut store: ResMut<MarkerStore>,
) {
    let mut ended: Vec<MarkerId> = Vec::new();
    ended.extend(drag_end.read().map(|e| e.id));
    ended.extend(rotate_end.read().map(|e| e.id));
    ended.extend(resize_end.read().map(|e| e.id));
    if ended.is_empty() {
        return;
    }

    for (marker, transform, resize, selected) in &q {
        if ended.contains(&marker.id) {
            store.upsert(snapshot_marker(
                marker,
                transform,
                resize.is_resizing(),
                selected.is_some(),
            ));
        }
    }
}
