use bevy::prelude::*;

use super::store::{MarkerId, RoofType};

// Components

/// A placed roof footprint marker on the plan view.
#[derive(Component)]
pub struct RoofMarker {
    pub id: MarkerId,
    pub roof_type: RoofType,
    /// Rotation about the vertical axis, radians. Kept explicit so gesture
    /// math never has to recover the angle from the quaternion.
    pub yaw: f32,
}

/// Present on the single selected marker (mirrors the store's selection flag).
#[derive(Component)]
pub struct Selected;

/// Unscaled pick bounds of the marker footprint plate.
#[derive(Component)]
pub struct FootprintBounds(pub Vec3);

/// Grab target role of an auxiliary handle object.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleRole {
    Corner(usize),
    Edge(usize),
    Rotation,
}

/// Marker entity a handle belongs to.
#[derive(Component)]
pub struct HandleOwner(pub Entity);

/// World-space pick bounds of a handle (handles do not inherit marker scale).
#[derive(Component)]
pub struct HandleBounds(pub Vec3);

/// Ghost footprint following the cursor while placement mode is active.
#[derive(Component)]
pub struct PlacementPreview;

// Resources

#[derive(Resource, Default)]
pub struct PlacementState {
    pub active: bool,
    pub roof_type: RoofType,
}

/// Shared material handles so selection highlighting is a handle swap.
#[derive(Resource)]
pub struct MarkerMaterials {
    pub normal: Handle<StandardMaterial>,
    pub selected: Handle<StandardMaterial>,
    pub handle: Handle<StandardMaterial>,
    pub rotation_handle: Handle<StandardMaterial>,
    pub preview: Handle<StandardMaterial>,
}

// Events

#[derive(Event, Debug, Clone, Copy)]
pub struct MarkerDragStart {
    pub id: MarkerId,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct MarkerDragEnd {
    pub id: MarkerId,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct MarkerRotateStart {
    pub id: MarkerId,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct MarkerRotateEnd {
    pub id: MarkerId,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct MarkerResizeEnd {
    pub id: MarkerId,
}

/// Request to change the single selection. `None` clears it.
#[derive(Event, Debug, Clone, Copy)]
pub struct MarkerSelectRequested {
    pub target: Option<Entity>,
}
