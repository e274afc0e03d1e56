use bevy::prelude::*;

/// Side length of the unscaled marker footprint in world units.
/// Marker scale factors multiply against this to give real-world metres.
pub const BASE_FOOTPRINT_SIZE: f32 = 10.0;

/// Smallest full extent a corner resize may produce, in base units.
pub const MIN_CORNER_EXTENT: f32 = 0.5;

/// Smallest half extent an edge resize may produce, in base units.
pub const MIN_EDGE_HALF_EXTENT: f32 = 0.25;

/// Fraction of raw pointer delta applied per move while dragging a marker.
pub const DRAG_DAMPING_RATIO: f32 = 0.5;

/// Height of the plan-view ground plane all gestures project onto.
pub const GROUND_PLANE_HEIGHT: f32 = 0.0;

/// Vertical offset keeping markers lying flat just above the grid.
pub const MARKER_LIE_FLAT_OFFSET: f32 = 0.02;

/// Positional delta below which the volume position lock stays engaged.
pub const POSITION_LOCK_EPSILON: f32 = 1e-4;

pub const CORNER_HANDLE_SIZE: f32 = 0.6;
pub const EDGE_HANDLE_SIZE: f32 = 0.5;
pub const ROTATION_HANDLE_RADIUS: f32 = 0.45;

/// Local offset of the rotation disc from the marker centre, in base units.
pub const ROTATION_HANDLE_OFFSET: f32 = 7.0;

/// Footprint plate thickness used for picking bounds.
pub const MARKER_PICK_THICKNESS: f32 = 0.2;

pub const FLAT_SLAB_THICKNESS: f32 = 1.2;
pub const GABLE_RIDGE_HEIGHT: f32 = 3.5;
pub const VOLUME_BASE_HEIGHT: f32 = 0.0;

pub const GRID_EXTENT: f32 = 100.0;
pub const GRID_SPACING: f32 = 5.0;

pub const MARKER_COLOR: Color = Color::srgb(0.85, 0.85, 0.85);
pub const MARKER_SELECTED_COLOR: Color = Color::srgb(1.0, 0.45, 0.1);
pub const HANDLE_COLOR: Color = Color::srgb(0.15, 0.6, 1.0);
pub const ROTATION_HANDLE_COLOR: Color = Color::srgb(0.3, 0.9, 0.4);
pub const PREVIEW_COLOR: Color = Color::srgba(0.9, 0.9, 0.3, 0.4);
pub const FLAT_ROOF_COLOR: Color = Color::srgb(0.55, 0.57, 0.6);
pub const DUAL_PITCH_ROOF_COLOR: Color = Color::srgb(0.72, 0.33, 0.25);
